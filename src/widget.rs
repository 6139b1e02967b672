//! Page-lifecycle wiring for the Fair Work widget.
//!
//! The embedding page forwards its events here: DOM ready, the compliance
//! frame's load event, keystrokes in the duration field, worker activity and
//! visibility changes. Every handler logs failures instead of returning them so
//! the task page keeps working whatever the widget or backend does.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

use anyhow::Result;
use uuid::Uuid;

use crate::{
    embed::Embedder,
    host::{HostPage, HttpTransport},
    messenger::Messenger,
    models::TaskContext,
    reporter::{DurationInput, HitReporter},
    settings::WidgetSettings,
    timer::{TimeTracker, TimerSnapshot},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub struct FairworkWidget {
    session_id: String,
    settings: WidgetSettings,
    host: Arc<dyn HostPage>,
    embedder: Embedder,
    reporter: HitReporter,
    messenger: Messenger,
    tracker: TimeTracker,
    context: OnceLock<Arc<TaskContext>>,
    duration_input: OnceLock<DurationInput>,
    dom_ready: AtomicBool,
}

impl FairworkWidget {
    pub fn new(
        settings: WidgetSettings,
        host: Arc<dyn HostPage>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        settings.validate()?;
        let origin = settings.target_origin()?;

        Ok(Self {
            session_id: Uuid::new_v4().to_string(),
            embedder: Embedder::new(
                host.clone(),
                settings.iframe_url.clone(),
                settings.key_naming,
                settings.iframe_height_px,
            ),
            reporter: HitReporter::new(host.clone(), transport, &settings),
            messenger: Messenger::new(host.clone(), origin),
            tracker: TimeTracker::new(settings.tick_interval(), settings.idle_timeout()),
            context: OnceLock::new(),
            duration_input: OnceLock::new(),
            dom_ready: AtomicBool::new(false),
            host,
            settings,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn context(&self) -> Option<&TaskContext> {
        self.context.get().map(|ctx| ctx.as_ref())
    }

    /// Reads the task identifiers, mounts the compliance frame and registers
    /// the HIT. Runs once; repeated DOM-ready events are ignored.
    pub fn on_dom_ready(&self) {
        if self.dom_ready.swap(true, Ordering::SeqCst) {
            log_info!("[{}] DOM ready already handled", self.session_id);
            return;
        }

        let ctx = Arc::new(TaskContext::from_query(
            &self.host.location_search(),
            &self.settings.account_id,
            self.settings.query_decoding,
        ));
        let ctx = self.context.get_or_init(|| ctx).clone();

        log_info!(
            "[{}] task page loaded: assignment={:?} hit={:?} preview={}",
            self.session_id,
            ctx.assignment_id,
            ctx.hit_id,
            ctx.is_preview()
        );

        if let Err(err) = self.embedder.embed(&ctx) {
            log_error!("[{}] could not mount compliance frame: {err:?}", self.session_id);
        }

        if self.settings.register_hit {
            // Fire and forget; the send logs its own outcome.
            let _ = self.reporter.register_hit(&ctx);
        }

        if self.settings.duration_input {
            let _ = self.duration_input.set(DurationInput::new(
                self.reporter.clone(),
                ctx,
                self.settings.debounce_wait(),
            ));
        }
    }

    /// The compliance frame finished loading: start timing and messaging.
    pub async fn on_iframe_load(&self) {
        if !self.settings.include_timer {
            return;
        }
        let Some(ctx) = self.context.get() else {
            log_error!("[{}] frame loaded before DOM ready was handled", self.session_id);
            return;
        };
        if !self.embedder.is_mounted() {
            log_warn!("[{}] compliance frame was not mounted by this widget, not timing", self.session_id);
            return;
        }

        if let Err(err) = self
            .tracker
            .start(ctx.assignment_id.clone(), self.messenger.clone())
            .await
        {
            log_info!("[{}] time tracking not restarted: {err}", self.session_id);
        }
    }

    /// A keystroke in the duration field; `value` is the field's current text.
    pub fn on_duration_input(&self, value: &str) {
        match self.duration_input.get() {
            Some(input) => input.on_input(value),
            None => log_info!("[{}] duration input ignored, field not active", self.session_id),
        }
    }

    pub async fn on_activity(&self) {
        self.tracker.record_activity().await;
    }

    pub async fn on_visibility_change(&self, visible: bool) {
        self.tracker.set_visible(visible).await;
    }

    pub async fn elapsed_seconds(&self) -> f64 {
        self.tracker.elapsed_seconds().await
    }

    pub async fn timer_snapshot(&self) -> TimerSnapshot {
        self.tracker.get_snapshot().await
    }

    /// Stops the ticker and drops any duration report still waiting out its
    /// debounce window. In-flight requests are left to finish.
    pub async fn shutdown(&self) {
        self.tracker.stop().await;
        if let Some(input) = self.duration_input.get() {
            if input.cancel() {
                log_info!("[{}] pending duration report cancelled", self.session_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time;

    use super::*;
    use crate::{
        embed::FRAME_ID,
        host::{
            memory::{field, MemoryPage, RecordingTransport},
            IframeSpec,
        },
        settings::KeyNaming,
    };

    const SANDBOX_QUERY: &str = "?assignmentId=A1&workerId=W1&hitId=H1&turkSubmitTo=https://workersandbox.mturk.com/mturk/externalSubmit";

    fn settings() -> WidgetSettings {
        WidgetSettings {
            account_id: "acct".into(),
            iframe_url: "https://fairwork.example/iframe".into(),
            widget_origin: "https://fairwork.example".into(),
            create_hit_url: Some("https://fairwork.example/create".into()),
            duration_url: Some("https://fairwork.example/duration".into()),
            ..WidgetSettings::default()
        }
    }

    fn widget(search: &str, settings: WidgetSettings) -> (FairworkWidget, Arc<MemoryPage>, Arc<RecordingTransport>) {
        let page = MemoryPage::new(search);
        page.set_cookies("csrftoken=tok");
        let transport = RecordingTransport::new();
        let widget = FairworkWidget::new(settings, page.clone(), transport.clone()).unwrap();
        (widget, page, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn sandbox_page_load_embeds_and_registers() {
        let (widget, page, transport) = widget(SANDBOX_QUERY, settings());

        widget.on_dom_ready();
        widget.on_dom_ready();
        time::sleep(Duration::from_millis(1)).await;

        let frames = page.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, FRAME_ID);
        assert!(frames[0]
            .src
            .contains("assignment_id=A1&worker_id=W1&hit_id=H1&host=mechanicalturk.sandbox.amazonaws.com"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let registration = &requests[0];
        assert_eq!(registration.url, "https://fairwork.example/create");
        assert_eq!(field(registration, "assignment_id"), Some("A1"));
        assert_eq!(field(registration, "worker_id"), Some("W1"));
        assert_eq!(field(registration, "hit_id"), Some("H1"));
        assert_eq!(field(registration, "host"), Some("mechanicalturk.sandbox.amazonaws.com"));
        assert_eq!(registration.headers[0].1, "tok");
    }

    #[tokio::test(start_paused = true)]
    async fn typing_sends_one_duration_report() {
        let (widget, _page, transport) = widget(SANDBOX_QUERY, settings());
        widget.on_dom_ready();
        time::sleep(Duration::from_millis(1)).await;

        for _ in 0..3 {
            widget.on_duration_input("5");
            time::sleep(Duration::from_millis(100)).await;
        }
        time::sleep(Duration::from_millis(500)).await;

        let reports: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.url == "https://fairwork.example/duration")
            .collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(field(&reports[0], "duration"), Some("5"));
    }

    #[tokio::test(start_paused = true)]
    async fn preview_page_embeds_but_never_reports() {
        let (widget, page, transport) = widget(
            "?assignmentId=ASSIGNMENT_ID_NOT_AVAILABLE&hitId=H1&turkSubmitTo=https://www.mturk.com",
            settings(),
        );
        widget.on_dom_ready();
        widget.on_duration_input("5");
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(page.frames().len(), 1);
        assert!(transport.requests().is_empty());
        assert!(widget.context().unwrap().is_preview());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_starts_on_frame_load_not_page_load() {
        let settings = WidgetSettings {
            iframe_url: "https://fairwork.example/iframe".into(),
            widget_origin: "https://fairwork.example".into(),
            ..WidgetSettings::timed_frame("acct")
        };
        let (widget, page, transport) = widget(SANDBOX_QUERY, settings);
        widget.on_dom_ready();
        assert_eq!(widget.settings.key_naming, KeyNaming::CamelCase);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(widget.elapsed_seconds().await, 0.0);
        assert!(page.posted().is_empty());

        page.mark_loaded(FRAME_ID);
        widget.on_iframe_load().await;
        time::sleep(Duration::from_millis(2500)).await;

        let snapshot = widget.timer_snapshot().await;
        assert_eq!(snapshot.elapsed_seconds, 2.5);

        let posted = page.posted();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[1].payload["value"].as_f64(), Some(2.0));
        assert!(transport.requests().is_empty());

        widget.shutdown().await;
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(page.posted().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_duration_report() {
        let (widget, _page, transport) = widget(SANDBOX_QUERY, settings());
        widget.on_dom_ready();
        time::sleep(Duration::from_millis(1)).await;

        widget.on_duration_input("9");
        widget.shutdown().await;
        time::sleep(Duration::from_secs(1)).await;

        assert!(transport
            .requests()
            .iter()
            .all(|r| r.url != "https://fairwork.example/duration"));
    }

    #[tokio::test(start_paused = true)]
    async fn foreign_frame_is_never_messaged() {
        let settings = WidgetSettings {
            iframe_url: "https://fairwork.example/iframe".into(),
            widget_origin: "https://fairwork.example".into(),
            ..WidgetSettings::timed_frame("acct")
        };
        let (widget, page, _transport) = widget(SANDBOX_QUERY, settings);
        page.append_iframe(&IframeSpec {
            id: FRAME_ID.into(),
            src: "https://elsewhere.example/".into(),
            style: String::new(),
        })
        .unwrap();
        page.mark_loaded(FRAME_ID);

        widget.on_dom_ready();
        widget.on_iframe_load().await;
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(page.frames().len(), 1);
        assert!(page.posted().is_empty());
        assert_eq!(widget.elapsed_seconds().await, 0.0);
    }

    #[test]
    fn rejects_wildcard_origin_at_construction() {
        let settings = WidgetSettings {
            widget_origin: "*".into(),
            ..settings()
        };
        let page = MemoryPage::new("");
        assert!(FairworkWidget::new(settings, page, RecordingTransport::new()).is_err());
    }
}
