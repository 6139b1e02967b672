use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::messenger::Messenger;

use super::{TimerState, TimerStatus};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub elapsed_seconds: f64,
}

/// Time-on-task stopwatch plus the ticker that forwards its reading into the
/// compliance frame once per tick.
#[derive(Clone)]
pub struct TimeTracker {
    state: Arc<Mutex<TimerState>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    idle_threshold: Duration,
}

impl TimeTracker {
    pub fn new(tick_interval: Duration, idle_threshold: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            idle_threshold,
        }
    }

    /// Starts the stopwatch for `page_name` and begins posting the elapsed
    /// time through `messenger` every tick.
    pub async fn start(&self, page_name: Option<String>, messenger: Messenger) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.status != TimerStatus::NotStarted {
                bail!("time tracker already started");
            }
            state.begin(page_name.clone(), self.idle_threshold, Utc::now(), Instant::now());
        }

        log_info!(
            "time tracking started for page {}",
            page_name.as_deref().unwrap_or("<unknown>")
        );

        self.spawn_ticker(messenger).await;
        Ok(())
    }

    pub async fn elapsed_seconds(&self) -> f64 {
        let mut guard = self.state.lock().await;
        let now = Instant::now();
        guard.sync_idle(now);
        guard.elapsed_seconds(now)
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let mut guard = self.state.lock().await;
        let now = Instant::now();
        guard.sync_idle(now);
        TimerSnapshot {
            elapsed_seconds: guard.elapsed_seconds(now),
            state: guard.clone(),
        }
    }

    /// Worker input (mouse, keyboard, scroll) seen on the page.
    pub async fn record_activity(&self) {
        self.state.lock().await.record_activity(Instant::now());
    }

    pub async fn set_visible(&self, visible: bool) {
        self.state.lock().await.set_visible(visible, Instant::now());
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn spawn_ticker(&self, messenger: Messenger) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            // First sample one full interval after start, like a page interval timer.
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let seconds = {
                    let mut guard = state.lock().await;
                    let now = Instant::now();
                    guard.sync_idle(now);
                    guard.elapsed_seconds(now)
                };

                if let Err(err) = messenger.post_elapsed(seconds) {
                    log_warn!("failed to post elapsed time: {err:?}");
                }
            }
        });

        *ticker_guard = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        embed::FRAME_ID,
        host::{memory::MemoryPage, IframeSpec, HostPage},
        messenger::TargetOrigin,
    };

    fn page_with_frame(loaded: bool) -> Arc<MemoryPage> {
        let page = MemoryPage::new("?assignmentId=A1");
        page.append_iframe(&IframeSpec {
            id: FRAME_ID.into(),
            src: "https://fairwork.example/iframe".into(),
            style: String::new(),
        })
        .unwrap();
        if loaded {
            page.mark_loaded(FRAME_ID);
        }
        page
    }

    fn messenger(page: Arc<MemoryPage>) -> Messenger {
        Messenger::new(page, TargetOrigin::parse("https://fairwork.example").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn posts_elapsed_time_every_second() {
        let page = page_with_frame(true);
        let tracker = TimeTracker::new(Duration::from_secs(1), Duration::from_secs(30));
        tracker.start(Some("A1".into()), messenger(page.clone())).await.unwrap();

        time::sleep(Duration::from_millis(3500)).await;

        let values: Vec<f64> = page
            .posted()
            .iter()
            .map(|m| m.payload["value"].as_f64().unwrap())
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(page
            .posted()
            .iter()
            .all(|m| m.payload["status"] == "estimatedTime" && m.target_origin == "https://fairwork.example"));
        assert!(tracker.is_ticking().await);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_stalls_while_idle() {
        let page = page_with_frame(true);
        let tracker = TimeTracker::new(Duration::from_secs(1), Duration::from_secs(30));
        tracker.start(None, messenger(page.clone())).await.unwrap();

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(tracker.elapsed_seconds().await, 30.0);
        assert_eq!(tracker.get_snapshot().await.state.status, TimerStatus::Idle);

        tracker.record_activity().await;
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tracker.elapsed_seconds().await, 35.0);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_ticks_until_frame_window_loads() {
        let page = page_with_frame(false);
        let tracker = TimeTracker::new(Duration::from_secs(1), Duration::from_secs(30));
        tracker.start(None, messenger(page.clone())).await.unwrap();

        time::sleep(Duration::from_millis(2500)).await;
        assert!(page.posted().is_empty());

        page.mark_loaded(FRAME_ID);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(page.posted().len(), 1);
        assert_eq!(page.posted()[0].payload["value"].as_f64(), Some(3.0));
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_fails_and_stop_ends_ticker() {
        let page = page_with_frame(true);
        let tracker = TimeTracker::new(Duration::from_secs(1), Duration::from_secs(30));
        tracker.start(None, messenger(page.clone())).await.unwrap();
        assert!(tracker.start(None, messenger(page.clone())).await.is_err());

        tracker.stop().await;
        time::sleep(Duration::from_secs(5)).await;
        assert!(page.posted().is_empty());
        assert!(!tracker.is_ticking().await);
    }
}
