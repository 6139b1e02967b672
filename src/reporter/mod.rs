//! Fire-and-forget reporting of HIT registrations and worker durations.
//!
//! Every send is spawned onto the runtime and its outcome only logged. Nothing
//! here retries, and no failure ever reaches the task page.

pub mod duration;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::task::JoinHandle;

use crate::{
    cookies::read_cookie,
    host::{FormRequest, HostPage, HttpTransport},
    models::{DurationReport, RegistrationRequest, TaskContext},
    settings::{KeyNaming, WidgetSettings},
};

pub use duration::{DurationInput, DURATION_FIELD_ID};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfConfig {
    pub cookie_name: String,
    pub header_name: String,
}

#[derive(Clone)]
pub struct HitReporter {
    host: Arc<dyn HostPage>,
    transport: Arc<dyn HttpTransport>,
    naming: KeyNaming,
    create_hit_url: Option<String>,
    duration_url: Option<String>,
    csrf: CsrfConfig,
    registered: Arc<AtomicBool>,
}

impl HitReporter {
    pub fn new(
        host: Arc<dyn HostPage>,
        transport: Arc<dyn HttpTransport>,
        settings: &WidgetSettings,
    ) -> Self {
        Self {
            host,
            transport,
            naming: settings.key_naming,
            create_hit_url: settings.create_hit_url.clone(),
            duration_url: settings.duration_url.clone(),
            csrf: CsrfConfig {
                cookie_name: settings.csrf_cookie_name.clone(),
                header_name: settings.csrf_header_name.clone(),
            },
            registered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers the HIT with the backend. Sent at most once per page session
    /// and never for previews. Returns the spawned send, if any.
    pub fn register_hit(&self, ctx: &TaskContext) -> Option<JoinHandle<()>> {
        if !ctx.is_reportable() {
            log_info!("no accepted assignment on this page, skipping HIT registration");
            return None;
        }
        let Some(url) = self.create_hit_url.as_deref() else {
            log_warn!("no create-HIT endpoint configured, skipping HIT registration");
            return None;
        };
        if self.registered.swap(true, Ordering::SeqCst) {
            log_info!("HIT already registered for this page");
            return None;
        }

        let fields = RegistrationRequest::from_context(ctx).form_fields(self.naming);
        Some(self.dispatch("HIT registration", self.form_request(url, fields)))
    }

    /// Sends the worker-entered duration exactly as typed.
    pub fn report_duration(&self, ctx: &TaskContext, duration: &str) -> Option<JoinHandle<()>> {
        if !ctx.is_reportable() {
            log_info!("no accepted assignment on this page, skipping duration report");
            return None;
        }
        let Some(url) = self.duration_url.as_deref() else {
            log_warn!("no duration endpoint configured, skipping duration report");
            return None;
        };
        if duration.trim().is_empty() {
            log_info!("duration field is empty, nothing to report");
            return None;
        }

        let fields = DurationReport::new(ctx, duration).form_fields(self.naming);
        Some(self.dispatch("duration report", self.form_request(url, fields)))
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    fn form_request(&self, url: &str, fields: Vec<(&'static str, String)>) -> FormRequest {
        let cookies = self.host.cookies();
        let mut headers = Vec::new();
        match read_cookie(&cookies, &self.csrf.cookie_name) {
            Some(token) => headers.push((self.csrf.header_name.clone(), token)),
            None => log_warn!(
                "cookie {} not found, sending without {} header",
                self.csrf.cookie_name,
                self.csrf.header_name
            ),
        }

        FormRequest {
            url: url.to_string(),
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            headers,
            credentials: Some(cookies),
        }
    }

    fn dispatch(&self, label: &'static str, request: FormRequest) -> JoinHandle<()> {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            let url = request.url.clone();
            match transport.post_form(request).await {
                Ok(response) if response.is_success() => {
                    log_info!("{label} accepted by {url}: {}", response.body);
                }
                Ok(response) => {
                    log_warn!("{label} rejected by {url} with {}: {}", response.status, response.body);
                }
                Err(err) => {
                    log_error!("{label} to {url} failed: {err:?}");
                }
            }
        })
    }
}
