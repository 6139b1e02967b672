//! Parent-to-frame channel that tells the compliance widget how long the
//! worker has been on the task.

use std::{fmt, sync::Arc};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::{
    embed::FRAME_ID,
    host::{FrameDelivery, HostPage},
    models::CrossFrameMessage,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Exact origin a cross-frame message may be delivered to. Wildcards are
/// rejected so elapsed time never leaks to whatever page the frame navigated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOrigin(String);

impl TargetOrigin {
    pub fn parse(origin: &str) -> Result<Self> {
        let origin = origin.trim();
        if origin.is_empty() {
            bail!("target origin must not be empty");
        }
        if origin == "*" {
            bail!("target origin must name the widget domain, not \"*\"");
        }

        let url = Url::parse(origin).with_context(|| format!("target origin {origin} is not a URL"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("target origin {origin} must use http or https");
        }
        if url.host_str().map_or(true, str::is_empty) {
            bail!("target origin {origin} has no host");
        }
        if !url.username().is_empty() || url.password().is_some() {
            bail!("target origin {origin} must not carry credentials");
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            bail!("target origin {origin} must be scheme, host and port only");
        }

        Ok(Self(url.origin().ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct Messenger {
    host: Arc<dyn HostPage>,
    frame_id: String,
    origin: TargetOrigin,
}

impl Messenger {
    pub fn new(host: Arc<dyn HostPage>, origin: TargetOrigin) -> Self {
        Self {
            host,
            frame_id: FRAME_ID.to_string(),
            origin,
        }
    }

    /// Posts the current elapsed time. A frame that is missing or still loading
    /// is skipped; the next tick tries again.
    pub fn post_elapsed(&self, seconds: f64) -> Result<FrameDelivery> {
        let payload = serde_json::to_value(CrossFrameMessage::estimated_time(seconds))
            .context("failed to encode cross-frame message")?;
        let delivery = self
            .host
            .post_message(&self.frame_id, &payload, &self.origin)?;

        if delivery != FrameDelivery::Delivered {
            log_debug!("frame {} not ready ({delivery:?}), skipping tick", self.frame_id);
        }
        Ok(delivery)
    }
}
