//! Builds the compliance widget iframe and mounts it into the task page.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::{
    host::{HostPage, IframeSpec},
    models::{TaskContext, PREVIEW_ASSIGNMENT_ID},
    settings::KeyNaming,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// DOM id of the one compliance frame on the page.
pub const FRAME_ID: &str = "fairworkframe";

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query parameters handed to the widget. Absent identifiers are left out.
pub fn iframe_params(ctx: &TaskContext, naming: KeyNaming) -> Vec<(&'static str, String)> {
    let fields = match naming {
        KeyNaming::SnakeCase => vec![
            ("assignment_id", ctx.assignment_id.clone()),
            ("worker_id", ctx.worker_id.clone()),
            ("hit_id", ctx.hit_id.clone()),
            ("host", Some(ctx.host().to_string())),
            ("aws_account", Some(ctx.account_id.clone())),
        ],
        KeyNaming::CamelCase => vec![
            (
                "assignmentId",
                Some(
                    ctx.assignment_id
                        .clone()
                        .unwrap_or_else(|| PREVIEW_ASSIGNMENT_ID.to_string()),
                ),
            ),
            ("workerId", ctx.worker_id.clone()),
            ("hitId", ctx.hit_id.clone()),
            ("aws_account", Some(ctx.account_id.clone())),
            ("turkSubmitTo", ctx.submit_target.clone()),
        ],
    };

    fields
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
}

pub fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(value, COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends the task parameters to the query of `base_url`, keeping any query
/// and fragment the base already has in their places.
pub fn build_iframe_url(base_url: &str, ctx: &TaskContext, naming: KeyNaming) -> Result<String> {
    let mut url = Url::parse(base_url)
        .with_context(|| format!("compliance frame URL {base_url} is not a valid URL"))?;
    let params = encode_params(&iframe_params(ctx, naming));
    let query = match url.query().filter(|existing| !existing.is_empty()) {
        Some(existing) => format!("{existing}&{params}"),
        None => params,
    };
    url.set_query(Some(&query));
    Ok(url.into())
}

pub fn frame_style(height_px: u32) -> String {
    format!("margin: 0; padding: 0; border: none; width: 100%; height: {height_px}px;")
}

pub struct Embedder {
    host: Arc<dyn HostPage>,
    base_url: String,
    naming: KeyNaming,
    height_px: u32,
    mounted: Mutex<Option<IframeSpec>>,
}

impl Embedder {
    pub fn new(host: Arc<dyn HostPage>, base_url: impl Into<String>, naming: KeyNaming, height_px: u32) -> Self {
        Self {
            host,
            base_url: base_url.into(),
            naming,
            height_px,
            mounted: Mutex::new(None),
        }
    }

    pub fn frame_spec(&self, ctx: &TaskContext) -> Result<IframeSpec> {
        Ok(IframeSpec {
            id: FRAME_ID.to_string(),
            src: build_iframe_url(&self.base_url, ctx, self.naming)?,
            style: frame_style(self.height_px),
        })
    }

    /// Appends the widget frame to the page body. Only the first call touches
    /// the page; later calls return the frame that is already mounted. Fails,
    /// without recording anything, when some other element already holds
    /// [`FRAME_ID`].
    pub fn embed(&self, ctx: &TaskContext) -> Result<IframeSpec> {
        let mut mounted = self.mounted.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = mounted.as_ref() {
            log_info!("compliance frame already mounted, not adding another");
            return Ok(existing.clone());
        }

        if self.host.has_element(FRAME_ID) {
            bail!("page already contains a foreign element with id {FRAME_ID}");
        }

        let spec = self.frame_spec(ctx)?;
        self.host
            .append_iframe(&spec)
            .with_context(|| format!("failed to append frame {FRAME_ID}"))?;
        log_info!("mounted compliance frame at {}", spec.src);

        *mounted = Some(spec.clone());
        Ok(spec)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
