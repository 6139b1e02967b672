use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{messenger::TargetOrigin, query::QueryDecoding};

/// Which spelling the task identifiers use on the wire.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KeyNaming {
    /// `assignment_id`, `worker_id`, `hit_id` plus a resolved `host`.
    #[default]
    SnakeCase,
    /// `assignmentId`, `workerId`, `hitId`, `turkSubmitTo` passed through as read.
    CamelCase,
}

/// Values the page template renders into the widget at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetSettings {
    pub account_id: String,
    /// Base URL of the compliance widget page loaded in the iframe.
    pub iframe_url: String,
    /// Exact origin cross-frame messages are restricted to.
    pub widget_origin: String,
    pub create_hit_url: Option<String>,
    pub duration_url: Option<String>,
    pub key_naming: KeyNaming,
    pub iframe_height_px: u32,
    pub include_timer: bool,
    pub register_hit: bool,
    pub duration_input: bool,
    pub idle_timeout_secs: u64,
    pub tick_interval_ms: u64,
    pub debounce_ms: u64,
    pub csrf_cookie_name: String,
    pub csrf_header_name: String,
    pub query_decoding: QueryDecoding,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            iframe_url: "https://fairwork.herokuapp.com/iframe".into(),
            widget_origin: "https://fairwork.herokuapp.com".into(),
            create_hit_url: None,
            duration_url: None,
            key_naming: KeyNaming::SnakeCase,
            iframe_height_px: 500,
            include_timer: true,
            register_hit: true,
            duration_input: true,
            idle_timeout_secs: 30,
            tick_interval_ms: 1000,
            debounce_ms: 250,
            csrf_cookie_name: "csrftoken".into(),
            csrf_header_name: "X-CSRFToken".into(),
            query_decoding: QueryDecoding::WholeString,
        }
    }
}

impl WidgetSettings {
    /// Timer-only frame: camelCase identifiers passed straight through, no
    /// registration and no duration field.
    pub fn timed_frame(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            key_naming: KeyNaming::CamelCase,
            include_timer: true,
            register_hit: false,
            duration_input: false,
            ..Self::default()
        }
    }

    /// Registering frame: snake_case identifiers, HIT registration on load and
    /// a self-reported duration field, no elapsed-time messages.
    pub fn registering_frame(
        account_id: impl Into<String>,
        create_hit_url: impl Into<String>,
        duration_url: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            create_hit_url: Some(create_hit_url.into()),
            duration_url: Some(duration_url.into()),
            key_naming: KeyNaming::SnakeCase,
            include_timer: false,
            register_hit: true,
            duration_input: true,
            ..Self::default()
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(contents).context("Failed to parse widget settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read widget settings from {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid widget settings in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.iframe_url.trim().is_empty() {
            bail!("iframe_url must not be empty");
        }
        Url::parse(&self.iframe_url)
            .with_context(|| format!("iframe_url {} is not a valid URL", self.iframe_url))?;
        TargetOrigin::parse(&self.widget_origin)?;
        if self.register_hit && self.create_hit_url.is_none() {
            bail!("register_hit is enabled but no create_hit_url is configured");
        }
        if self.duration_input && self.duration_url.is_none() {
            bail!("duration_input is enabled but no duration_url is configured");
        }
        if self.include_timer && self.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn target_origin(&self) -> Result<TargetOrigin> {
        TargetOrigin::parse(&self.widget_origin)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn debounce_wait(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
