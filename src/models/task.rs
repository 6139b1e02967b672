//! Task identity as read from the hosting platform's page URL.

use serde::{Deserialize, Serialize};

use crate::query::{get_url_parameter, QueryDecoding};

/// Assignment id the platform hands out while a worker is only previewing a HIT.
pub const PREVIEW_ASSIGNMENT_ID: &str = "ASSIGNMENT_ID_NOT_AVAILABLE";

pub const SANDBOX_HOST: &str = "mechanicalturk.sandbox.amazonaws.com";
pub const PRODUCTION_HOST: &str = "mechanicalturk.amazonaws.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContext {
    pub assignment_id: Option<String>,
    pub worker_id: Option<String>,
    pub hit_id: Option<String>,
    /// The `turkSubmitTo` endpoint the platform will post the finished task to.
    pub submit_target: Option<String>,
    pub account_id: String,
}

impl TaskContext {
    /// Reads the task identifiers out of a raw `location.search` string.
    ///
    /// A bare key (`?assignmentId`) carries no usable id and is treated as absent.
    pub fn from_query(search: &str, account_id: &str, decoding: QueryDecoding) -> Self {
        let read = |name: &str| get_url_parameter(search, name, decoding).and_then(|v| v.into_value());

        Self {
            assignment_id: read("assignmentId"),
            worker_id: read("workerId"),
            hit_id: read("hitId"),
            submit_target: read("turkSubmitTo"),
            account_id: account_id.to_string(),
        }
    }

    pub fn is_preview(&self) -> bool {
        self.assignment_id.as_deref() == Some(PREVIEW_ASSIGNMENT_ID)
    }

    /// True when the page carries a real accepted assignment. Reports are only
    /// ever sent for such pages.
    pub fn is_reportable(&self) -> bool {
        matches!(self.assignment_id.as_deref(), Some(id) if !id.is_empty() && id != PREVIEW_ASSIGNMENT_ID)
    }

    pub fn is_sandbox(&self) -> bool {
        self.submit_target
            .as_deref()
            .map(|target| target.contains("sandbox"))
            .unwrap_or(false)
    }

    /// Platform host the backend should talk to for this assignment.
    pub fn host(&self) -> &'static str {
        resolve_host(self.submit_target.as_deref())
    }
}

pub fn resolve_host(submit_target: Option<&str>) -> &'static str {
    match submit_target {
        Some(target) if target.contains("sandbox") => SANDBOX_HOST,
        _ => PRODUCTION_HOST,
    }
}
