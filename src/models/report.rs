//! Payloads posted to the Fair Work backend.
//!
//! Both requests are flat form bodies. Absent identifiers are dropped from the
//! body rather than sent as empty strings.

use serde::Serialize;

use crate::settings::KeyNaming;

use super::TaskContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRequest {
    pub assignment_id: Option<String>,
    pub worker_id: Option<String>,
    pub hit_id: Option<String>,
    pub host: String,
    pub aws_account: String,
}

impl RegistrationRequest {
    pub fn from_context(ctx: &TaskContext) -> Self {
        Self {
            assignment_id: ctx.assignment_id.clone(),
            worker_id: ctx.worker_id.clone(),
            hit_id: ctx.hit_id.clone(),
            host: ctx.host().to_string(),
            aws_account: ctx.account_id.clone(),
        }
    }

    pub fn form_fields(&self, naming: KeyNaming) -> Vec<(&'static str, String)> {
        identity_fields(
            naming,
            &self.assignment_id,
            &self.worker_id,
            &self.hit_id,
            &self.host,
            &self.aws_account,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationReport {
    pub assignment_id: Option<String>,
    pub worker_id: Option<String>,
    pub hit_id: Option<String>,
    pub host: String,
    /// Value exactly as the worker typed it; the backend owns the unit.
    pub duration: String,
    pub aws_account: String,
}

impl DurationReport {
    pub fn new(ctx: &TaskContext, duration: impl Into<String>) -> Self {
        Self {
            assignment_id: ctx.assignment_id.clone(),
            worker_id: ctx.worker_id.clone(),
            hit_id: ctx.hit_id.clone(),
            host: ctx.host().to_string(),
            duration: duration.into(),
            aws_account: ctx.account_id.clone(),
        }
    }

    pub fn form_fields(&self, naming: KeyNaming) -> Vec<(&'static str, String)> {
        let mut fields = identity_fields(
            naming,
            &self.assignment_id,
            &self.worker_id,
            &self.hit_id,
            &self.host,
            &self.aws_account,
        );
        fields.push(("duration", self.duration.clone()));
        fields
    }
}

fn identity_fields(
    naming: KeyNaming,
    assignment_id: &Option<String>,
    worker_id: &Option<String>,
    hit_id: &Option<String>,
    host: &str,
    aws_account: &str,
) -> Vec<(&'static str, String)> {
    let (assignment_key, worker_key, hit_key) = match naming {
        KeyNaming::SnakeCase => ("assignment_id", "worker_id", "hit_id"),
        KeyNaming::CamelCase => ("assignmentId", "workerId", "hitId"),
    };

    [
        (assignment_key, assignment_id.clone()),
        (worker_key, worker_id.clone()),
        (hit_key, hit_id.clone()),
        ("host", Some(host.to_string())),
        ("aws_account", Some(aws_account.to_string())),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, v)))
    .collect()
}
