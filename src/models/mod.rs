pub mod message;
pub mod report;
pub mod task;

pub use message::{CrossFrameMessage, MessageStatus};
pub use report::{DurationReport, RegistrationRequest};
pub use task::{resolve_host, TaskContext, PREVIEW_ASSIGNMENT_ID, PRODUCTION_HOST, SANDBOX_HOST};
