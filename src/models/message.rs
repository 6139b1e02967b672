use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MessageStatus {
    EstimatedTime,
}

/// Payload the parent page posts into the compliance widget frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossFrameMessage {
    pub status: MessageStatus,
    /// Seconds on task, fractional like the page-side timer reports them.
    pub value: f64,
}

impl CrossFrameMessage {
    pub fn estimated_time(seconds: f64) -> Self {
        Self {
            status: MessageStatus::EstimatedTime,
            value: seconds,
        }
    }
}
