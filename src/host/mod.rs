//! Capabilities the widget needs from the page that embeds it.
//!
//! Everything the protocol touches in the browser goes through [`HostPage`]
//! and every request goes through [`HttpTransport`], so the protocol logic
//! never reaches for page globals directly.

pub mod http;
#[cfg(test)]
pub(crate) mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::messenger::TargetOrigin;

pub use http::ReqwestTransport;

/// Iframe element the embedder asks the page to append to its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IframeSpec {
    pub id: String,
    pub src: String,
    pub style: String,
}

/// Outcome of handing a message to the page for delivery into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDelivery {
    Delivered,
    /// No element with the requested id exists yet.
    FrameMissing,
    /// The element exists but its content window has not loaded.
    WindowUnavailable,
}

pub trait HostPage: Send + Sync {
    /// Raw `location.search`, leading `?` included when present.
    fn location_search(&self) -> String;

    /// Raw `document.cookie`.
    fn cookies(&self) -> String;

    fn has_element(&self, id: &str) -> bool;

    fn append_iframe(&self, frame: &IframeSpec) -> Result<()>;

    /// Posts `payload` (already JSON) to the content window of frame `frame_id`,
    /// restricted to `target_origin`.
    fn post_message(
        &self,
        frame_id: &str,
        payload: &serde_json::Value,
        target_origin: &TargetOrigin,
    ) -> Result<FrameDelivery>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub url: String,
    pub fields: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Page cookies to send along; `None` sends the request uncredentialed.
    pub credentials: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends an `application/x-www-form-urlencoded` POST.
    async fn post_form(&self, request: FormRequest) -> Result<HttpResponse>;
}
