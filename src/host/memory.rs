//! In-memory page and transport used by the unit tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::messenger::TargetOrigin;

use super::{FormRequest, FrameDelivery, HostPage, HttpResponse, HttpTransport, IframeSpec};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostedMessage {
    pub frame_id: String,
    pub payload: serde_json::Value,
    pub target_origin: String,
}

#[derive(Default)]
pub(crate) struct MemoryPage {
    search: String,
    cookies: Mutex<String>,
    frames: Mutex<Vec<IframeSpec>>,
    loaded: Mutex<HashSet<String>>,
    posted: Mutex<Vec<PostedMessage>>,
}

impl MemoryPage {
    pub fn new(search: &str) -> Arc<Self> {
        Arc::new(Self {
            search: search.to_string(),
            ..Self::default()
        })
    }

    pub fn set_cookies(&self, cookies: &str) {
        *self.cookies.lock().unwrap() = cookies.to_string();
    }

    /// Simulates the frame's content window finishing its load.
    pub fn mark_loaded(&self, id: &str) {
        self.loaded.lock().unwrap().insert(id.to_string());
    }

    pub fn frames(&self) -> Vec<IframeSpec> {
        self.frames.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().unwrap().clone()
    }
}

impl HostPage for MemoryPage {
    fn location_search(&self) -> String {
        self.search.clone()
    }

    fn cookies(&self) -> String {
        self.cookies.lock().unwrap().clone()
    }

    fn has_element(&self, id: &str) -> bool {
        self.frames.lock().unwrap().iter().any(|frame| frame.id == id)
    }

    fn append_iframe(&self, frame: &IframeSpec) -> Result<()> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn post_message(
        &self,
        frame_id: &str,
        payload: &serde_json::Value,
        target_origin: &TargetOrigin,
    ) -> Result<FrameDelivery> {
        if !self.has_element(frame_id) {
            return Ok(FrameDelivery::FrameMissing);
        }
        if !self.loaded.lock().unwrap().contains(frame_id) {
            return Ok(FrameDelivery::WindowUnavailable);
        }
        self.posted.lock().unwrap().push(PostedMessage {
            frame_id: frame_id.to_string(),
            payload: payload.clone(),
            target_origin: target_origin.as_str().to_string(),
        });
        Ok(FrameDelivery::Delivered)
    }
}

pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<FormRequest>>,
    status: u16,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::responding(200)
    }

    pub fn responding(status: u16) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status: 0,
            fail: true,
        })
    }

    pub fn requests(&self) -> Vec<FormRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post_form(&self, request: FormRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            bail!("connection refused");
        }
        Ok(HttpResponse {
            status: self.status,
            body: "ok".into(),
        })
    }
}

/// Field value lookup for assertions.
pub(crate) fn field<'a>(request: &'a FormRequest, key: &str) -> Option<&'a str> {
    request
        .fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
