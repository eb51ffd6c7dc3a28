//! Scripted transport for handler and gateway tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{HttpTransport, LumaClient, OutboundRequest, RawReply};
use crate::config::Settings;
use crate::error::{LumaError, Result};

enum Scripted {
    Reply(RawReply),
    Network(String),
}

/// Replays queued replies in order and records every request it sees.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    seen: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(Scripted::Reply(RawReply {
            status,
            content_type: "application/json".into(),
            text: body.to_string(),
        }));
    }

    pub fn push_raw(&self, status: u16, content_type: &str, text: &str) {
        self.push(Scripted::Reply(RawReply {
            status,
            content_type: content_type.into(),
            text: text.into(),
        }));
    }

    pub fn push_network_error(&self, message: &str) {
        self.push(Scripted::Network(message.into()));
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::new(self.clone())
    }

    /// Client with the default base URL and `test-key` configured.
    pub fn client(&self) -> LumaClient {
        let settings = Settings::default().with_api_key(Some("test-key".into()));
        LumaClient::with_transport(settings, self.transport())
    }

    fn push(&self, reply: Scripted) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawReply> {
        self.seen.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Network(message)) => Err(LumaError::Network(message)),
            None => Err(LumaError::Network("no scripted reply".into())),
        }
    }
}
