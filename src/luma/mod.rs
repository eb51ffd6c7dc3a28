pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{LumaError, Result};

/// A fully-assembled HTTP call, ready for a transport.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What came back over the wire, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub content_type: String,
    pub text: String,
}

/// Executes one request. Transport faults surface as [`LumaError::Network`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawReply>;
}

pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawReply> {
        let mut builder = self
            .http
            .request(request.method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| LumaError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        // Consumes the response; the connection is released however this ends.
        let text = resp
            .text()
            .await
            .map_err(|e| LumaError::Network(e.to_string()))?;

        Ok(RawReply {
            status,
            content_type,
            text,
        })
    }
}

/// Authenticated gateway to the Dream Machine REST API.
#[derive(Clone)]
pub struct LumaClient {
    settings: Settings,
    transport: Arc<dyn HttpTransport>,
}

impl LumaClient {
    pub fn new(settings: Settings) -> Self {
        Self::with_transport(settings, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(settings: Settings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Perform one call against `{base_url}/{path}`.
    ///
    /// `api_key` overrides the configured credential for this call only.
    /// The reply is a decoded JSON value, an empty object for an empty body,
    /// or `{"raw_response": text}` when the body is not JSON.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        api_key: Option<&str>,
        body: Option<Value>,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or(self.settings.api_key.as_deref())
            .ok_or(LumaError::MissingCredential)?;

        let request = OutboundRequest {
            method,
            url: format!("{}/{}", self.settings.base_url, path),
            headers: vec![
                ("Authorization".into(), format!("Bearer {api_key}")),
                ("Content-Type".into(), "application/json".into()),
                ("Accept".into(), "application/json".into()),
            ],
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
            timeout: self.settings.timeout,
        };
        debug!(method = %request.method, url = %request.url, "luma request");

        let raw = self.transport.send(request).await?;
        let reply = decode_reply(&raw);

        if raw.status >= 400 {
            return Err(LumaError::Upstream {
                status: raw.status,
                body: reply,
            });
        }
        Ok(reply)
    }

    pub async fn get(&self, path: &str, api_key: Option<&str>) -> Result<Value> {
        self.request(Method::GET, path, api_key, None, &[]).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, api_key: Option<&str>, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)
            .map_err(|e| LumaError::InvalidArgument(format!("failed to encode request body: {e}")))?;
        self.request(Method::POST, path, api_key, Some(body), &[]).await
    }

    pub async fn delete(&self, path: &str, api_key: Option<&str>) -> Result<Value> {
        self.request(Method::DELETE, path, api_key, None, &[]).await
    }
}

fn decode_reply(raw: &RawReply) -> Value {
    if raw.text.is_empty() {
        return Value::Object(Map::new());
    }
    let looks_json = raw.content_type.contains("application/json")
        || raw.text.starts_with('{')
        || raw.text.starts_with('[');
    if !looks_json {
        return json!({ "raw_response": raw.text });
    }
    match serde_json::from_str(&raw.text) {
        Ok(value) => value,
        Err(e) => {
            warn!("failed to parse JSON response: {e}");
            json!({ "raw_response": raw.text })
        }
    }
}
