//! Error types for the Luma tool handlers and gateway.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong between a tool call and its rendered reply.
///
/// Handlers never let these escape; they are folded into the returned text.
#[derive(Error, Debug)]
pub enum LumaError {
    #[error("{0}")]
    MissingArgument(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("LUMA_API_KEY environment variable or --api-key option is required")]
    MissingCredential,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}{}", render_body(.body))]
    Upstream { status: u16, body: Value },

    #[error("Unexpected response format from Luma API: {0}")]
    MalformedReply(String),
}

/// Result type alias for Luma operations.
pub type Result<T> = std::result::Result<T, LumaError>;

impl LumaError {
    /// A required tool argument was absent or empty.
    pub fn missing(field: &str) -> Self {
        Self::MissingArgument(format!("{field} parameter is required"))
    }

    /// HTTP status of an upstream failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable `detail` carried by an upstream failure.
    ///
    /// Reads the structured body first and falls back to scanning the
    /// rendered message for a quoted `detail` entry.
    pub fn detail(&self) -> Option<String> {
        let Self::Upstream { body, .. } = self else {
            return None;
        };
        if let Some(detail) = body.get("detail").and_then(Value::as_str) {
            return Some(detail.to_string());
        }
        let text = self.to_string();
        DETAIL_PATTERN
            .captures(&text)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
    }

    /// Substring match against the full message, including the upstream body.
    pub fn mentions(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }
}

static DETAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'detail': '([^']*)'|"detail"\s*:\s*"([^"]*)""#).expect("static regex")
});

fn render_body(body: &Value) -> String {
    match body {
        Value::Null => String::new(),
        Value::Object(map) if map.is_empty() => String::new(),
        Value::String(s) if s.is_empty() => String::new(),
        other => format!(": {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_message_includes_status_and_body() {
        let err = LumaError::Upstream {
            status: 400,
            body: json!({"detail": "bad things"}),
        };
        assert_eq!(err.to_string(), r#"HTTP error 400: {"detail":"bad things"}"#);
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn upstream_message_omits_empty_body() {
        let err = LumaError::Upstream {
            status: 500,
            body: json!({}),
        };
        assert_eq!(err.to_string(), "HTTP error 500");
    }

    #[test]
    fn detail_prefers_structured_field() {
        let err = LumaError::Upstream {
            status: 400,
            body: json!({"detail": "Generation is not complete"}),
        };
        assert_eq!(err.detail().as_deref(), Some("Generation is not complete"));
    }

    #[test]
    fn detail_falls_back_to_quoted_text() {
        let err = LumaError::Upstream {
            status: 400,
            body: json!({"raw_response": "{'detail': 'already upscaled'}"}),
        };
        assert_eq!(err.detail().as_deref(), Some("already upscaled"));
    }

    #[test]
    fn detail_is_none_for_other_kinds() {
        assert!(LumaError::Network("refused".into()).detail().is_none());
        assert!(LumaError::missing("prompt").status().is_none());
    }

    #[test]
    fn missing_argument_wording() {
        assert_eq!(
            LumaError::missing("generation_id").to_string(),
            "generation_id parameter is required"
        );
    }
}
