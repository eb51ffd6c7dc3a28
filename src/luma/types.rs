use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{LumaError, Result};

// ---------------------------------------------------------------------------
// Request bodies
// POST {base}/generations, /generations/image, /generations/{id}/upscale,
// /generations/{id}/audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Forwarded as supplied; the API decides how strictly to read it.
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub looping: Option<Value>,
    /// Forwarded exactly as the caller supplied it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpscaleRequest {
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Keyframes
// ---------------------------------------------------------------------------

/// One keyframe slot. `Other` covers an object whose `type` is neither
/// `image` nor `generation`; it still counts as present.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRef {
    Image { url: Option<String> },
    Generation { id: Option<String> },
    Other,
}

impl FrameRef {
    fn decode(slot: &str, value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(LumaError::InvalidArgument(format!(
                "keyframes.{slot} must be an object"
            )));
        };
        Ok(match obj.get("type").and_then(Value::as_str) {
            Some("image") => Self::Image {
                url: obj.get("url").and_then(value_text),
            },
            Some("generation") => Self::Generation {
                id: obj.get("id").and_then(value_text),
            },
            _ => Self::Other,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes {
    pub frame0: Option<FrameRef>,
    pub frame1: Option<FrameRef>,
}

impl Keyframes {
    /// Decode the `frame0`/`frame1` slots; at least one must be present.
    pub fn decode(map: &Map<String, Value>) -> Result<Self> {
        if !map.contains_key("frame0") && !map.contains_key("frame1") {
            return Err(LumaError::InvalidArgument(
                "keyframes must contain frame0 or frame1".into(),
            ));
        }
        Ok(Self {
            frame0: map.get("frame0").map(|v| FrameRef::decode("frame0", v)).transpose()?,
            frame1: map.get("frame1").map(|v| FrameRef::decode("frame1", v)).transpose()?,
        })
    }

    /// What the keyframe combination asks for, e.g.
    /// `starting from an image, ending with an image`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match self.frame0 {
            Some(FrameRef::Image { .. }) => parts.push("starting from an image"),
            Some(FrameRef::Generation { .. }) => parts.push("extending an existing video"),
            _ => {}
        }
        match self.frame1 {
            Some(FrameRef::Image { .. }) => parts.push("ending with an image"),
            Some(FrameRef::Generation { .. }) if self.frame0.is_some() => {
                parts.push("interpolating between videos")
            }
            Some(FrameRef::Generation { .. }) => {
                parts.push("reverse extending to an existing video")
            }
            _ => {}
        }
        parts.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Generation: GET {base}/generations/{id} and most POST replies
// ---------------------------------------------------------------------------

/// Display label derived from `generation_type` and the echoed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Image,
    Advanced,
    TextToVideo,
}

impl GenerationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Advanced => "Advanced",
            Self::TextToVideo => "Text-to-video",
        }
    }
}

/// The parts of the original request the upstream echoes back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestEcho {
    pub prompt: Option<String>,
    pub has_keyframes: bool,
}

/// Upstream generation record. Every field is optional and tolerant of
/// unexpected JSON types; non-string scalars are kept in their JSON form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Generation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub generation_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub failure_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub resolution: Option<String>,
    #[serde(default, deserialize_with = "lenient_assets")]
    pub assets: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_echo")]
    pub request: RequestEcho,
}

impl Generation {
    /// Decode an object reply; anything else is not a generation.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn is_image(&self) -> bool {
        self.generation_type.as_deref() == Some("image")
    }

    pub fn kind(&self) -> GenerationKind {
        if self.is_image() {
            GenerationKind::Image
        } else if self.request.has_keyframes {
            GenerationKind::Advanced
        } else {
            GenerationKind::TextToVideo
        }
    }

    /// `state`, or `fallback` when absent, with the failure reason appended
    /// for failed generations.
    pub fn state_with_reason(&self, fallback: &str) -> String {
        let state = self.state.as_deref().unwrap_or(fallback);
        match self.failure_reason.as_deref() {
            Some(reason) if state == "failed" && !reason.is_empty() => {
                format!("{state} (Reason: {reason})")
            }
            _ => state.to_string(),
        }
    }

    pub fn asset(&self, key: &str) -> Option<&str> {
        self.assets.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// GET {base}/generations: four shapes seen in the wild
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationListing {
    /// Empty object or empty list.
    Empty,
    /// `{"generations": [...], "has_more": bool, "count": n}`
    Paged {
        entries: Vec<Value>,
        count: String,
        has_more: bool,
    },
    /// `[...]`
    Bare(Vec<Value>),
    /// A single generation object with `id` and `state`.
    Single(Value),
    /// The list nested under `data`, `results` or `items`.
    Keyed(Vec<Value>),
    /// An object with none of the above.
    Unrecognized(Map<String, Value>),
}

const LISTING_KEYS: [&str; 3] = ["data", "results", "items"];

impl GenerationListing {
    pub fn decode(reply: Value) -> Result<Self> {
        match reply {
            Value::Array(items) if items.is_empty() => Ok(Self::Empty),
            Value::Array(items) => Ok(Self::Bare(items)),
            Value::Object(map) if map.is_empty() => Ok(Self::Empty),
            Value::Object(mut map) => {
                if let Some(Value::Array(entries)) = map.get("generations") {
                    let count = map
                        .get("count")
                        .and_then(value_text)
                        .unwrap_or_else(|| entries.len().to_string());
                    let has_more = map.get("has_more").is_some_and(truthy);
                    let entries = entries.clone();
                    return Ok(Self::Paged {
                        entries,
                        count,
                        has_more,
                    });
                }
                if map.contains_key("id") && map.contains_key("state") {
                    return Ok(Self::Single(Value::Object(map)));
                }
                let keyed = LISTING_KEYS
                    .iter()
                    .find(|key| map.get(**key).is_some_and(Value::is_array))
                    .copied();
                match keyed.and_then(|key| map.remove(key)) {
                    Some(Value::Array(entries)) if !entries.is_empty() => Ok(Self::Keyed(entries)),
                    Some(other) => {
                        // put it back so the diagnostic shows the whole reply
                        if let Some(key) = keyed {
                            map.insert(key.to_string(), other);
                        }
                        Ok(Self::Unrecognized(map))
                    }
                    None => Ok(Self::Unrecognized(map)),
                }
            }
            other if !truthy(&other) => Ok(Self::Empty),
            other => Err(LumaError::MalformedReply(format!(
                "expected an object with generations, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Entries in reply order, regardless of shape.
    pub fn entries(&self) -> &[Value] {
        match self {
            Self::Paged { entries, .. } | Self::Bare(entries) | Self::Keyed(entries) => entries,
            Self::Single(value) => std::slice::from_ref(value),
            Self::Empty | Self::Unrecognized(_) => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// GET {base}/generations/camera_motion/list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CameraMotionList {
    Empty,
    Motions(Vec<String>),
    /// An object with no recognizable list; carries its keys.
    Unrecognized(Vec<String>),
    /// Neither an object nor a list.
    Unexpected(Value),
}

const MOTION_KEYS: [&str; 5] = ["motions", "camera_motions", "data", "items", "results"];

impl CameraMotionList {
    pub fn decode(reply: Value) -> Self {
        match reply {
            Value::Array(items) if items.is_empty() => Self::Empty,
            Value::Array(items) => Self::Motions(items.iter().map(motion_name).collect()),
            Value::Object(map) if map.is_empty() => Self::Empty,
            Value::Object(map) => MOTION_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
                .map(|items| Self::Motions(items.iter().map(motion_name).collect()))
                .unwrap_or_else(|| Self::Unrecognized(map.keys().cloned().collect())),
            other if !truthy(&other) => Self::Empty,
            other => Self::Unexpected(other),
        }
    }
}

fn motion_name(motion: &Value) -> String {
    if let Some(obj) = motion.as_object() {
        if let Some(name) = obj.get("name").or_else(|| obj.get("id")) {
            return display_value(name);
        }
    }
    display_value(motion)
}

// ---------------------------------------------------------------------------
// GET {base}/credits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CreditBalance {
    Balance(String),
    Breakdown {
        available: Option<String>,
        used: Option<String>,
        total: Option<String>,
    },
}

impl CreditBalance {
    pub fn decode(map: &Map<String, Value>) -> Self {
        if let Some(balance) = map.get("credit_balance") {
            return Self::Balance(display_value(balance));
        }
        Self::Breakdown {
            available: map.get("credits_available").map(display_value),
            used: map.get("credits_used").map(display_value),
            total: map.get("credits_total").map(display_value),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient value helpers
// ---------------------------------------------------------------------------

/// Strings verbatim, other scalars and containers as JSON, `null` as absent.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(display_value(other)),
    }
}

/// Like [`value_text`] but renders `null` as `null`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn lenient_assets<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_object()
        .map(|assets| {
            assets
                .iter()
                .filter_map(|(key, url)| value_text(url).map(|url| (key.clone(), url)))
                .collect()
        })
        .unwrap_or_default())
}

fn lenient_echo<'de, D>(deserializer: D) -> std::result::Result<RequestEcho, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(request) = value.as_object() else {
        return Ok(RequestEcho::default());
    };
    Ok(RequestEcho {
        prompt: request.get("prompt").and_then(value_text),
        has_keyframes: request
            .get("keyframes")
            .and_then(Value::as_object)
            .is_some_and(|k| !k.is_empty()),
    })
}
