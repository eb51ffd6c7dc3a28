pub mod account;
pub mod image;
pub mod video;

pub use account::{get_camera_motions, get_credits, ping};
pub use image::generate_image;
pub use video::{
    add_audio, create_generation, delete_generation, get_generation, list_generations,
    upscale_generation,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{LumaError, Result};
use crate::luma::types::{lenient_text, Generation};

// ---------------------------------------------------------------------------
// Valid values: aligned with the Dream Machine API
// ---------------------------------------------------------------------------

pub const RESOLUTIONS: &[&str] = &["540p", "720p", "1080p", "4k"];

/// The API currently rejects every other duration.
pub const DURATIONS: &[&str] = &["5s", "9s"];

pub const IMAGE_MODELS: &[&str] = &["photon-1", "photon-flash-1"];

pub const DEFAULT_VIDEO_MODEL: &str = "ray-2";
pub const DEFAULT_IMAGE_MODEL: &str = "photon-1";
pub const DEFAULT_LIST_LIMIT: u32 = 10;
pub const DEFAULT_LIST_OFFSET: u32 = 0;

// ---------------------------------------------------------------------------
// Tool arguments
//
// Required fields are `Option` so that an absent value reaches the handler
// and is reported in its text reply instead of failing deserialization.
// Scalars are read leniently: a number or bool where text is expected is
// kept as its JSON text, so callers never hit a schema rejection.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateGenerationArgs {
    /// Required. Text prompt describing the video.
    #[serde(default, deserialize_with = "lenient_text")]
    pub prompt: Option<String>,
    /// Model to use. Defaults to "ray-2".
    #[serde(default, deserialize_with = "lenient_text")]
    pub model: Option<String>,
    /// One of "540p", "720p", "1080p", "4k".
    #[serde(default, deserialize_with = "lenient_text")]
    pub resolution: Option<String>,
    /// Only "5s" or "9s" are supported by the API.
    #[serde(default, deserialize_with = "lenient_text")]
    pub duration: Option<String>,
    /// Aspect ratio such as "16:9".
    #[serde(default, deserialize_with = "lenient_text")]
    pub aspect_ratio: Option<String>,
    /// Whether the video should loop.
    #[serde(rename = "loop", default)]
    #[schemars(with = "Option<bool>")]
    pub looping: Option<Value>,
    /// Object with frame0 and/or frame1, each {"type":"image","url":...}
    /// or {"type":"generation","id":...}.
    pub keyframes: Option<Value>,
    /// URL to notify when the generation completes.
    #[serde(default, deserialize_with = "lenient_text")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GenerationIdArgs {
    /// Required. ID of the generation.
    #[serde(default, deserialize_with = "lenient_text")]
    pub generation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListGenerationsArgs {
    /// Maximum number of generations to return. Defaults to 10.
    #[serde(default, deserialize_with = "lenient_text")]
    #[schemars(with = "Option<u32>")]
    pub limit: Option<String>,
    /// Number of generations to skip. Defaults to 0.
    #[serde(default, deserialize_with = "lenient_text")]
    #[schemars(with = "Option<u32>")]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpscaleGenerationArgs {
    /// Required. ID of the generation to upscale.
    #[serde(default, deserialize_with = "lenient_text")]
    pub generation_id: Option<String>,
    /// Required. Target resolution: "540p", "720p", "1080p" or "4k".
    /// Must be higher than the original.
    #[serde(default, deserialize_with = "lenient_text")]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddAudioArgs {
    /// Required. ID of the video generation.
    #[serde(default, deserialize_with = "lenient_text")]
    pub generation_id: Option<String>,
    /// Required. Prompt for the audio.
    #[serde(default, deserialize_with = "lenient_text")]
    pub prompt: Option<String>,
    /// Sounds to avoid.
    #[serde(default, deserialize_with = "lenient_text")]
    pub negative_prompt: Option<String>,
    /// URL to notify when audio processing completes.
    #[serde(default, deserialize_with = "lenient_text")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GenerateImageArgs {
    /// Required. Text prompt describing the image.
    #[serde(default, deserialize_with = "lenient_text")]
    pub prompt: Option<String>,
    /// "photon-1" (default) or "photon-flash-1".
    #[serde(default, deserialize_with = "lenient_text")]
    pub model: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// The value of a required string argument; blank counts as missing.
fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| LumaError::missing(field))
}

fn require_for<'a>(value: &'a Option<String>, field: &str, purpose: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| {
        LumaError::MissingArgument(format!("{field} parameter is required for {purpose}"))
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Log the failure and render it the way every handler reports errors.
fn failure(tool: &str, action: &str, err: &LumaError) -> String {
    error!(tool, "{action} failed: {err}");
    format!("Error {action}: {err}")
}

/// `"<action> <id>"`, or just `"<action>"` when the id is unknown.
fn with_subject(action: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{action} {id}"),
        None => action.to_string(),
    }
}

/// Video-style asset lines: video, progress video, thumbnail.
fn video_asset_lines(generation: &Generation) -> Vec<String> {
    [
        ("video", "Video URL"),
        ("progress_video", "Progress video"),
        ("image", "Thumbnail"),
    ]
    .into_iter()
    .filter_map(|(key, label)| generation.asset(key).map(|url| format!("{label}: {url}")))
    .collect()
}

/// Append a blank line and an `Assets:` block when there is anything to list.
fn push_assets(output: &mut Vec<String>, assets: Vec<String>) {
    if assets.is_empty() {
        return;
    }
    output.push(String::new());
    output.push("Assets:".into());
    output.extend(assets);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_args_accept_loop_keyword() {
        let args: CreateGenerationArgs = serde_json::from_value(json!({
            "prompt": "a cat",
            "loop": true,
            "keyframes": {"frame0": {"type": "image", "url": "u"}}
        }))
        .unwrap();
        assert_eq!(args.prompt.as_deref(), Some("a cat"));
        assert_eq!(args.looping, Some(json!(true)));
        assert!(args.keyframes.is_some());
        assert!(args.model.is_none());
    }

    #[test]
    fn required_fields_may_be_absent() {
        let args: UpscaleGenerationArgs = serde_json::from_value(json!({})).unwrap();
        assert!(args.generation_id.is_none());
        assert!(args.resolution.is_none());
    }

    #[test]
    fn blank_counts_as_missing() {
        let err = require(&Some("   ".into()), "prompt").unwrap_err();
        assert_eq!(err.to_string(), "prompt parameter is required");
        assert_eq!(require(&Some("x".into()), "prompt").unwrap(), "x");
    }

    #[test]
    fn loosely_typed_scalars_are_kept() {
        let list: ListGenerationsArgs =
            serde_json::from_value(json!({"limit": "5", "offset": -1})).unwrap();
        assert_eq!(list.limit.as_deref(), Some("5"));
        assert_eq!(list.offset.as_deref(), Some("-1"));

        let create: CreateGenerationArgs = serde_json::from_value(json!({
            "prompt": 123,
            "loop": "true",
            "duration": 5,
            "model": null
        }))
        .unwrap();
        assert_eq!(create.prompt.as_deref(), Some("123"));
        assert_eq!(create.looping, Some(json!("true")));
        assert_eq!(create.duration.as_deref(), Some("5"));
        assert!(create.model.is_none());
    }

    #[test]
    fn list_schema_still_advertises_integers() {
        let schema = serde_json::to_value(schemars::schema_for!(ListGenerationsArgs)).unwrap();
        let limit = schema["properties"]["limit"].to_string();
        assert!(limit.contains("integer"), "{limit}");
    }

    #[test]
    fn schema_lists_argument_names() {
        let schema = serde_json::to_value(schemars::schema_for!(AddAudioArgs)).unwrap();
        let props = schema["properties"].as_object().unwrap();
        for key in ["generation_id", "prompt", "negative_prompt", "callback_url"] {
            assert!(props.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn assets_block_only_when_non_empty() {
        let mut out = vec!["head".to_string()];
        push_assets(&mut out, vec![]);
        assert_eq!(out.len(), 1);
        push_assets(&mut out, vec!["Video URL: v".into()]);
        assert_eq!(out, vec!["head", "", "Assets:", "Video URL: v"]);
    }
}
