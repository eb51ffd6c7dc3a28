use tracing::warn;

use super::{failure, present, require, GenerateImageArgs, DEFAULT_IMAGE_MODEL, IMAGE_MODELS};
use crate::error::{LumaError, Result};
use crate::luma::types::{json_kind, Generation, ImageRequest};
use crate::luma::LumaClient;

const IMAGE_PENDING: &str = "Image will be available when processing completes";

/// Generate an image from a text prompt with a Photon model.
///
/// Unsupported models fall back to `photon-1` instead of failing.
pub async fn generate_image(
    client: &LumaClient,
    args: GenerateImageArgs,
    api_key: Option<&str>,
) -> String {
    let action = match present(&args.prompt) {
        Some(prompt) => format!("generating image for prompt '{prompt}'"),
        None => "generating image".to_string(),
    };
    generate(client, &args, api_key)
        .await
        .unwrap_or_else(|e| failure("generate_image", &action, &e))
}

fn image_model(requested: Option<&str>) -> &str {
    match requested {
        None => DEFAULT_IMAGE_MODEL,
        Some(model) if IMAGE_MODELS.contains(&model) => model,
        Some(model) => {
            warn!(
                model,
                "unsupported image model, using '{DEFAULT_IMAGE_MODEL}'; supported: {}",
                IMAGE_MODELS.join(", ")
            );
            DEFAULT_IMAGE_MODEL
        }
    }
}

async fn generate(client: &LumaClient, args: &GenerateImageArgs, api_key: Option<&str>) -> Result<String> {
    let prompt = require(&args.prompt, "prompt")?;
    let model = image_model(present(&args.model));

    let body = ImageRequest {
        prompt: prompt.to_string(),
        model: model.to_string(),
    };
    let reply = client.post("generations/image", api_key, &body).await?;

    if !reply.is_object() {
        warn!(%reply, "unexpected generate_image response format");
        return Ok(format!(
            "Image generation completed for prompt: {prompt}. Response: {reply}"
        ));
    }
    let gen = Generation::from_value(&reply).ok_or_else(|| {
        LumaError::MalformedReply(format!("expected an object, got {}", json_kind(&reply)))
    })?;

    Ok([
        format!("Image generation {}", gen.state_with_reason("Processing")),
        format!("ID: {}", gen.id.as_deref().unwrap_or("Unknown")),
        format!("Created at: {}", gen.created_at.as_deref().unwrap_or("Unknown")),
        format!("Model: {}", gen.model.as_deref().unwrap_or(model)),
        format!("Prompt: {prompt}"),
        format!("Image URL: {}", gen.asset("image").unwrap_or(IMAGE_PENDING)),
    ]
    .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::luma::testing::MockTransport;
    use serde_json::json;

    fn args(prompt: &str, model: Option<&str>) -> GenerateImageArgs {
        GenerateImageArgs {
            prompt: Some(prompt.into()),
            model: model.map(String::from),
        }
    }

    #[tokio::test]
    async fn renders_completed_image() {
        let mock = MockTransport::new();
        mock.push_json(
            200,
            json!({
                "id": "img-1",
                "state": "completed",
                "created_at": "2024-03-20T12:00:00Z",
                "model": "photon-flash-1",
                "assets": {"image": "https://example.com/image.png"}
            }),
        );
        let text = generate_image(&mock.client(), args("a fox", Some("photon-flash-1")), None).await;
        assert_eq!(
            text,
            "Image generation completed\n\
             ID: img-1\n\
             Created at: 2024-03-20T12:00:00Z\n\
             Model: photon-flash-1\n\
             Prompt: a fox\n\
             Image URL: https://example.com/image.png"
        );
        let sent = mock.requests();
        assert!(sent[0].url.ends_with("/generations/image"));
        assert_eq!(
            sent[0].body,
            Some(json!({"prompt": "a fox", "model": "photon-flash-1"}))
        );
    }

    #[tokio::test]
    async fn unsupported_model_is_coerced() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"id": "img-2", "state": "pending"}));
        let text = generate_image(&mock.client(), args("a fox", Some("ray-2")), None).await;
        assert_eq!(mock.requests()[0].body.as_ref().unwrap()["model"], "photon-1");
        assert!(text.contains("Model: photon-1"));
        assert!(text.ends_with("Image URL: Image will be available when processing completes"));
    }

    #[tokio::test]
    async fn failed_image_shows_reason() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"state": "failed", "failure_reason": "blocked"}));
        let text = generate_image(&mock.client(), args("x", None), None).await;
        assert!(text.starts_with("Image generation failed (Reason: blocked)\nID: Unknown"));
    }

    #[tokio::test]
    async fn prompt_is_required() {
        let mock = MockTransport::new();
        let text = generate_image(&mock.client(), GenerateImageArgs::default(), None).await;
        assert_eq!(text, "Error generating image: prompt parameter is required");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn upstream_error_names_prompt() {
        let mock = MockTransport::new();
        mock.push_json(402, json!({"detail": "Insufficient credits"}));
        let text = generate_image(&mock.client(), args("a fox", None), None).await;
        assert_eq!(
            text,
            r#"Error generating image for prompt 'a fox': HTTP error 402: {"detail":"Insufficient credits"}"#
        );
    }
}
