use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::{
    failure, present, push_assets, require, require_for, video_asset_lines, with_subject,
    AddAudioArgs, CreateGenerationArgs, GenerationIdArgs, ListGenerationsArgs,
    UpscaleGenerationArgs, DEFAULT_LIST_LIMIT, DEFAULT_LIST_OFFSET, DEFAULT_VIDEO_MODEL,
    DURATIONS, RESOLUTIONS,
};
use crate::error::{LumaError, Result};
use crate::luma::types::{
    json_kind, truthy, AudioRequest, Generation, GenerationListing, GenerationRequest, Keyframes,
    UpscaleRequest,
};
use crate::luma::LumaClient;

const UPSCALE_MAX_RETRIES: u32 = 2;
const UPSCALE_RETRY_DELAY: Duration = Duration::from_secs(2);
const SAME_RESOLUTION: &str = "same resolution as the original";

fn expect_generation(reply: &Value) -> Result<Generation> {
    Generation::from_value(reply).ok_or_else(|| {
        LumaError::MalformedReply(format!("expected an object, got {}", json_kind(reply)))
    })
}

// ---------------------------------------------------------------------------
// create_generation: POST generations
// ---------------------------------------------------------------------------

/// Create a video generation from text, images or existing generations.
pub async fn create_generation(
    client: &LumaClient,
    args: CreateGenerationArgs,
    api_key: Option<&str>,
) -> String {
    create(client, &args, api_key)
        .await
        .unwrap_or_else(|e| failure("create_generation", "creating generation", &e))
}

async fn create(
    client: &LumaClient,
    args: &CreateGenerationArgs,
    api_key: Option<&str>,
) -> Result<String> {
    let prompt = require(&args.prompt, "prompt")?;

    if let Some(duration) = args.duration.as_deref() {
        if !DURATIONS.contains(&duration) {
            warn!(duration, "unsupported duration; only '5s' or '9s' are supported");
        }
    }

    let keyframes = match &args.keyframes {
        None => None,
        Some(value) if !truthy(value) => None,
        Some(Value::Object(map)) => Some((map.clone(), Keyframes::decode(map)?)),
        Some(_) => {
            return Err(LumaError::InvalidArgument(
                "keyframes must be an object".into(),
            ))
        }
    };
    if let Some((_, decoded)) = &keyframes {
        info!(intent = %decoded.describe(), "creating generation with keyframes");
    }

    let model = present(&args.model).unwrap_or(DEFAULT_VIDEO_MODEL);
    let (raw_keyframes, decoded) = keyframes.unzip();
    let req = GenerationRequest {
        prompt: prompt.to_string(),
        model: model.to_string(),
        resolution: args.resolution.clone(),
        duration: args.duration.clone(),
        aspect_ratio: args.aspect_ratio.clone(),
        looping: args.looping.clone().filter(|v| !v.is_null()),
        keyframes: raw_keyframes,
        callback_url: args.callback_url.clone(),
    };

    let reply = client.post("generations", api_key, &req).await?;
    let gen = expect_generation(&reply)?;

    let id = gen.id.as_deref().unwrap_or("Unknown");
    let header = if gen.is_image() {
        format!("Created image generation with ID: {id}")
    } else if let Some(decoded) = decoded {
        format!("Created advanced generation ({}) with ID: {id}", decoded.describe())
    } else {
        format!("Created text-to-video generation with ID: {id}")
    };

    Ok([
        header,
        format!("State: {}", gen.state.as_deref().unwrap_or("Processing")),
        format!("Created at: {}", gen.created_at.as_deref().unwrap_or("Unknown")),
        format!("Model: {}", gen.model.as_deref().unwrap_or(model)),
        format!("Prompt: {prompt}"),
    ]
    .join("\n"))
}

// ---------------------------------------------------------------------------
// get_generation: GET generations/{id}
// ---------------------------------------------------------------------------

pub async fn get_generation(
    client: &LumaClient,
    args: GenerationIdArgs,
    api_key: Option<&str>,
) -> String {
    let action = with_subject("getting generation", present(&args.generation_id));
    fetch(client, &args, api_key)
        .await
        .unwrap_or_else(|e| failure("get_generation", &action, &e))
}

async fn fetch(client: &LumaClient, args: &GenerationIdArgs, api_key: Option<&str>) -> Result<String> {
    let id = require(&args.generation_id, "generation_id")?;
    let reply = client.get(&format!("generations/{id}"), api_key).await?;
    let gen = expect_generation(&reply)?;

    let assets = if gen.is_image() {
        gen.asset("image")
            .map(|url| vec![format!("Image URL: {url}")])
            .unwrap_or_default()
    } else {
        video_asset_lines(&gen)
    };
    let assets = if assets.is_empty() {
        "No assets available yet".to_string()
    } else {
        assets.join("\n")
    };

    Ok([
        format!("Generation ID: {}", gen.id.as_deref().unwrap_or(id)),
        format!("Type: {}", gen.kind().label()),
        format!("State: {}", gen.state_with_reason("Unknown")),
        format!("Created at: {}", gen.created_at.as_deref().unwrap_or("Unknown")),
        format!("Model: {}", gen.model.as_deref().unwrap_or("Unknown")),
        format!("Prompt: {}", gen.request.prompt.as_deref().unwrap_or("Unknown")),
        assets,
    ]
    .join("\n"))
}

// ---------------------------------------------------------------------------
// list_generations: GET generations?limit&offset
// ---------------------------------------------------------------------------

pub async fn list_generations(
    client: &LumaClient,
    args: ListGenerationsArgs,
    api_key: Option<&str>,
) -> String {
    list(client, &args, api_key)
        .await
        .unwrap_or_else(|e| failure("list_generations", "listing generations", &e))
}

async fn list(client: &LumaClient, args: &ListGenerationsArgs, api_key: Option<&str>) -> Result<String> {
    // forwarded as given; the API validates the bounds
    let limit = present(&args.limit).map_or_else(|| DEFAULT_LIST_LIMIT.to_string(), String::from);
    let offset = present(&args.offset).map_or_else(|| DEFAULT_LIST_OFFSET.to_string(), String::from);
    let reply = client
        .request(
            Method::GET,
            "generations",
            api_key,
            None,
            &[("limit", limit), ("offset", offset)],
        )
        .await?;

    let listing = GenerationListing::decode(reply)?;
    if let GenerationListing::Unrecognized(map) = &listing {
        warn!(keys = ?map.keys().collect::<Vec<_>>(), "unexpected generations response structure");
        return Ok(format!(
            "Response format from Luma API doesn't contain generations: {}",
            Value::Object(map.clone())
        ));
    }
    if listing.entries().is_empty() {
        return Ok("No generations found".into());
    }

    let mut output = vec!["Generations:".to_string()];
    if let GenerationListing::Paged {
        entries,
        count,
        has_more,
    } = &listing
    {
        let more = if *has_more { " (more available)" } else { "" };
        output.push(format!("Showing {} of {count} generations{more}", entries.len()));
    }

    for entry in listing.entries() {
        match Generation::from_value(entry) {
            Some(gen) => output.push(summary_entry(&gen)),
            None => warn!(%entry, "skipping non-object generation"),
        }
    }
    Ok(output.join("\n"))
}

fn summary_entry(gen: &Generation) -> String {
    let (label, key) = if gen.is_image() {
        ("Image URL", "image")
    } else {
        ("Video URL", "video")
    };
    format!(
        "ID: {}\n  Type: {}\n  State: {}\n  Created at: {}\n  Prompt: {}\n  {label}: {}\n",
        gen.id.as_deref().unwrap_or("Unknown ID"),
        gen.kind().label(),
        gen.state.as_deref().unwrap_or("Unknown state"),
        gen.created_at.as_deref().unwrap_or("Unknown date"),
        gen.request.prompt.as_deref().unwrap_or("Unknown prompt"),
        gen.asset(key).unwrap_or("Not available yet"),
    )
}

// ---------------------------------------------------------------------------
// delete_generation: DELETE generations/{id}
// ---------------------------------------------------------------------------

pub async fn delete_generation(
    client: &LumaClient,
    args: GenerationIdArgs,
    api_key: Option<&str>,
) -> String {
    let action = with_subject("deleting generation", present(&args.generation_id));
    let result = async {
        let id = require(&args.generation_id, "generation_id")?;
        client.delete(&format!("generations/{id}"), api_key).await?;
        Ok::<_, LumaError>(format!("Generation {id} deleted successfully"))
    }
    .await;
    result.unwrap_or_else(|e| failure("delete_generation", &action, &e))
}

// ---------------------------------------------------------------------------
// upscale_generation: POST generations/{id}/upscale
// ---------------------------------------------------------------------------

/// Upscale a completed generation. HTTP 500 replies are retried twice,
/// two seconds apart.
pub async fn upscale_generation(
    client: &LumaClient,
    args: UpscaleGenerationArgs,
    api_key: Option<&str>,
) -> String {
    match upscale(client, &args, api_key).await {
        Ok(text) => text,
        Err(e) => upscale_failure(present(&args.generation_id), &e),
    }
}

async fn upscale(
    client: &LumaClient,
    args: &UpscaleGenerationArgs,
    api_key: Option<&str>,
) -> Result<String> {
    let id = require(&args.generation_id, "generation_id")?;
    let resolution = require_for(&args.resolution, "resolution", "upscaling")?;
    if !RESOLUTIONS.contains(&resolution) {
        return Err(LumaError::InvalidArgument(format!(
            "Invalid resolution: {resolution}. Must be one of {}",
            RESOLUTIONS.join(", ")
        )));
    }

    let path = format!("generations/{id}/upscale");
    let body = UpscaleRequest {
        resolution: resolution.to_string(),
    };

    let mut retries = 0;
    let reply = loop {
        match client.post(&path, api_key, &body).await {
            Ok(reply) => break reply,
            Err(e) if e.mentions(SAME_RESOLUTION) => {
                return Err(LumaError::InvalidArgument(format!(
                    "Cannot upscale to {resolution} because the original generation is already \
                     at this resolution. Please choose a higher resolution."
                )));
            }
            Err(e) if e.status() == Some(500) && retries < UPSCALE_MAX_RETRIES => {
                retries += 1;
                warn!(
                    generation_id = id,
                    "server error during upscale, retrying ({retries}/{UPSCALE_MAX_RETRIES})"
                );
                sleep(UPSCALE_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    };

    if !reply.is_object() {
        warn!(%reply, "unexpected upscale response format");
        return Ok(format!("Upscale initiated for generation {id}. Response: {reply}"));
    }
    let gen = expect_generation(&reply)?;

    let mut output = vec![
        format!("Upscale initiated for generation {}", gen.id.as_deref().unwrap_or(id)),
        format!("Target resolution: {}", gen.resolution.as_deref().unwrap_or(resolution)),
        format!("Status: {}", gen.state_with_reason("Processing")),
        format!("Created at: {}", gen.created_at.as_deref().unwrap_or("Unknown")),
        format!("Model: {}", gen.model.as_deref().unwrap_or("Unknown")),
    ];
    push_assets(&mut output, video_asset_lines(&gen));
    Ok(output.join("\n"))
}

fn upscale_failure(id: Option<&str>, err: &LumaError) -> String {
    let action = with_subject("upscaling generation", id);
    match err.status() {
        Some(400) => {
            error!(tool = "upscale_generation", "bad request: {err}");
            let detail = err.detail().unwrap_or_else(|| "Invalid request".into());
            format!(
                "Error {action}: {detail}. Common issues include:\n\
                 - The generation is not in a completed state\n\
                 - The requested resolution is not higher than the original\n\
                 - The generation was already upscaled"
            )
        }
        Some(500) => {
            error!(tool = "upscale_generation", "server error: {err}");
            format!(
                "Error {action}: Server Error. This could be due to:\n\
                 - The generation not being in a completed state\n\
                 - The generation already being upscaled\n\
                 - The Luma API experiencing temporary issues\n\n\
                 Please check the generation status and try again later."
            )
        }
        _ => failure("upscale_generation", &action, err),
    }
}

// ---------------------------------------------------------------------------
// add_audio: POST generations/{id}/audio
// ---------------------------------------------------------------------------

pub async fn add_audio(client: &LumaClient, args: AddAudioArgs, api_key: Option<&str>) -> String {
    let action = with_subject("adding audio to generation", present(&args.generation_id));
    audio(client, &args, api_key)
        .await
        .unwrap_or_else(|e| failure("add_audio", &action, &e))
}

async fn audio(client: &LumaClient, args: &AddAudioArgs, api_key: Option<&str>) -> Result<String> {
    let id = require(&args.generation_id, "generation_id")?;
    let prompt = require_for(&args.prompt, "prompt", "audio generation")?;

    let body = AudioRequest {
        prompt: prompt.to_string(),
        negative_prompt: present(&args.negative_prompt).map(String::from),
        callback_url: present(&args.callback_url).map(String::from),
    };
    let reply = client
        .post(&format!("generations/{id}/audio"), api_key, &body)
        .await?;

    if !reply.is_object() {
        warn!(%reply, "unexpected add_audio response format");
        return Ok(format!(
            "Audio generation initiated for generation {id}. Response: {reply}"
        ));
    }
    let gen = expect_generation(&reply)?;

    let mut output = vec![
        format!("Audio generation initiated for generation {}", gen.id.as_deref().unwrap_or(id)),
        format!("Status: {}", gen.state_with_reason("Processing")),
        format!("Created at: {}", gen.created_at.as_deref().unwrap_or("Unknown")),
        format!("Model: {}", gen.model.as_deref().unwrap_or("Unknown")),
        format!("Prompt: {prompt}"),
    ];
    if let Some(negative) = &body.negative_prompt {
        output.push(format!("Negative prompt: {negative}"));
    }
    let mut assets = video_asset_lines(&gen);
    if let Some(url) = gen.asset("audio") {
        assets.push(format!("Audio URL: {url}"));
    }
    push_assets(&mut output, assets);
    Ok(output.join("\n"))
}
