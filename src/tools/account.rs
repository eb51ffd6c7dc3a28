use serde_json::Value;
use tracing::warn;

use super::failure;
use crate::luma::types::{CameraMotionList, CreditBalance};
use crate::luma::LumaClient;

fn is_blank(reply: &Value) -> bool {
    match reply {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// GET ping
pub async fn ping(client: &LumaClient, api_key: Option<&str>) -> String {
    match client.get("ping", api_key).await {
        Ok(reply) if is_blank(&reply) => "Luma API is available and responding".into(),
        Ok(reply) => format!("Luma API is available and responding: {reply}"),
        Err(e) => failure("ping", "pinging Luma API", &e),
    }
}

/// GET credits
pub async fn get_credits(client: &LumaClient, api_key: Option<&str>) -> String {
    let reply = match client.get("credits", api_key).await {
        Ok(reply) => reply,
        Err(e) => return failure("get_credits", "retrieving credit information", &e),
    };
    let Some(map) = reply.as_object() else {
        warn!(%reply, "unexpected get_credits response format");
        return format!("Credit Information: {reply}");
    };

    match CreditBalance::decode(map) {
        CreditBalance::Balance(balance) => {
            format!("Credit Information:\nAvailable Credits: {balance}")
        }
        CreditBalance::Breakdown {
            available,
            used,
            total,
        } => {
            let unknown = || "Unknown".to_string();
            format!(
                "Credit Information:\n\
                 Available Credits: {}\n\
                 Used Credits: {}\n\
                 Total Credits: {}",
                available.unwrap_or_else(unknown),
                used.unwrap_or_else(unknown),
                total.unwrap_or_else(unknown),
            )
        }
    }
}

/// GET generations/camera_motion/list
pub async fn get_camera_motions(client: &LumaClient, api_key: Option<&str>) -> String {
    let reply = match client.get("generations/camera_motion/list", api_key).await {
        Ok(reply) => reply,
        Err(e) => return failure("get_camera_motions", "retrieving camera motions", &e),
    };

    match CameraMotionList::decode(reply) {
        CameraMotionList::Empty => "No camera motions available".into(),
        CameraMotionList::Motions(motions) => std::iter::once("Available camera motions:".to_string())
            .chain(motions.iter().map(|m| format!("- {m}")))
            .collect::<Vec<_>>()
            .join("\n"),
        CameraMotionList::Unrecognized(keys) => {
            format!("Unexpected response format. Response contained: {keys:?}")
        }
        CameraMotionList::Unexpected(value) => format!("Unexpected response format: {value}"),
    }
}
