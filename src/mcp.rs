use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData, ServerHandler,
};
use tracing::debug;

use crate::luma::LumaClient;
use crate::tools::{
    self, AddAudioArgs, CreateGenerationArgs, GenerateImageArgs, GenerationIdArgs,
    ListGenerationsArgs, UpscaleGenerationArgs,
};

fn text(reply: String) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::text(reply)]))
}

// ---------------------------------------------------------------------------
// MCP Server
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LumaMcp {
    client: LumaClient,
    tool_router: ToolRouter<Self>,
}

impl LumaMcp {
    pub fn new(client: LumaClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl LumaMcp {
    #[tool(description = "Check if the Luma API is running")]
    async fn ping(&self) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "ping", "tool call");
        text(tools::ping(&self.client, None).await)
    }

    #[tool(description = "Creates a new video generation from text, image, or existing video. \
        Models: ray-2 (default). Resolutions: 540p, 720p, 1080p, 4k. Durations: 5s or 9s. \
        Keyframes: frame0 (start) and/or frame1 (end), each {\"type\":\"image\",\"url\":...} \
        or {\"type\":\"generation\",\"id\":...}.")]
    async fn create_generation(
        &self,
        Parameters(args): Parameters<CreateGenerationArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "create_generation", ?args, "tool call");
        text(tools::create_generation(&self.client, args, None).await)
    }

    #[tool(description = "Gets the status of a generation")]
    async fn get_generation(
        &self,
        Parameters(args): Parameters<GenerationIdArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "get_generation", ?args, "tool call");
        text(tools::get_generation(&self.client, args, None).await)
    }

    #[tool(description = "Lists all generations")]
    async fn list_generations(
        &self,
        Parameters(args): Parameters<ListGenerationsArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "list_generations", ?args, "tool call");
        text(tools::list_generations(&self.client, args, None).await)
    }

    #[tool(description = "Deletes a generation")]
    async fn delete_generation(
        &self,
        Parameters(args): Parameters<GenerationIdArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "delete_generation", ?args, "tool call");
        text(tools::delete_generation(&self.client, args, None).await)
    }

    #[tool(description = "Upscales a video generation to higher resolution. \
        The target resolution must be higher than the original.")]
    async fn upscale_generation(
        &self,
        Parameters(args): Parameters<UpscaleGenerationArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "upscale_generation", ?args, "tool call");
        text(tools::upscale_generation(&self.client, args, None).await)
    }

    #[tool(description = "Adds audio to a video generation")]
    async fn add_audio(
        &self,
        Parameters(args): Parameters<AddAudioArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "add_audio", ?args, "tool call");
        text(tools::add_audio(&self.client, args, None).await)
    }

    #[tool(description = "Generates an image from a text prompt. \
        Models: photon-1 (default), photon-flash-1.")]
    async fn generate_image(
        &self,
        Parameters(args): Parameters<GenerateImageArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "generate_image", ?args, "tool call");
        text(tools::generate_image(&self.client, args, None).await)
    }

    #[tool(description = "Gets credit information for the current user")]
    async fn get_credits(&self) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "get_credits", "tool call");
        text(tools::get_credits(&self.client, None).await)
    }

    #[tool(description = "Gets all supported camera motions")]
    async fn get_camera_motions(&self) -> Result<CallToolResult, ErrorData> {
        debug!(tool = "get_camera_motions", "tool call");
        text(tools::get_camera_motions(&self.client, None).await)
    }
}

#[tool_handler]
impl ServerHandler for LumaMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Server instructions: injected as domain knowledge for AI clients
// ---------------------------------------------------------------------------

const SERVER_INSTRUCTIONS: &str = "\
Luma Dream Machine MCP server for video and image generation.

# Workflow

1. Call create_generation (video) or generate_image (image). Both return a generation ID immediately.
2. Generation runs upstream; call get_generation with the ID until the state is completed or failed.
3. Completed videos can be upscaled (upscale_generation) to a higher resolution or given audio (add_audio).
4. Use list_generations to browse earlier work and delete_generation to remove it.

# Keyframes

- frame0 only, image: start the video from that image.
- frame1 only, image: end the video on that image.
- frame0 generation: extend an existing video.
- frame1 generation alone: reverse-extend into an existing video.
- frame0 + frame1 generations: interpolate between two videos.

# Limits

- Durations: only 5s and 9s are accepted.
- Upscale targets must be higher than the source resolution.
- Check get_credits before long batches; get_camera_motions lists camera presets usable in prompts.
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::luma::testing::MockTransport;
    use serde_json::json;

    fn reply_text(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).expect("serialize");
        value["content"][0]["text"].as_str().expect("text content").to_string()
    }

    #[test]
    fn router_exposes_every_tool() {
        let server = LumaMcp::new(MockTransport::new().client());
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "add_audio",
                "create_generation",
                "delete_generation",
                "generate_image",
                "get_camera_motions",
                "get_credits",
                "get_generation",
                "list_generations",
                "ping",
                "upscale_generation",
            ]
        );
    }

    #[test]
    fn info_enables_tools() {
        let server = LumaMcp::new(MockTransport::new().client());
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("create_generation"));
    }

    #[tokio::test]
    async fn tool_call_returns_handler_text() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"credit_balance": 12}));
        let server = LumaMcp::new(mock.client());

        let result = server.get_credits().await.unwrap();
        assert_eq!(reply_text(&result), "Credit Information:\nAvailable Credits: 12");
    }

    #[tokio::test]
    async fn missing_argument_is_text_not_protocol_error() {
        let mock = MockTransport::new();
        let server = LumaMcp::new(mock.client());

        let args: GenerationIdArgs = serde_json::from_value(json!({})).unwrap();
        let result = server.get_generation(Parameters(args)).await.unwrap();
        assert_eq!(
            reply_text(&result),
            "Error getting generation: generation_id parameter is required"
        );
        assert!(mock.requests().is_empty());
    }
}
