//! MCP Server implementation for the Sora server.
//!
//! This module provides the MCP server handler that exposes:
//! - `create-video` and `remix-video` to start generation jobs
//! - `get-video-status` and `list-videos` to inspect jobs
//! - `download-video` and `save-video` to retrieve finished content
//! - `delete-video` to remove a job
//! - The `video://{video_id}` status resource template

use crate::handler::{
    CreateVideoParams, DownloadLinkParams, ListVideosParams, RemixVideoParams, SaveVideoParams,
    VideoHandler, VideoIdParams,
};
use crate::client::VideoJob;
use crate::resources;
use rmcp::{
    model::{
        CallToolResult, Implementation, JsonObject, ListResourceTemplatesResult,
        ListResourcesResult, ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
        Tool,
    },
    ErrorData as McpError, ServerHandler,
};
use schemars::{JsonSchema, schema_for};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sora_mcp_common::config::Config;
use sora_mcp_common::error::Error;
use sora_mcp_common::response::{error_result, json_result};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name the server reports during initialization.
pub const SERVER_NAME: &str = "sora-mcp-server";

/// Tool names.
pub const CREATE_VIDEO: &str = "create-video";
pub const REMIX_VIDEO: &str = "remix-video";
pub const GET_VIDEO_STATUS: &str = "get-video-status";
pub const LIST_VIDEOS: &str = "list-videos";
pub const DOWNLOAD_VIDEO: &str = "download-video";
pub const SAVE_VIDEO: &str = "save-video";
pub const DELETE_VIDEO: &str = "delete-video";

/// MCP Server for Sora video generation.
#[derive(Clone)]
pub struct SoraServer {
    handler: Arc<VideoHandler>,
}

impl SoraServer {
    /// Create a new SoraServer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self::with_handler(VideoHandler::new(config))
    }

    /// Create a server around an existing handler (for testing).
    pub fn with_handler(handler: VideoHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// The resource templates advertised by `resources/templates/list`.
    pub fn resource_templates() -> ListResourceTemplatesResult {
        ListResourceTemplatesResult {
            resource_templates: vec![resources::video_status_template()],
            next_cursor: None,
            meta: None,
        }
    }

    /// Declarations of every tool, in listing order.
    pub fn tool_definitions() -> Vec<Tool> {
        let job_schema = Some(schema_object::<VideoJob>());

        vec![
            tool(
                CREATE_VIDEO,
                "Create Video",
                "Generate a video using the OpenAI Sora 2 API. Returns a job object; \
                 poll get-video-status until it is completed.",
                schema_object::<CreateVideoParams>(),
                job_schema.clone(),
            ),
            tool(
                REMIX_VIDEO,
                "Remix Video",
                "Create a remix of an existing completed video using the OpenAI Sora 2 API.",
                schema_object::<RemixVideoParams>(),
                job_schema.clone(),
            ),
            tool(
                GET_VIDEO_STATUS,
                "Get Video Status",
                "Get the status and details of a video generation job.",
                schema_object::<VideoIdParams>(),
                job_schema,
            ),
            tool(
                LIST_VIDEOS,
                "List Videos",
                "List video generation jobs with cursor pagination.",
                schema_object::<ListVideosParams>(),
                None,
            ),
            tool(
                DOWNLOAD_VIDEO,
                "Get Download Link",
                "Get the download URL and a ready-to-run curl command for a completed video. \
                 Reports readiness instead when the video is still being generated.",
                schema_object::<DownloadLinkParams>(),
                None,
            ),
            tool(
                SAVE_VIDEO,
                "Save Video",
                "Download a completed video and save it to the local filesystem. \
                 Returns the absolute path of the saved file.",
                schema_object::<SaveVideoParams>(),
                None,
            ),
            tool(
                DELETE_VIDEO,
                "Delete Video",
                "Delete a video job and its generated assets.",
                schema_object::<VideoIdParams>(),
                None,
            ),
        ]
    }

    /// Route one tool invocation to its adapter.
    ///
    /// Adapter failures come back as error-flagged results. Only malformed
    /// arguments and unknown tool names are protocol errors.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let handler = &self.handler;

        let result = match name {
            CREATE_VIDEO => {
                let params: CreateVideoParams = parse_arguments(arguments)?;
                info!(model = %params.model, "Creating video");
                into_tool_result(handler.create_video(params).await, "Error creating video")
            }
            REMIX_VIDEO => {
                let params: RemixVideoParams = parse_arguments(arguments)?;
                info!(video_id = %params.video_id, "Remixing video");
                into_tool_result(handler.remix_video(params).await, "Error remixing video")
            }
            GET_VIDEO_STATUS => {
                let params: VideoIdParams = parse_arguments(arguments)?;
                info!(video_id = %params.video_id, "Fetching video status");
                into_tool_result(
                    handler.get_video_status(params).await,
                    "Error fetching video status",
                )
            }
            LIST_VIDEOS => {
                let params: ListVideosParams = parse_arguments(arguments)?;
                info!(limit = params.limit, order = params.order.as_str(), "Listing videos");
                into_tool_result(handler.list_videos(params).await, "Error listing videos")
            }
            DOWNLOAD_VIDEO => {
                let params: DownloadLinkParams = parse_arguments(arguments)?;
                info!(video_id = %params.video_id, "Building download link");
                into_tool_result(
                    handler.download_link(params).await,
                    "Error getting download link",
                )
            }
            SAVE_VIDEO => {
                let params: SaveVideoParams = parse_arguments(arguments)?;
                info!(video_id = %params.video_id, "Saving video");
                into_tool_result(handler.save_video(params).await, "Error saving video")
            }
            DELETE_VIDEO => {
                let params: VideoIdParams = parse_arguments(arguments)?;
                info!(video_id = %params.video_id, "Deleting video");
                into_tool_result(handler.delete_video(params).await, "Error deleting video")
            }
            _ => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", name),
                    None,
                ));
            }
        };

        Ok(result)
    }
}

fn tool(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    input_schema: Arc<JsonObject>,
    output_schema: Option<Arc<JsonObject>>,
) -> Tool {
    Tool {
        name: Cow::Borrowed(name),
        description: Some(Cow::Borrowed(description)),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema,
        title: Some(title.into()),
    }
}

/// JSON schema of `T` as a JSON object.
fn schema_object<T: JsonSchema>() -> Arc<JsonObject> {
    match serde_json::to_value(schema_for!(T)) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

/// Decode tool arguments; absent arguments decode as an empty object.
fn parse_arguments<T: DeserializeOwned>(arguments: Option<JsonObject>) -> Result<T, McpError> {
    let value = Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value)
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))
}

/// Render an adapter outcome as a tool result envelope.
fn into_tool_result<T: Serialize>(result: Result<T, Error>, failure: &str) -> CallToolResult {
    let payload = result.and_then(|payload| {
        serde_json::to_value(payload)
            .map_err(|e| Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    });

    match payload {
        Ok(payload) => json_result(payload),
        Err(e) => {
            warn!(error = %e, "{}", failure);
            error_result(format!("{}: {}", failure, e))
        }
    }
}

impl ServerHandler for SoraServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Video generation server for the OpenAI Sora API. \
                 Use create-video or remix-video to start a job, get-video-status to poll it, \
                 then download-video or save-video once it is completed. \
                 Status is also readable as the video://{video_id} resource."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(rmcp::model::ListToolsResult {
                tools: Self::tool_definitions(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(params.name.as_ref(), params.arguments).await }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            // Video resources are only reachable through the template.
            Ok(ListResourcesResult {
                resources: Vec::new(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn list_resource_templates(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resource templates");
            Ok(Self::resource_templates())
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParams,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let video_id = resources::parse_video_uri(uri).ok_or_else(|| {
                McpError::resource_not_found(format!("Unknown resource: {}", uri), None)
            })?;
            let content = resources::read_video_status(&self.handler, video_id).await;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, uri.clone())],
            })
        }
    }
}
