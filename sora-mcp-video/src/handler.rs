//! Video tool handler for the Sora MCP server.
//!
//! This module provides the `VideoHandler` struct and the parameter and result
//! types of the seven video tools. Each operation is a thin adapter over one or
//! two [`SoraClient`] calls; failures are returned as [`Error`] and rendered
//! into error-flagged tool results by the server layer.

use crate::client::{
    ContentVariant, CreateVideoRequest, InputReference, ListOrder, ListVideosQuery, SoraClient,
    VideoJob,
};
use crate::storage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sora_mcp_common::config::Config;
use sora_mcp_common::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Default model for video creation.
pub const DEFAULT_MODEL: &str = "sora-2";

/// Default clip duration in seconds.
pub const DEFAULT_SECONDS: &str = "4";

/// Default resolution (portrait).
pub const DEFAULT_SIZE: &str = "720x1280";

/// Default page size for listing videos.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Create-video parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateVideoParams {
    /// Text prompt describing the video to generate.
    pub prompt: String,

    /// Model to use: "sora-2" or "sora-2-pro".
    /// Defaults to "sora-2".
    #[serde(default = "default_model")]
    pub model: String,

    /// Duration of the video in seconds, e.g. "4", "8" or "12".
    #[serde(default = "default_seconds")]
    pub seconds: String,

    /// Resolution formatted as WIDTHxHEIGHT, e.g. "720x1280" or "1280x720".
    #[serde(default = "default_size")]
    pub size: String,

    /// Optional reference image or video guiding generation.
    /// A path to an existing local file is uploaded; any other value is
    /// forwarded to the API as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_reference: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_seconds() -> String {
    DEFAULT_SECONDS.to_string()
}

fn default_size() -> String {
    DEFAULT_SIZE.to_string()
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

/// Remix-video parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RemixVideoParams {
    /// ID of the completed video to remix.
    pub video_id: String,

    /// Prompt describing the changes to apply.
    pub prompt: String,
}

/// Parameters of tools that act on a single video.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct VideoIdParams {
    /// ID of the video.
    pub video_id: String,
}

/// List-videos parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ListVideosParams {
    /// Number of videos to return. Defaults to 20.
    #[serde(default = "default_list_limit")]
    pub limit: u32,

    /// Cursor for pagination: ID of the last video from the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// Sort order by creation time: "asc" or "desc". Defaults to "desc".
    #[serde(default)]
    pub order: ListOrder,
}

impl From<ListVideosParams> for ListVideosQuery {
    fn from(params: ListVideosParams) -> Self {
        ListVideosQuery {
            limit: params.limit,
            after: params.after,
            order: params.order,
        }
    }
}

/// Download-link parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DownloadLinkParams {
    /// ID of the video.
    pub video_id: String,

    /// Asset to download: "video", "thumbnail" or "spritesheet".
    /// Defaults to the video itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ContentVariant>,
}

/// Save-video parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SaveVideoParams {
    /// ID of the completed video to save.
    pub video_id: String,

    /// Directory to save into. Defaults to the server's configured output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// File name to save as. Defaults to "{video_id}.mp4".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Result of the download-link tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLinkResult {
    /// ID of the video
    pub video_id: String,
    /// Whether the content can be downloaded now
    pub ready: bool,
    /// Current job status
    pub status: String,
    /// Completion percentage, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Authenticated content URL; empty when not ready
    pub download_url: String,
    /// Ready-to-run curl command; empty when not ready
    pub curl_command: String,
    /// Human-readable summary
    pub message: String,
}

/// Result of the save-video tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveVideoResult {
    /// ID of the video
    pub video_id: String,
    /// Whether a file was written
    pub saved: bool,
    /// Current job status
    pub status: String,
    /// Absolute path of the written file; empty when nothing was saved
    pub file_path: String,
    /// Number of bytes written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Human-readable summary
    pub message: String,
}

/// Video tool handler.
pub struct VideoHandler {
    /// Application configuration.
    pub config: Config,
    /// Sora API client.
    pub client: SoraClient,
}

impl VideoHandler {
    /// Create a new VideoHandler with the given configuration.
    #[instrument(level = "debug", name = "video_handler_new", skip_all)]
    pub fn new(config: Config) -> Self {
        debug!("Initializing VideoHandler");
        let client = SoraClient::new(config.api_key.clone());
        Self { config, client }
    }

    /// Create a new VideoHandler with a provided client (for testing).
    pub fn with_client(config: Config, client: SoraClient) -> Self {
        Self { config, client }
    }

    /// Start a new video generation job.
    ///
    /// Returns the API's job object unchanged.
    #[instrument(level = "info", name = "create_video", skip(self, params), fields(model = %params.model, size = %params.size))]
    pub async fn create_video(&self, params: CreateVideoParams) -> Result<Value, Error> {
        let input_reference = match params.input_reference.as_deref() {
            Some(reference) => Some(resolve_input_reference(reference).await?),
            None => None,
        };

        let job = self
            .client
            .create_video(CreateVideoRequest {
                model: params.model,
                prompt: params.prompt,
                seconds: params.seconds,
                size: params.size,
                input_reference,
            })
            .await?;

        info!(video_id = ?job.get("id"), "Created video job");
        Ok(job)
    }

    /// Start a remix of an existing video.
    #[instrument(level = "info", name = "remix_video", skip(self, params), fields(video_id = %params.video_id))]
    pub async fn remix_video(&self, params: RemixVideoParams) -> Result<Value, Error> {
        let job = self.client.remix_video(&params.video_id, &params.prompt).await?;
        info!(remix_id = ?job.get("id"), "Created remix job");
        Ok(job)
    }

    /// Fetch the current state of a video job.
    #[instrument(level = "debug", name = "get_video_status", skip(self, params), fields(video_id = %params.video_id))]
    pub async fn get_video_status(&self, params: VideoIdParams) -> Result<Value, Error> {
        self.client.retrieve_video(&params.video_id).await
    }

    /// List video jobs, one page at a time.
    #[instrument(level = "debug", name = "list_videos", skip(self))]
    pub async fn list_videos(&self, params: ListVideosParams) -> Result<Value, Error> {
        self.client.list_videos(&params.into()).await
    }

    /// Describe how to download a video's content.
    ///
    /// Nothing is downloaded. When the job is not completed the result is a
    /// successful not-ready report rather than an error.
    #[instrument(level = "debug", name = "download_link", skip(self, params), fields(video_id = %params.video_id))]
    pub async fn download_link(&self, params: DownloadLinkParams) -> Result<DownloadLinkResult, Error> {
        let job: VideoJob = self.client.retrieve_video(&params.video_id).await?;

        if !job.is_completed() {
            return Ok(DownloadLinkResult {
                video_id: params.video_id,
                ready: false,
                status: job.status.clone(),
                progress: job.progress,
                download_url: String::new(),
                curl_command: String::new(),
                message: not_ready_message(&job),
            });
        }

        let variant = params.variant.unwrap_or(ContentVariant::Video);
        let download_url = self.client.content_url(&params.video_id, params.variant);
        let curl_command = curl_command(&download_url, &params.video_id, variant);

        Ok(DownloadLinkResult {
            video_id: params.video_id,
            ready: true,
            status: job.status,
            progress: job.progress,
            download_url,
            curl_command,
            message: format!("Video is ready. Download the {} with the curl command.", variant.as_str()),
        })
    }

    /// Download a completed video and write it to local disk.
    ///
    /// Checks status first; content is only fetched for completed jobs.
    #[instrument(level = "info", name = "save_video", skip(self, params), fields(video_id = %params.video_id))]
    pub async fn save_video(&self, params: SaveVideoParams) -> Result<SaveVideoResult, Error> {
        let job: VideoJob = self
            .client
            .retrieve_video(&params.video_id)
            .await
            .map_err(|e| e.context("Failed to check video status"))?;

        if !job.is_completed() {
            return Ok(SaveVideoResult {
                video_id: params.video_id,
                saved: false,
                status: job.status.clone(),
                file_path: String::new(),
                size_bytes: None,
                message: not_ready_message(&job),
            });
        }

        let bytes = self
            .client
            .download_content(&params.video_id, None)
            .await
            .map_err(|e| e.context("Failed to download video content"))?;

        let path = self
            .write_video(&params, &bytes)
            .await
            .map_err(|e| Error::from(e).context("Failed to write video file"))?;

        info!(path = %path.display(), size_bytes = bytes.len(), "Saved video");

        let file_path = path.display().to_string();
        Ok(SaveVideoResult {
            video_id: params.video_id,
            saved: true,
            status: job.status,
            message: format!("Video saved to {}", file_path),
            file_path,
            size_bytes: Some(bytes.len() as u64),
        })
    }

    /// Delete a video job and its assets.
    ///
    /// The result starts from a local acknowledgement and is overlaid with
    /// whatever the API returned; API fields win on collision.
    #[instrument(level = "info", name = "delete_video", skip(self, params), fields(video_id = %params.video_id))]
    pub async fn delete_video(&self, params: VideoIdParams) -> Result<Value, Error> {
        let remote = self.client.delete_video(&params.video_id).await?;
        Ok(merge_delete_result(&params.video_id, remote))
    }

    async fn write_video(&self, params: &SaveVideoParams, bytes: &[u8]) -> std::io::Result<std::path::PathBuf> {
        let dir = storage::resolve_output_dir(params.output_path.as_deref(), &self.config.output_dir)?;
        let filename = storage::resolve_filename(params.filename.as_deref(), &params.video_id)?;
        storage::write_file(&dir, &filename, bytes).await
    }
}

/// Turn an `input_reference` argument into an upload.
///
/// An existing regular file becomes a file part; anything else is forwarded
/// as text.
async fn resolve_input_reference(reference: &str) -> Result<InputReference, Error> {
    let path = Path::new(reference);
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);

    if !is_file {
        debug!("input_reference is not a local file, sending as text");
        return Ok(InputReference::Text(reference.to_string()));
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::from(e).context(format!("Failed to read input reference {}", reference)))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("input_reference")
        .to_string();

    debug!(file_name = %file_name, size_bytes = data.len(), "Uploading input reference");
    Ok(InputReference::File {
        mime_type: storage::mime_type_for_path(path).to_string(),
        file_name,
        data,
    })
}

fn not_ready_message(job: &VideoJob) -> String {
    match job.progress {
        Some(progress) => format!(
            "Video is not ready yet. Current status: {} ({}% complete)",
            job.status, progress
        ),
        None => format!("Video is not ready yet. Current status: {}", job.status),
    }
}

/// Build a curl command for an authenticated download.
///
/// The credential is referenced through the environment rather than inlined.
fn curl_command(url: &str, video_id: &str, variant: ContentVariant) -> String {
    format!(
        "curl -L \"{}\" -H \"Authorization: Bearer ${}\" -o \"{}.{}\"",
        url,
        sora_mcp_common::config::API_KEY_VAR,
        video_id,
        variant.file_extension()
    )
}

fn merge_delete_result(video_id: &str, remote: Value) -> Value {
    let mut result = Map::new();
    result.insert("id".to_string(), Value::String(video_id.to_string()));
    result.insert("deleted".to_string(), Value::Bool(true));
    result.insert(
        "message".to_string(),
        Value::String(format!("Video {} deleted successfully", video_id)),
    );

    if let Value::Object(remote) = remote {
        result.extend(remote);
    }
    Value::Object(result)
}
