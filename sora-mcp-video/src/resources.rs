//! MCP Resources for the Sora server.
//!
//! This module provides the `video://{video_id}` resource template: reading a
//! resource fetches the current status of that video job.

use crate::handler::{VideoHandler, VideoIdParams};
use rmcp::model::{AnnotateAble, RawResourceTemplate, ResourceTemplate};
use tracing::warn;

/// URI scheme prefix of video status resources.
pub const VIDEO_URI_PREFIX: &str = "video://";

/// URI template advertised to clients.
pub const VIDEO_URI_TEMPLATE: &str = "video://{video_id}";

/// Build the URI of a video's status resource.
pub fn video_uri(video_id: &str) -> String {
    format!("{}{}", VIDEO_URI_PREFIX, video_id)
}

/// Extract the video id from a `video://{video_id}` URI.
///
/// Returns `None` for other schemes, an empty id, or an id with a path segment.
pub fn parse_video_uri(uri: &str) -> Option<&str> {
    let id = uri.strip_prefix(VIDEO_URI_PREFIX)?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id)
}

/// The video status resource template.
pub fn video_status_template() -> ResourceTemplate {
    RawResourceTemplate {
        uri_template: VIDEO_URI_TEMPLATE.to_string(),
        name: "video-status".to_string(),
        title: Some("Video Status".to_string()),
        description: Some("Get the status and details of a video generation job".to_string()),
        mime_type: Some("application/json".to_string()),
        icons: None,
    }
    .no_annotation()
}

/// Read a video status resource as text.
///
/// Upstream failures are reported in the text itself rather than as a
/// protocol error.
pub async fn read_video_status(handler: &VideoHandler, video_id: &str) -> String {
    let params = VideoIdParams {
        video_id: video_id.to_string(),
    };

    match handler.get_video_status(params).await {
        Ok(job) => serde_json::to_string_pretty(&job).unwrap_or_else(|_| job.to_string()),
        Err(e) => {
            warn!(video_id = %video_id, error = %e, "Failed to read video status resource");
            format!("Error fetching video status: {}", e)
        }
    }
}
