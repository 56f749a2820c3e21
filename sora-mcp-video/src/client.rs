//! HTTP client for the OpenAI video API.
//!
//! One method per endpoint. Every call is a single authenticated request with
//! no retry; a non-2xx status becomes [`Error::Api`] carrying the response
//! body verbatim.

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sora_mcp_common::config::SORA_API_BASE;
use sora_mcp_common::error::Error;
use tracing::{debug, instrument};

/// Sora API client.
#[derive(Clone)]
pub struct SoraClient {
    http: reqwest::Client,
    api_key: String,
    /// Base URL for the API (configurable for testing)
    base_url: String,
}

impl SoraClient {
    /// Create a client against the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, SORA_API_BASE)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the video collection.
    pub fn videos_url(&self) -> String {
        format!("{}/videos", self.base_url)
    }

    /// URL of a single video object.
    pub fn video_url(&self, video_id: &str) -> String {
        format!("{}/videos/{}", self.base_url, urlencoding::encode(video_id))
    }

    /// URL of a video's binary content, optionally for a specific variant.
    pub fn content_url(&self, video_id: &str, variant: Option<ContentVariant>) -> String {
        let url = format!("{}/content", self.video_url(video_id));
        match variant {
            Some(variant) => format!("{}?variant={}", url, variant.as_str()),
            None => url,
        }
    }

    /// `POST /videos` as multipart form data.
    #[instrument(level = "debug", name = "sora_create_video", skip_all, fields(model = %request.model))]
    pub async fn create_video(&self, request: CreateVideoRequest) -> Result<Value, Error> {
        let endpoint = self.videos_url();
        let form = request.into_form().map_err(|e| Error::request(&endpoint, e.to_string()))?;

        let response = self.send(&endpoint, self.http.post(&endpoint).multipart(form)).await?;
        parse_json(&endpoint, response).await
    }

    /// `POST /videos/{id}/remix` with a JSON `{prompt}` body.
    #[instrument(level = "debug", name = "sora_remix_video", skip(self, prompt))]
    pub async fn remix_video(&self, video_id: &str, prompt: &str) -> Result<Value, Error> {
        let endpoint = format!("{}/remix", self.video_url(video_id));
        let body = RemixRequest { prompt };

        let response = self.send(&endpoint, self.http.post(&endpoint).json(&body)).await?;
        parse_json(&endpoint, response).await
    }

    /// `GET /videos/{id}`, decoded into `T`.
    ///
    /// Use `Value` to relay the object untouched or [`VideoJob`] to inspect it.
    #[instrument(level = "debug", name = "sora_retrieve_video", skip(self))]
    pub async fn retrieve_video<T: DeserializeOwned>(&self, video_id: &str) -> Result<T, Error> {
        let endpoint = self.video_url(video_id);
        let response = self.send(&endpoint, self.http.get(&endpoint)).await?;
        parse_json(&endpoint, response).await
    }

    /// `GET /videos` with `limit`, `order` and, when present, `after`.
    #[instrument(level = "debug", name = "sora_list_videos", skip(self))]
    pub async fn list_videos(&self, query: &ListVideosQuery) -> Result<Value, Error> {
        let endpoint = self.videos_url();
        let request = self.http.get(&endpoint).query(&query.to_pairs());

        let response = self.send(&endpoint, request).await?;
        parse_json(&endpoint, response).await
    }

    /// `GET /videos/{id}/content`, returning the raw bytes.
    #[instrument(level = "debug", name = "sora_download_content", skip(self))]
    pub async fn download_content(
        &self,
        video_id: &str,
        variant: Option<ContentVariant>,
    ) -> Result<Vec<u8>, Error> {
        let endpoint = self.content_url(video_id, variant);
        let response = self.send(&endpoint, self.http.get(&endpoint)).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::request(&endpoint, format!("Failed to read response body: {}", e)))?;
        debug!(size_bytes = bytes.len(), "Downloaded video content");
        Ok(bytes.to_vec())
    }

    /// `DELETE /videos/{id}`.
    ///
    /// An empty response body is accepted and returned as an empty object.
    #[instrument(level = "debug", name = "sora_delete_video", skip(self))]
    pub async fn delete_video(&self, video_id: &str) -> Result<Value, Error> {
        let endpoint = self.video_url(video_id);
        let response = self.send(&endpoint, self.http.delete(&endpoint)).await?;
        let status = response.status().as_u16();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::request(&endpoint, format!("Failed to read response body: {}", e)))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_slice(&body)
            .map_err(|e| Error::api(&endpoint, status, format!("Failed to parse response: {}", e)))
    }

    /// Attach credentials, send, and turn non-2xx statuses into errors.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, Error> {
        debug!(endpoint = %endpoint, "Calling Sora API");

        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::request(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response.text().await);
            return Err(Error::api(endpoint, status.as_u16(), body));
        }
        Ok(response)
    }
}

/// Message for a non-2xx response: the body verbatim, or why it could not be read.
fn error_body<E: std::fmt::Display>(read: Result<String, E>) -> String {
    match read {
        Ok(body) => body,
        Err(e) => format!("<failed to read response body: {}>", e),
    }
}

async fn parse_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, Error> {
    let status = response.status().as_u16();
    response
        .json()
        .await
        .map_err(|e| Error::api(endpoint, status, format!("Failed to parse response: {}", e)))
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// Fields of a `POST /videos` request.
#[derive(Debug, Clone)]
pub struct CreateVideoRequest {
    /// Model id, e.g. `sora-2`
    pub model: String,
    /// Text prompt
    pub prompt: String,
    /// Clip duration in seconds, as the API expects it (a string)
    pub seconds: String,
    /// Resolution formatted as `WIDTHxHEIGHT`
    pub size: String,
    /// Optional reference image or video
    pub input_reference: Option<InputReference>,
}

impl CreateVideoRequest {
    fn into_form(self) -> Result<Form, reqwest::Error> {
        let form = Form::new()
            .text("model", self.model)
            .text("prompt", self.prompt)
            .text("seconds", self.seconds)
            .text("size", self.size);

        Ok(match self.input_reference {
            None => form,
            Some(InputReference::Text(value)) => form.text("input_reference", value),
            Some(InputReference::File {
                file_name,
                mime_type,
                data,
            }) => {
                let part = Part::bytes(data).file_name(file_name).mime_str(&mime_type)?;
                form.part("input_reference", part)
            }
        })
    }
}

/// Reference attachment for video creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputReference {
    /// A local file uploaded as a multipart file part
    File {
        /// File name reported in the part's content disposition
        file_name: String,
        /// MIME type of the part
        mime_type: String,
        /// File contents
        data: Vec<u8>,
    },
    /// Any other value, forwarded as a plain text field
    Text(String),
}

#[derive(Debug, Serialize)]
struct RemixRequest<'a> {
    prompt: &'a str,
}

/// Sort order for listing videos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl ListOrder {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}

/// Query parameters for `GET /videos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVideosQuery {
    /// Page size
    pub limit: u32,
    /// Cursor: id of the last video from the previous page
    pub after: Option<String>,
    /// Sort order by creation time
    pub order: ListOrder,
}

impl ListVideosQuery {
    /// Query pairs in request order; `after` only appears when set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        pairs.push(("order", self.order.as_str().to_string()));
        pairs
    }
}

/// Downloadable asset of a completed video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentVariant {
    /// The MP4 video itself
    Video,
    /// A WebP still image
    Thumbnail,
    /// A JPEG sprite sheet of frames
    Spritesheet,
}

impl ContentVariant {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentVariant::Video => "video",
            ContentVariant::Thumbnail => "thumbnail",
            ContentVariant::Spritesheet => "spritesheet",
        }
    }

    /// File extension of the downloaded asset.
    pub fn file_extension(&self) -> &'static str {
        match self {
            ContentVariant::Video => "mp4",
            ContentVariant::Thumbnail => "webp",
            ContentVariant::Spritesheet => "jpg",
        }
    }
}

/// A video generation job as returned by the API.
///
/// Only used to inspect a job; tool results relay the API's JSON untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct VideoJob {
    /// Video identifier
    pub id: String,
    /// Object type, always `video`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Model that produced the video
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Job status: queued, in_progress, completed, failed
    #[serde(default)]
    pub status: String,
    /// Completion percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Unix timestamp of creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Unix timestamp of completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Unix timestamp after which content is no longer downloadable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Resolution formatted as `WIDTHxHEIGHT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Clip duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<String>,
    /// Quality tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Source video when this job is a remix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixed_from_video_id: Option<String>,
}

/// Status string of a finished, downloadable video.
pub const STATUS_COMPLETED: &str = "completed";

impl VideoJob {
    /// Whether the content endpoint can be fetched.
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    const TEST_KEY: &str = "sk-test-12345";

    async fn client_for(server: &MockServer) -> SoraClient {
        SoraClient::with_base_url(TEST_KEY, server.uri())
    }

    /// Matches requests whose raw body contains `needle`; the body need not be UTF-8.
    struct BodyHas(&'static [u8]);

    impl Match for BodyHas {
        fn matches(&self, request: &Request) -> bool {
            request.body.windows(self.0.len()).any(|window| window == self.0)
        }
    }

    #[test]
    fn test_urls() {
        let client = SoraClient::with_base_url(TEST_KEY, "https://example.test/v1/");
        assert_eq!(client.base_url(), "https://example.test/v1");
        assert_eq!(client.videos_url(), "https://example.test/v1/videos");
        assert_eq!(client.video_url("video_1"), "https://example.test/v1/videos/video_1");
        assert_eq!(
            client.content_url("video_1", None),
            "https://example.test/v1/videos/video_1/content"
        );
        assert_eq!(
            client.content_url("video_1", Some(ContentVariant::Thumbnail)),
            "https://example.test/v1/videos/video_1/content?variant=thumbnail"
        );
    }

    #[test]
    fn test_video_id_is_path_encoded() {
        let client = SoraClient::with_base_url(TEST_KEY, "https://example.test/v1");
        assert_eq!(
            client.video_url("a/b c"),
            "https://example.test/v1/videos/a%2Fb%20c"
        );
    }

    #[test]
    fn test_default_client_targets_openai() {
        let client = SoraClient::new(TEST_KEY);
        assert_eq!(client.base_url(), SORA_API_BASE);
    }

    #[test]
    fn test_list_query_pairs_without_after() {
        let query = ListVideosQuery {
            limit: 20,
            after: None,
            order: ListOrder::Desc,
        };
        assert_eq!(
            query.to_pairs(),
            vec![("limit", "20".to_string()), ("order", "desc".to_string())]
        );
    }

    #[test]
    fn test_list_query_pairs_with_after() {
        let query = ListVideosQuery {
            limit: 5,
            after: Some("video_9".to_string()),
            order: ListOrder::Asc,
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("after", "video_9".to_string())));
        assert!(pairs.contains(&("order", "asc".to_string())));
    }

    #[test]
    fn test_video_job_deserializes_api_object() {
        let job: VideoJob = serde_json::from_value(json!({
            "id": "video_123",
            "object": "video",
            "model": "sora-2",
            "status": "in_progress",
            "progress": 33,
            "created_at": 1712697600,
            "size": "720x1280",
            "seconds": "4",
            "quality": "standard"
        }))
        .unwrap();

        assert_eq!(job.id, "video_123");
        assert_eq!(job.progress, Some(33.0));
        assert!(!job.is_completed());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_video_job_without_status_is_not_completed() {
        let job: VideoJob = serde_json::from_value(json!({"id": "video_1"})).unwrap();
        assert!(!job.is_completed());
    }

    #[test]
    fn test_content_variant_extensions() {
        assert_eq!(ContentVariant::Video.file_extension(), "mp4");
        assert_eq!(ContentVariant::Thumbnail.file_extension(), "webp");
        assert_eq!(ContentVariant::Spritesheet.file_extension(), "jpg");
    }

    #[tokio::test]
    async fn test_retrieve_sends_bearer_and_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/video_123"))
            .and(header("Authorization", format!("Bearer {}", TEST_KEY)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "video_123",
                "status": "completed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let job: VideoJob = client.retrieve_video("video_123").await.unwrap();
        assert!(job.is_completed());
    }

    #[tokio::test]
    async fn test_non_2xx_keeps_status_and_body_verbatim() {
        let server = MockServer::start().await;
        let body = r#"{"error":{"message":"Invalid size '1x1'","type":"invalid_request_error"}}"#;
        Mock::given(method("GET"))
            .and(path("/videos/video_404"))
            .respond_with(ResponseTemplate::new(404).set_body_string(body))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.retrieve_video::<Value>("video_404").await.unwrap_err();

        match &err {
            Error::Api {
                status_code,
                message,
                ..
            } => {
                assert_eq!(*status_code, 404);
                assert_eq!(message, body);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_error_body_is_reported() {
        let read: Result<String, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed mid-body",
        ));
        assert_eq!(
            error_body(read),
            "<failed to read response body: connection closed mid-body>"
        );
        assert_eq!(error_body::<std::io::Error>(Ok("raw".to_string())), "raw");
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/video_1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.retrieve_video::<Value>("video_1").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_request_error() {
        // Nothing listens on port 9 of the loopback interface.
        let client = SoraClient::with_base_url(TEST_KEY, "http://127.0.0.1:9");
        let err = client.retrieve_video::<Value>("video_1").await.unwrap_err();
        assert!(matches!(err, Error::Request { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_create_sends_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/videos"))
            .and(header("Authorization", format!("Bearer {}", TEST_KEY)))
            .and(body_string_contains("name=\"model\""))
            .and(body_string_contains("sora-2-pro"))
            .and(body_string_contains("name=\"prompt\""))
            .and(body_string_contains("a cat surfing"))
            .and(body_string_contains("name=\"size\""))
            .and(body_string_contains("1280x720"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "video_new",
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let value = client
            .create_video(CreateVideoRequest {
                model: "sora-2-pro".to_string(),
                prompt: "a cat surfing".to_string(),
                seconds: "8".to_string(),
                size: "1280x720".to_string(),
                input_reference: None,
            })
            .await
            .unwrap();
        assert_eq!(value["id"], "video_new");
    }

    #[tokio::test]
    async fn test_create_uploads_file_reference_as_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/videos"))
            .and(BodyHas(b"name=\"input_reference\"; filename=\"ref.png\""))
            .and(BodyHas(b"Content-Type: image/png"))
            .and(BodyHas(b"\x89PNG\r\n\x1a\n fake"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "video_ref"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let value = client
            .create_video(CreateVideoRequest {
                model: "sora-2".to_string(),
                prompt: "p".to_string(),
                seconds: "4".to_string(),
                size: "720x1280".to_string(),
                input_reference: Some(InputReference::File {
                    file_name: "ref.png".to_string(),
                    mime_type: "image/png".to_string(),
                    data: b"\x89PNG\r\n\x1a\n fake".to_vec(),
                }),
            })
            .await
            .unwrap();
        assert_eq!(value["id"], "video_ref");
    }

    #[tokio::test]
    async fn test_remix_sends_json_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/videos/video_1/remix"))
            .and(body_json(json!({"prompt": "make it night"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "video_2",
                "remixed_from_video_id": "video_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let value = client.remix_video("video_1", "make it night").await.unwrap();
        assert_eq!(value["remixed_from_video_id"], "video_1");
    }

    #[tokio::test]
    async fn test_download_content_returns_raw_bytes() {
        let server = MockServer::start().await;
        let data = vec![0u8, 1, 2, 3, 255, 254];
        Mock::given(method("GET"))
            .and(path("/videos/video_1/content"))
            .and(query_param("variant", "spritesheet"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let bytes = client
            .download_content("video_1", Some(ContentVariant::Spritesheet))
            .await
            .unwrap();
        assert_eq!(bytes, data);
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/videos/video_1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let value = client.delete_video("video_1").await.unwrap();
        assert_eq!(value, json!({}));
    }
}
