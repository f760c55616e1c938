use mime::Mime;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use snafu::{OptionExt, ResultExt, Snafu};
use std::{fmt, sync::Arc};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    files::{File, FileBuilder, UploadRequest, UploadResponse},
    generation::{ContentBuilder, GenerateContentRequest, GenerationResponse},
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

const DEFAULT_API_VERSION: &str = "v1beta";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to build HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("response is missing the '{header}' header"))]
    MissingResponseHeader { header: String },

    #[snafu(display("upload session URL '{value}' is invalid"))]
    InvalidUploadUrl {
        source: url::ParseError,
        value: String,
    },

    #[snafu(display("failed to decode response body"))]
    Decode { source: reqwest::Error },
}

/// Gemini model identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Model {
    #[default]
    Gemini15Pro,
    Gemini25Flash,
    Gemini25Pro,
    /// Any other model, as a full `models/...` resource name.
    Custom(String),
}

impl Model {
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini15Pro => "models/gemini-1.5-pro",
            Model::Gemini25Flash => "models/gemini-2.5-flash",
            Model::Gemini25Pro => "models/gemini-2.5-pro",
            Model::Custom(model) => model,
        }
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        if model.starts_with("models/") {
            Model::Custom(model)
        } else {
            Model::Custom(format!("models/{model}"))
        }
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::from(model.to_string())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal client for making requests to the Gemini API
pub(crate) struct GeminiClient {
    http_client: Client,
    pub model: Model,
    base_url: Url,
}

impl GeminiClient {
    /// Create a new client with custom base URL
    fn with_base_url<K: AsRef<str>, M: Into<Model>>(
        api_key: K,
        model: M,
        base_url: Url,
    ) -> Result<Self, Error> {
        let mut api_key = HeaderValue::from_str(api_key.as_ref()).context(InvalidApiKeySnafu)?;
        api_key.set_sensitive(true);
        let headers = HeaderMap::from_iter([(HeaderName::from_static("x-goog-api-key"), api_key)]);

        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .context(BuildHttpClientSnafu)?;

        Ok(Self {
            http_client,
            model: model.into(),
            base_url,
        })
    }

    /// Generate content
    #[instrument(skip_all, fields(model = %model))]
    pub(crate) async fn generate_content_raw(
        &self,
        model: &Model,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(model, "generateContent")?;
        let response = self
            .perform_request(self.http_client.post(url.clone()).json(&request), url)
            .await?;
        let response: GenerationResponse = Self::decode(response).await?;

        debug!(
            candidates = response.candidates.len(),
            model.version = response.model_version.as_deref(),
            "generation response received"
        );
        Ok(response)
    }

    /// Upload a file using the resumable upload protocol.
    ///
    /// The first request opens an upload session and returns its URL in a
    /// response header; the second sends the bytes and finalizes the session.
    #[instrument(skip_all, fields(
        file.size = file_bytes.len(),
        mime.type = %mime_type,
    ))]
    pub(crate) async fn upload_file(
        &self,
        display_name: Option<String>,
        file_bytes: Vec<u8>,
        mime_type: Mime,
    ) -> Result<File, Error> {
        let url = self.build_upload_url()?;
        let metadata = UploadRequest::new(display_name.as_deref());
        let start = self
            .http_client
            .post(url.clone())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header(
                "X-Goog-Upload-Header-Content-Length",
                file_bytes.len().to_string(),
            )
            .header("X-Goog-Upload-Header-Content-Type", mime_type.to_string())
            .json(&metadata);
        let response = self.perform_request(start, url).await?;

        let session_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .context(MissingResponseHeaderSnafu {
                header: UPLOAD_URL_HEADER,
            })?;
        let session_url = Url::parse(session_url).context(InvalidUploadUrlSnafu {
            value: session_url,
        })?;
        debug!("upload session opened");

        let finalize = self
            .http_client
            .post(session_url.clone())
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(file_bytes);
        let response = self.perform_request(finalize, session_url).await?;
        let response: UploadResponse = Self::decode(response).await?;

        debug!(file.name = %response.file.name, "upload finalized");
        Ok(response.file)
    }

    /// Send a request and turn non-success statuses into `BadResponse`.
    async fn perform_request(&self, request: RequestBuilder, url: Url) -> Result<Response, Error> {
        let response = request.send().await.context(PerformRequestSnafu { url })?;

        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            return BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail();
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        response.json().await.context(DecodeSnafu)
    }

    /// Build a URL for a model endpoint
    fn build_url(&self, model: &Model, endpoint: &str) -> Result<Url, Error> {
        let suffix = format!("{model}:{endpoint}");
        self.base_url
            .join(&suffix)
            .context(ConstructUrlSnafu { suffix })
    }

    /// Build the URL that opens upload sessions.
    ///
    /// Uploads live under `upload/<version>/files` next to the versioned API
    /// root, so any path prefix in front of the version is preserved.
    fn build_upload_url(&self) -> Result<Url, Error> {
        let version = self
            .base_url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or(DEFAULT_API_VERSION);
        let suffix = format!("../upload/{version}/files");
        self.base_url
            .join(&suffix)
            .context(ConstructUrlSnafu { suffix })
    }
}

/// Client for the Gemini API
///
/// Cloning is cheap; all clones share one connection pool. The pool is
/// released when the last clone is dropped.
#[derive(Clone)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key
    pub fn new<K: AsRef<str>>(api_key: K) -> Result<Self, Error> {
        Self::with_model(api_key, Model::default())
    }

    /// Create a new client with the specified API key and model
    pub fn with_model<K: AsRef<str>, M: Into<Model>>(api_key: K, model: M) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(ConstructUrlSnafu {
            suffix: DEFAULT_BASE_URL,
        })?;
        Self::with_model_and_base_url(api_key, model, base_url)
    }

    /// Create a new client with the specified API key, model, and base URL
    pub fn with_model_and_base_url<K: AsRef<str>, M: Into<Model>>(
        api_key: K,
        model: M,
        base_url: Url,
    ) -> Result<Self, Error> {
        let client = GeminiClient::with_base_url(api_key, model, base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }

    /// Start building a file upload
    pub fn create_file<B: Into<Vec<u8>>>(&self, bytes: B) -> FileBuilder {
        FileBuilder::new(self.client.clone(), bytes)
    }
}
