use mime::Mime;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use time::OffsetDateTime;
use url::Url;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("file '{name}' metadata is missing the {field}"))]
    IncompleteMetadata { name: String, field: &'static str },
}

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// The default value. Used if the state is omitted.
    StateUnspecified,
    /// File is being processed and cannot be used for inference yet.
    Processing,
    /// File is processed and available for inference.
    Active,
    /// File failed processing.
    Failed,
}

/// A file resource of the Gemini File API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Resource name, e.g. `files/abc-123`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::common::serde::mime_as_string::optional"
    )]
    pub mime_type: Option<Mime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::common::serde::i64_as_string::optional"
    )]
    pub size_bytes: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub create_time: Option<OffsetDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_hash: Option<String>,
    /// URI used to reference the file in generation requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FileState>,
}

impl File {
    /// Returns the URI, failing if the service did not report one.
    pub fn require_uri(&self) -> Result<&Url, Error> {
        self.uri.as_ref().ok_or_else(|| Error::IncompleteMetadata {
            name: self.name.clone(),
            field: "uri",
        })
    }
}

/// Body of the request that opens an upload session.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploadRequest<'a> {
    file: UploadMetadata<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMetadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

impl<'a> UploadRequest<'a> {
    pub fn new(display_name: Option<&'a str>) -> Self {
        Self {
            file: UploadMetadata { display_name },
        }
    }
}

/// Body returned when an upload is finalized.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadResponse {
    pub file: File,
}
