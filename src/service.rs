//! The seam between the summary workflow and the remote service.
//!
//! [`GenerativeService`] is the two-call surface the workflow needs. [`Gemini`]
//! implements it over HTTP; tests substitute an in-memory double.

use async_trait::async_trait;
use mime::Mime;
use snafu::{ResultExt, Snafu};
use tracing::{info, instrument, warn};
use url::Url;

use crate::{
    client::{Error as ClientError, Gemini, Model},
    files::Error as FilesError,
    generation::Candidate,
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("client invocation error"))]
    Client { source: ClientError },

    #[snafu(display("uploaded file cannot be referenced"))]
    Unreferenceable { source: FilesError },
}

/// A file that has been uploaded and can be referenced in generation requests.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Reference assigned by the service.
    pub uri: Url,
    /// Display name as echoed back by the service.
    pub display_name: String,
    pub mime_type: Mime,
}

/// Remote operations used by the summary workflow.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Upload `bytes` under `display_name`.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: Mime,
    ) -> Result<UploadedFile, Self::Error>;

    /// Ask `model` to respond to `prompt` about `file`, returning all candidates in order.
    async fn generate(
        &self,
        file: &UploadedFile,
        prompt: &str,
        model: &Model,
    ) -> Result<Vec<Candidate>, Self::Error>;
}

#[async_trait]
impl GenerativeService for Gemini {
    type Error = Error;

    #[instrument(skip_all, fields(display_name = display_name, file.size = bytes.len()))]
    async fn upload(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: Mime,
    ) -> Result<UploadedFile, Self::Error> {
        let file = self
            .create_file(bytes)
            .display_name(display_name)
            .with_mime_type(mime_type.clone())
            .upload()
            .await
            .context(ClientSnafu)?;

        let uri = file.require_uri().context(UnreferenceableSnafu)?.clone();
        info!(file.name = %file.name, state = ?file.state, "file uploaded");

        Ok(UploadedFile {
            uri,
            display_name: file.display_name.unwrap_or_else(|| display_name.to_string()),
            mime_type: file.mime_type.unwrap_or(mime_type),
        })
    }

    #[instrument(skip_all, fields(file.uri = %file.uri, model = %model))]
    async fn generate(
        &self,
        file: &UploadedFile,
        prompt: &str,
        model: &Model,
    ) -> Result<Vec<Candidate>, Self::Error> {
        let response = self
            .generate_content()
            .with_model(model.clone())
            .with_file_and_text(file.uri.as_str(), file.mime_type.to_string(), prompt)
            .execute()
            .await
            .context(ClientSnafu)?;

        if response.candidates.is_empty() {
            warn!(
                block_reason = response.block_reason(),
                "no candidates returned"
            );
        }
        Ok(response.candidates)
    }
}
