use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, GeminiClient, Model},
    generation::{GenerateContentRequest, GenerationResponse},
    models::{Content, Role},
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    model: Option<Model>,
    pub contents: Vec<Content>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            model: None,
            contents: Vec::new(),
        }
    }

    /// Uses a different model than the one the client was created with.
    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Adds a user message made of a file reference followed by `text`.
    pub fn with_file_and_text(
        mut self,
        file_uri: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let content = Content::file_with_text(file_uri, mime_type, text).with_role(Role::User);
        self.contents.push(content);
        self
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
        }
    }

    /// Executes the content generation request.
    #[instrument(skip_all, fields(
        messages.parts.count = self.contents.len(),
        model = %self.model.as_ref().unwrap_or(&self.client.model),
    ))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let model = self.model.clone().unwrap_or_else(|| client.model.clone());
        let request = self.build();
        client.generate_content_raw(&model, request).await
    }
}
