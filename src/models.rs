//! # Core Gemini API Data Primitives
//!
//! The building blocks shared by requests and responses: `Content`, `Part`
//! and `Role`. Only the part kinds this crate sends or reads are modelled;
//! anything else the API returns is kept as raw JSON.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary (thinking models only)
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Reference to a file uploaded through the File API
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    /// Any part kind this crate does not interpret
    Other(serde_json::Value),
}

/// URI-based reference to previously uploaded data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The MIME type of the referenced file
    pub mime_type: String,
    /// The URI returned by the upload
    pub file_uri: String,
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a content referencing an uploaded file, followed by a text part.
    pub fn file_with_text(
        file_uri: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            parts: Some(vec![
                Part::FileData {
                    file_data: FileData {
                        mime_type: mime_type.into(),
                        file_uri: file_uri.into(),
                    },
                },
                Part::Text {
                    text: text.into(),
                    thought: None,
                },
            ]),
            role: None,
        }
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Concatenated text of all non-thought text parts.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .flatten()
            .filter_map(|part| match part {
                Part::Text {
                    text,
                    thought: None | Some(false),
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_part_comes_before_prompt() {
        let content = Content::file_with_text(
            "https://generativelanguage.googleapis.com/v1beta/files/abc",
            "image/png",
            "Describe this",
        )
        .with_role(Role::User);

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            json!({
                "parts": [
                    {
                        "fileData": {
                            "mimeType": "image/png",
                            "fileUri": "https://generativelanguage.googleapis.com/v1beta/files/abc"
                        }
                    },
                    { "text": "Describe this" }
                ],
                "role": "user"
            })
        );
    }

    #[test]
    fn unknown_parts_are_kept_raw() {
        let content: Content = serde_json::from_value(json!({
            "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                { "text": "hello" }
            ],
            "role": "model"
        }))
        .unwrap();

        let parts = content.parts.as_ref().unwrap();
        assert!(matches!(parts[0], Part::Other(_)));
        assert_eq!(content.joined_text(), "hello");
    }

    #[test]
    fn thoughts_are_not_part_of_the_text() {
        let content: Content = serde_json::from_value(json!({
            "parts": [
                { "text": "thinking...", "thought": true },
                { "text": "A drawing " },
                { "text": "of a jetpack." }
            ]
        }))
        .unwrap();

        assert_eq!(content.joined_text(), "A drawing of a jetpack.");
    }
}
