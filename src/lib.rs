//! # image-summary
//!
//! Uploads an image to Google's Gemini API and asks the model to summarize it.
//!
//! The crate carries a small Gemini REST client ([`Gemini`]) covering the two
//! calls the workflow needs: a resumable file upload and `generateContent`.
//! The workflow itself ([`summary::run`]) only sees the [`GenerativeService`]
//! trait, so it can be driven by a test double.
//!
//! ```rust,ignore
//! use image_summary::{config::Config, summary};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), image_summary::summary::Error> {
//!     let config = Config::from_env().context(summary::ConfigurationSnafu)?;
//!     summary::execute(&config, &mut std::io::stdout()).await
//! }
//! ```

mod client;
mod common;
pub mod config;
pub mod files;
pub mod generation;
mod models;
pub mod prelude;
pub mod service;
pub mod summary;


pub use client::{Error as ClientError, Gemini, Model, DEFAULT_BASE_URL};
pub use files::{File, FileBuilder, FileState};
pub use generation::{Candidate, ContentBuilder, FinishReason, GenerationResponse};
pub use models::{Content, FileData, Part, Role};
pub use service::{GenerativeService, UploadedFile};
