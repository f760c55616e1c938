//! # Prelude for the image-summary crate
//!
//! Re-exports the types most callers need:
//!
//! ```rust,ignore
//! use image_summary::prelude::*;
//! ```

pub use crate::client::{Error as ClientError, Gemini, Model};
pub use crate::config::{Config, SummaryJob};
pub use crate::files::{File, FileBuilder};
pub use crate::generation::{Candidate, ContentBuilder, GenerationResponse};
pub use crate::models::{Content, Part, Role};
pub use crate::service::{GenerativeService, UploadedFile};
pub use crate::summary::Error as SummaryError;
