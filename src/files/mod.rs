pub mod builder;
pub mod model;

pub use builder::FileBuilder;
pub(crate) use model::{UploadRequest, UploadResponse};
pub use model::{Error, File, FileState};
