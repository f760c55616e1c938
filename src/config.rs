//! Runtime configuration, resolved once at startup.

use snafu::{ResultExt, Snafu};
use std::{env, path::PathBuf};
use tracing::{debug, warn};
use url::Url;

use crate::client::{Model, DEFAULT_BASE_URL};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

pub const DEFAULT_IMAGE_PATH: &str = "MicrosoftTeams-image 2.png";
pub const DISPLAY_NAME: &str = "Jetpack drawing";
pub const SUMMARY_PROMPT: &str = "Produce a summary of this image.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{var} is not set; add it to the environment or a .env file"))]
    MissingCredential { var: &'static str },

    #[snafu(display("{var} value '{value}' is not a valid URL"))]
    InvalidBaseUrl {
        source: url::ParseError,
        var: &'static str,
        value: String,
    },
}

/// What to summarize and how to label it.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryJob {
    pub image_path: PathBuf,
    pub display_name: String,
    pub prompt: String,
    pub model: Model,
}

impl Default for SummaryJob {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            display_name: DISPLAY_NAME.to_string(),
            prompt: SUMMARY_PROMPT.to_string(),
            model: Model::default(),
        }
    }
}

/// Everything a run needs, passed explicitly to the client and workflow.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub base_url: Url,
    pub job: SummaryJob,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("job", &self.job)
            .finish()
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, Error> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded environment file"),
            Err(e) if e.not_found() => debug!("no environment file found"),
            Err(e) => warn!(error = %e, "ignoring unreadable environment file"),
        }
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Resolve the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| lookup(var).filter(|value| !value.is_empty());

        let api_key = lookup(API_KEY_VAR).ok_or(Error::MissingCredential { var: API_KEY_VAR })?;

        let mut base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Endpoints are joined relative to the base, which needs a trailing slash.
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url).context(InvalidBaseUrlSnafu {
            var: BASE_URL_VAR,
            value: base_url.as_str(),
        })?;

        let model = lookup(MODEL_VAR).map(Model::from).unwrap_or_default();

        Ok(Self {
            api_key,
            base_url,
            job: SummaryJob {
                model,
                ..SummaryJob::default()
            },
        })
    }

    /// Replace the image path, e.g. with one given on the command line.
    pub fn with_image_path(mut self, image_path: impl Into<PathBuf>) -> Self {
        self.job.image_path = image_path.into();
        self
    }
}
