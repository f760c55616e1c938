//! Uploads an image to Gemini and prints a summary of it.
//!
//! Usage: `image-summary [IMAGE_PATH]`. Requires `GEMINI_API_KEY`, which may
//! come from a `.env` file.

use display_error_chain::DisplayErrorChain;
use image_summary::{
    config::Config,
    summary::{self, ConfigurationSnafu},
};
use snafu::ResultExt;
use std::{env, io, process::ExitCode};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    match do_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_chain = DisplayErrorChain::new(&e);
            error!(error.debug = ?e, error.chained = %error_chain, "execution failed");
            ExitCode::FAILURE
        }
    }
}

async fn do_main() -> Result<(), summary::Error> {
    let mut config = Config::from_env().context(ConfigurationSnafu)?;
    if let Some(image_path) = env::args_os().nth(1) {
        config = config.with_image_path(image_path);
    }

    summary::execute(&config, &mut io::stdout()).await
}
