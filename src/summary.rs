//! The upload-then-summarize workflow.
//!
//! Each stage runs once, in order. Any failure is returned to the caller,
//! tagged with the stage it came from; nothing here retries or exits.

use snafu::{ResultExt, Snafu};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::{
    client::{Error as ClientError, Gemini, Model},
    config::{Config, Error as ConfigError, SummaryJob},
    generation::Candidate,
    service::{GenerativeService, UploadedFile},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to load configuration"))]
    Configuration { source: ConfigError },

    #[snafu(display("failed to create the Gemini client"))]
    ClientInit { source: ClientError },

    #[snafu(display("failed to open file '{}'", path.display()))]
    FileOpen {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to upload file '{}'", path.display()))]
    Upload { source: BoxError, path: PathBuf },

    #[snafu(display("failed to generate image summary"))]
    Generation { source: BoxError },

    #[snafu(display("failed to write output"))]
    Output { source: std::io::Error },
}

/// Connect to Gemini as configured and run the workflow, writing results to `out`.
///
/// The client is dropped before this returns, whatever the outcome.
pub async fn execute<W: Write>(config: &Config, out: &mut W) -> Result<(), Error> {
    let client = Gemini::with_model_and_base_url(
        &config.api_key,
        config.job.model.clone(),
        config.base_url.clone(),
    )
    .context(ClientInitSnafu)?;

    run(&client, &config.job, out).await
}

/// Upload the job's image, then print every summary the model returns.
pub async fn run<S, W>(service: &S, job: &SummaryJob, out: &mut W) -> Result<(), Error>
where
    S: GenerativeService,
    W: Write,
{
    let file = upload_image(service, &job.image_path, &job.display_name).await?;
    writeln!(
        out,
        "File {} uploaded successfully: {:?}",
        file.display_name,
        file.uri.as_str()
    )
    .and_then(|()| out.flush())
    .context(OutputSnafu)?;

    for summary in summarize(service, &file, &job.prompt, &job.model).await? {
        writeln!(out, "Image summary: {summary}").context(OutputSnafu)?;
    }
    out.flush().context(OutputSnafu)
}

/// Read the file at `path` and upload it under `display_name`.
///
/// The file is read before the service is contacted, so a missing file never
/// causes network traffic.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn upload_image<S: GenerativeService>(
    service: &S,
    path: &Path,
    display_name: &str,
) -> Result<UploadedFile, Error> {
    let bytes = tokio::fs::read(path).await.context(FileOpenSnafu { path })?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();
    info!(size = bytes.len(), mime_type = %mime_type, "uploading image");

    service
        .upload(bytes, display_name, mime_type)
        .await
        .map_err(BoxError::from)
        .context(UploadSnafu { path })
}

/// Request a summary of `file`, returning the text of each candidate that has any.
#[instrument(skip_all, fields(file.uri = %file.uri, model = %model))]
pub async fn summarize<S: GenerativeService>(
    service: &S,
    file: &UploadedFile,
    prompt: &str,
    model: &Model,
) -> Result<Vec<String>, Error> {
    let candidates = service
        .generate(file, prompt, model)
        .await
        .map_err(BoxError::from)
        .context(GenerationSnafu)?;

    info!(candidates = candidates.len(), "summary generated");
    Ok(candidate_texts(&candidates))
}

/// Texts of the candidates in response order; candidates without text are logged and skipped.
fn candidate_texts(candidates: &[Candidate]) -> Vec<String> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(position, candidate)| {
            let text = candidate.text();
            if text.is_none() {
                warn!(
                    position,
                    finish_reason = ?candidate.finish_reason,
                    has_content = candidate.content.is_some(),
                    "skipping candidate without text"
                );
            }
            text
        })
        .collect()
}
