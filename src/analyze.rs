//! Analysis entry points.
//!
//! One submission is one linear pass: validate, extract, clean, prompt,
//! complete, decode. Nothing is shared between submissions, so callers can
//! run as many analyses side by side as they like.

use crate::client::resolve_client;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::input::{self, DocumentSource};
use crate::pipeline::{clean, decode, extract, llm};
use crate::progress::Stage;
use crate::prompts::{build_prompt, SYSTEM_PROMPT};
use crate::report::{AnalysisOutput, AnalysisStats};
use crate::request::{AnalysisRequest, Submission, MAX_CONTENT_CHARS};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Analyse a financial product document against the user's goals.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - [`AnalysisError::MissingInput`] before any remote call when the
///   submission has neither text nor a PDF.
/// - Extraction errors for unreadable or encrypted PDFs.
/// - Remote errors from the completion call, surfaced once.
/// - [`AnalysisError::Undecodable`] when the model's reply holds no JSON
///   object; the raw reply is carried in the error.
///
/// # Example
/// ```rust,no_run
/// use investguard::{analyze, AnalysisConfig, ProductType, Submission};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let submission = Submission::new(ProductType::HealthInsurance)
///     .text("Sum insured 5 lakh. Room rent capped at 1% of sum insured.");
/// let config = AnalysisConfig::from_env()?;
/// let output = analyze(&submission, &config).await?;
/// println!("{}", output.report);
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    submission: &Submission,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let total_start = Instant::now();

    // Every start is paired with a completion, including input rejections.
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start();
    }

    let result = run(submission, config, total_start).await;

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(result.is_ok());
    }
    result
}

async fn run(
    submission: &Submission,
    config: &AnalysisConfig,
    total_start: Instant,
) -> Result<AnalysisOutput, AnalysisError> {
    let source = input::resolve_document(submission)?;
    info!("Starting analysis: {} product", submission.product_type);

    // ── Step 1: Document text ────────────────────────────────────────────
    let extraction_start = Instant::now();
    let request = build_request(submission, source, config).await?;
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    // ── Step 2: Prompt ───────────────────────────────────────────────────
    let system = config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT);
    let prompt = build_prompt(&request);
    debug!("Prompt built: {} chars", prompt.chars().count());

    // ── Step 3: Completion ───────────────────────────────────────────────
    let client = resolve_client(config)?;
    stage_start(config, Stage::Requesting);
    let llm_start = Instant::now();
    let (completion, retries) =
        llm::request_completion(client.as_ref(), system, &prompt, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    stage_complete(config, Stage::Requesting, llm_duration_ms);

    // ── Step 4: Decode ───────────────────────────────────────────────────
    stage_start(config, Stage::Decoding);
    let decode_start = Instant::now();
    let report = match decode::decode_result(&completion.text) {
        Some(report) => report,
        None => {
            warn!(
                "Model reply held no JSON object ({} bytes)",
                completion.text.len()
            );
            return Err(AnalysisError::Undecodable {
                raw: completion.text,
            });
        }
    };
    stage_complete(
        config,
        Stage::Decoding,
        decode_start.elapsed().as_millis() as u64,
    );

    let stats = AnalysisStats {
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        retries,
        extraction_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Analysis complete: verdict {}, {}ms total",
        report.verdict_label(),
        stats.total_duration_ms
    );

    Ok(AnalysisOutput {
        report,
        raw_response: completion.text,
        content_truncated: request.content_truncated(),
        content_chars: request.original_chars(),
        stats,
    })
}

/// Analyse a submission and write the Markdown report to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn analyze_to_file(
    submission: &Submission,
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let output = analyze(submission, config).await?;
    write_report(output_path, &output.report.to_markdown()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    submission: &Submission,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalysisError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(submission, config))
}

/// Build the exact user turn a submission would send, without calling the model.
///
/// Still validates the submission and extracts PDF text.
pub async fn preview_prompt(
    submission: &Submission,
    config: &AnalysisConfig,
) -> Result<String, AnalysisError> {
    let source = input::resolve_document(submission)?;
    let request = build_request(submission, source, config).await?;
    Ok(build_prompt(&request))
}

/// Write `contents` to `path` atomically, creating parent directories.
pub async fn write_report(path: impl AsRef<Path>, contents: &str) -> Result<(), AnalysisError> {
    let path = path.as_ref();
    let write_failed = |e| AnalysisError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    debug!("Wrote report to {}", path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Turn the resolved document into a bounded [`AnalysisRequest`].
async fn build_request(
    submission: &Submission,
    source: DocumentSource<'_>,
    config: &AnalysisConfig,
) -> Result<AnalysisRequest, AnalysisError> {
    let raw = match source {
        DocumentSource::Pdf(upload) => {
            stage_start(config, Stage::Extracting);
            let start = Instant::now();
            let text = extract::extract_text(upload, config).await?;
            let elapsed = start.elapsed().as_millis() as u64;
            info!(
                "Extracted {} chars from '{}' in {}ms",
                text.chars().count(),
                upload.name,
                elapsed
            );
            stage_complete(config, Stage::Extracting, elapsed);
            text
        }
        DocumentSource::Text(text) => text.to_string(),
    };

    let content = if config.clean_content {
        clean::clean_content(&raw)
    } else {
        raw
    };

    let request = AnalysisRequest::from_submission(submission, &content);
    if request.content_truncated() {
        warn!(
            "Document content truncated from {} to {} chars",
            request.original_chars(),
            MAX_CONTENT_CHARS
        );
    }
    Ok(request)
}

fn stage_start(config: &AnalysisConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &AnalysisConfig, stage: Stage, elapsed_ms: u64) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ProductType;

    #[tokio::test]
    async fn preview_contains_document_and_goals() {
        let submission = Submission::new(ProductType::MutualFund)
            .goals("Retirement corpus")
            .text("Exit load 1% within 12 months.\r\n\r\n\r\n\r\nTER 1.8%");
        let config = AnalysisConfig::default();
        let prompt = preview_prompt(&submission, &config).await.unwrap();
        assert!(prompt.contains("User goals: Retirement corpus"));
        assert!(prompt.contains("Exit load 1% within 12 months.\n\nTER 1.8%"));
    }

    #[tokio::test]
    async fn preview_without_cleaning_keeps_raw_text() {
        let submission = Submission::default().text("a  \r\nb");
        let config = AnalysisConfig::builder().clean_content(false).build().unwrap();
        let prompt = preview_prompt(&submission, &config).await.unwrap();
        assert!(prompt.contains("a  \r\nb"));
    }

    #[tokio::test]
    async fn preview_rejects_empty_submission() {
        let err = preview_prompt(&Submission::default(), &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput));
    }

    #[tokio::test]
    async fn write_report_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("policy.md");
        write_report(&path, "**Verdict:** Avoid\n").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "**Verdict:** Avoid\n"
        );
        assert!(!dir.path().join("reports").join("policy.md.tmp").exists());
    }
}
