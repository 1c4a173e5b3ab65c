//! Error types for the investguard library.
//!
//! A single [`AnalysisError`] covers every way a submission can fail. Each
//! submission is independent, so nothing here is fatal to the process: the
//! caller turns the error into a message for the user and moves on.
//!
//! Two variants deserve a note:
//!
//! * [`AnalysisError::MissingInput`] is raised before any remote call is made.
//! * [`AnalysisError::Undecodable`] carries the raw model output so the caller
//!   can show it verbatim instead of fabricating report fields.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the investguard library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Neither pasted text nor a PDF was supplied.
    #[error("Please upload a PDF or paste text to analyze.")]
    MissingInput,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The uploaded bytes are not a PDF.
    #[error("Uploaded file '{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction from PDFs needs the pdfium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium, or\n\
  • place libpdfium next to the working directory, or\n\
  • paste the document text with --text instead.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The named provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion request failed.
    #[error("API call failed: {message}")]
    LlmApiError { message: String },

    /// The endpoint rejected the credentials (401/403); retrying will not help.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The endpoint returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The completion call exceeded the configured timeout.
    #[error("API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The model answered, but no JSON object could be recovered from it.
    #[error("Failed to parse the model response.")]
    Undecodable { raw: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether another attempt at the completion call could succeed.
    ///
    /// Only consulted when retries are enabled; the default is a single attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::LlmApiError { .. }
                | AnalysisError::RateLimitExceeded { .. }
                | AnalysisError::ApiTimeout { .. }
        )
    }

    /// The raw model output, when decoding it failed.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AnalysisError::Undecodable { raw } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_message_matches_form_wording() {
        let e = AnalysisError::MissingInput;
        assert_eq!(e.to_string(), "Please upload a PDF or paste text to analyze.");
    }

    #[test]
    fn llm_error_is_prefixed() {
        let e = AnalysisError::LlmApiError {
            message: "connection refused".into(),
        };
        assert_eq!(e.to_string(), "API call failed: connection refused");
    }

    #[test]
    fn auth_error_display() {
        let e = AnalysisError::AuthError {
            provider: "openrouter".into(),
            detail: "invalid key".into(),
        };
        assert!(e.to_string().contains("openrouter"));
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn api_timeout_display() {
        let e = AnalysisError::ApiTimeout { elapsed_ms: 5000 };
        assert!(e.to_string().contains("5000ms"));
    }

    #[test]
    fn retry_classification() {
        assert!(AnalysisError::LlmApiError {
            message: "502".into()
        }
        .is_retryable());
        assert!(AnalysisError::RateLimitExceeded {
            provider: "openrouter".into(),
            retry_after_secs: None,
        }
        .is_retryable());
        assert!(!AnalysisError::AuthError {
            provider: "openrouter".into(),
            detail: "401".into(),
        }
        .is_retryable());
        assert!(!AnalysisError::MissingInput.is_retryable());
    }

    #[test]
    fn undecodable_keeps_raw_text() {
        let e = AnalysisError::Undecodable {
            raw: "Sorry, I cannot help".into(),
        };
        assert_eq!(e.raw_response(), Some("Sorry, I cannot help"));
        assert_eq!(e.to_string(), "Failed to parse the model response.");
        assert_eq!(AnalysisError::MissingInput.raw_response(), None);
    }
}
