//! # investguard
//!
//! Explain a financial product before you buy it.
//!
//! Give it the product document (pasted text or a PDF), what you are trying
//! to achieve, your risk appetite and your horizon. One language-model call
//! later you get a structured report: a verdict, pros and cons, charges,
//! risks, red flags, a suitability assessment and the questions to put to
//! whoever is selling it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Submission
//!  │
//!  ├─ 1. Input    PDF wins over pasted text; empty submissions rejected
//!  ├─ 2. Extract  page text via pdfium (spawn_blocking)
//!  ├─ 3. Clean    whitespace / invisible-character normalisation
//!  ├─ 4. Prompt   fixed JSON schema, document bounded to 3000 chars
//!  ├─ 5. Complete one chat completion (OpenRouter or any edgequake-llm provider)
//!  └─ 6. Decode   tolerant JSON recovery → AnalysisResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use investguard::{analyze, AnalysisConfig, Horizon, ProductType, RiskProfile, Submission};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENROUTER_API_KEY / INVESTGUARD_MODEL from the environment
//!     let config = AnalysisConfig::from_env()?;
//!     let submission = Submission::new(ProductType::MutualFund)
//!         .goals("Child education in 12 years")
//!         .risk_profile(RiskProfile::Low)
//!         .horizon(Horizon::Long)
//!         .pdf_file("scheme-information.pdf")?;
//!
//!     let output = analyze(&submission, &config).await?;
//!     println!("{}", output.report.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `investguard` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! investguard = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync, analyze_to_file, preview_prompt, write_report};
pub use client::{Completion, CompletionClient, OpenRouterClient, ProviderClient};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::AnalysisError;
pub use pipeline::decode::{decode, resolve};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::build_prompt;
pub use report::{AnalysisOutput, AnalysisResult, AnalysisStats, Suitability, SuitabilityAssessment};
pub use request::{
    AnalysisRequest, Horizon, PdfUpload, ProductType, RiskProfile, Submission, MAX_CONTENT_CHARS,
};
