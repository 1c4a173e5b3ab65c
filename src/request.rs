//! Submission and request types.
//!
//! A [`Submission`] is what the user typed and uploaded. Once its document has
//! been resolved to text it becomes an [`AnalysisRequest`]: immutable, with
//! the document content already bounded to [`MAX_CONTENT_CHARS`].

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Maximum number of characters of document content sent to the model.
pub const MAX_CONTENT_CHARS: usize = 3000;

/// Default goals pre-filled in the submission form.
pub const DEFAULT_GOALS: &str = "Protect family health, reduce expenses.";

/// Default notes pre-filled in the submission form.
pub const DEFAULT_NOTES: &str = "Agent claims no co-pay.";

// ── Enums ────────────────────────────────────────────────────────────────

/// Kind of financial product being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductType {
    #[default]
    #[serde(rename = "Health Insurance")]
    HealthInsurance,
    #[serde(rename = "Mutual Fund")]
    MutualFund,
    #[serde(rename = "Fixed Deposit")]
    FixedDeposit,
    Bond,
    Other,
}

impl ProductType {
    pub const ALL: [ProductType; 5] = [
        ProductType::HealthInsurance,
        ProductType::MutualFund,
        ProductType::FixedDeposit,
        ProductType::Bond,
        ProductType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProductType::HealthInsurance => "Health Insurance",
            ProductType::MutualFund => "Mutual Fund",
            ProductType::FixedDeposit => "Fixed Deposit",
            ProductType::Bond => "Bond",
            ProductType::Other => "Other",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The user's declared appetite for risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskProfile {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskProfile::Low => "Low",
            RiskProfile::Medium => "Medium",
            RiskProfile::High => "High",
        })
    }
}

/// How long the user intends to hold the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Horizon {
    #[default]
    Short,
    Medium,
    Long,
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Horizon::Short => "Short",
            Horizon::Medium => "Medium",
            Horizon::Long => "Long",
        })
    }
}

// ── Submission ───────────────────────────────────────────────────────────

/// An uploaded PDF, held in memory until extraction.
#[derive(Clone)]
pub struct PdfUpload {
    /// Display name used in error messages and logs.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PdfUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfUpload")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Everything the user supplied for one analysis.
///
/// The pasted text may be empty; validation happens in
/// [`crate::pipeline::input::resolve_document`].
#[derive(Debug, Clone)]
pub struct Submission {
    pub product_type: ProductType,
    pub goals: String,
    pub notes: String,
    pub risk_profile: RiskProfile,
    pub horizon: Horizon,
    /// Pasted document text.
    pub text: String,
    /// Uploaded PDF. Takes precedence over `text` when both are present.
    pub pdf: Option<PdfUpload>,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            product_type: ProductType::default(),
            goals: DEFAULT_GOALS.to_string(),
            notes: DEFAULT_NOTES.to_string(),
            risk_profile: RiskProfile::default(),
            horizon: Horizon::default(),
            text: String::new(),
            pdf: None,
        }
    }
}

impl Submission {
    pub fn new(product_type: ProductType) -> Self {
        Self {
            product_type,
            ..Self::default()
        }
    }

    pub fn goals(mut self, goals: impl Into<String>) -> Self {
        self.goals = goals.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn risk_profile(mut self, risk: RiskProfile) -> Self {
        self.risk_profile = risk;
        self
    }

    pub fn horizon(mut self, horizon: Horizon) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn pdf(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.pdf = Some(PdfUpload {
            name: name.into(),
            bytes,
        });
        self
    }

    /// Attach a PDF read from disk.
    pub fn pdf_file(self, path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => AnalysisError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => AnalysisError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.pdf(name, bytes))
    }
}

// ── AnalysisRequest ──────────────────────────────────────────────────────

/// The immutable input to the prompt builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    product_type: ProductType,
    goals: String,
    notes: String,
    risk_profile: RiskProfile,
    horizon: Horizon,
    content: String,
    original_chars: usize,
}

impl AnalysisRequest {
    /// Build a request, bounding `content` to [`MAX_CONTENT_CHARS`].
    pub fn new(
        product_type: ProductType,
        goals: impl Into<String>,
        notes: impl Into<String>,
        risk_profile: RiskProfile,
        horizon: Horizon,
        content: &str,
    ) -> Self {
        let (bounded, _) = truncate_content(content);
        Self {
            product_type,
            goals: goals.into(),
            notes: notes.into(),
            risk_profile,
            horizon,
            content: bounded.to_string(),
            original_chars: content.chars().count(),
        }
    }

    /// Build a request from a submission and its resolved document text.
    pub fn from_submission(submission: &Submission, content: &str) -> Self {
        Self::new(
            submission.product_type,
            submission.goals.clone(),
            submission.notes.clone(),
            submission.risk_profile,
            submission.horizon,
            content,
        )
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn goals(&self) -> &str {
        &self.goals
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn risk_profile(&self) -> RiskProfile {
        self.risk_profile
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Document content, never longer than [`MAX_CONTENT_CHARS`] characters.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Character count of the content before truncation.
    pub fn original_chars(&self) -> usize {
        self.original_chars
    }

    pub fn content_truncated(&self) -> bool {
        self.original_chars > MAX_CONTENT_CHARS
    }
}

/// Cut `content` to its first [`MAX_CONTENT_CHARS`] characters.
///
/// Returns the bounded slice and whether anything was dropped. Counts
/// Unicode scalar values, so the cut always lands on a char boundary.
pub fn truncate_content(content: &str) -> (&str, bool) {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => (&content[..byte_idx], true),
        None => (content, false),
    }
}
