//! Input validation: decide which document a submission is about.
//!
//! A submission may carry pasted text, an uploaded PDF, both, or neither.
//! Neither is rejected here, before anything expensive happens. When both
//! are present the PDF wins. We check the PDF magic bytes (`%PDF`) up front
//! so callers get a meaningful error rather than a pdfium failure later.

use crate::error::AnalysisError;
use crate::request::{PdfUpload, Submission};
use tracing::debug;

/// Where the document content for an analysis comes from.
#[derive(Debug)]
pub enum DocumentSource<'a> {
    /// Uploaded PDF; text still has to be extracted.
    Pdf(&'a PdfUpload),
    /// Pasted text, already trimmed.
    Text(&'a str),
}

/// Validate a submission and pick its document.
///
/// # Errors
/// - [`AnalysisError::MissingInput`] if the pasted text is blank and no PDF
///   was uploaded.
/// - [`AnalysisError::NotAPdf`] if the upload does not start with `%PDF`.
pub fn resolve_document(submission: &Submission) -> Result<DocumentSource<'_>, AnalysisError> {
    if let Some(ref pdf) = submission.pdf {
        if !pdf.bytes.starts_with(b"%PDF") {
            return Err(AnalysisError::NotAPdf {
                name: pdf.name.clone(),
                magic: pdf.bytes.iter().take(4).copied().collect(),
            });
        }
        debug!("Using uploaded PDF '{}' ({} bytes)", pdf.name, pdf.bytes.len());
        return Ok(DocumentSource::Pdf(pdf));
    }

    let text = submission.text.trim();
    if text.is_empty() {
        return Err(AnalysisError::MissingInput);
    }

    debug!("Using pasted text ({} chars)", text.chars().count());
    Ok(DocumentSource::Text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_and_no_pdf_is_rejected() {
        let s = Submission::default().text("   \n\t ");
        assert!(matches!(
            resolve_document(&s),
            Err(AnalysisError::MissingInput)
        ));
        assert!(matches!(
            resolve_document(&Submission::default()),
            Err(AnalysisError::MissingInput)
        ));
    }

    #[test]
    fn pasted_text_is_trimmed() {
        let s = Submission::default().text("\n  Premium: 12,000 p.a.  \n");
        match resolve_document(&s).unwrap() {
            DocumentSource::Text(t) => assert_eq!(t, "Premium: 12,000 p.a."),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn pdf_takes_precedence_over_text() {
        let s = Submission::default()
            .text("pasted")
            .pdf("policy.pdf", b"%PDF-1.4 ...".to_vec());
        match resolve_document(&s).unwrap() {
            DocumentSource::Pdf(p) => assert_eq!(p.name, "policy.pdf"),
            other => panic!("expected pdf, got {other:?}"),
        }
    }

    #[test]
    fn non_pdf_upload_is_rejected() {
        let s = Submission::default().pdf("notes.docx", b"PK\x03\x04rest".to_vec());
        match resolve_document(&s) {
            Err(AnalysisError::NotAPdf { name, magic }) => {
                assert_eq!(name, "notes.docx");
                assert_eq!(magic, b"PK\x03\x04".to_vec());
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn empty_upload_is_rejected() {
        let s = Submission::default().pdf("empty.pdf", Vec::new());
        assert!(matches!(
            resolve_document(&s),
            Err(AnalysisError::NotAPdf { .. })
        ));
    }
}
