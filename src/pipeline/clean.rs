//! Content cleanup: deterministic normalisation of document text.
//!
//! Text pulled out of a PDF (or pasted from one) carries layout noise: CRLF
//! line endings, trailing spaces on every line, runs of blank lines where the
//! page had whitespace, zero-width characters and soft hyphens. None of it
//! carries meaning, but all of it eats into the fixed character budget the
//! prompt allows for the document. These rules strip it before truncation.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the per-line rules see `\n` only;
//! invisible characters are removed before blank-line collapsing so a line
//! holding only a zero-width space counts as blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw document text.
///
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse runs of blank lines down to a single blank line
/// 5. Trim leading and trailing whitespace of the whole text
pub fn clean_content(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  premium   \nco-pay  "),
            "  premium\nco-pay"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "sum\u{200B}insured\u{FEFF} 5\u{00AD}lakh";
        assert_eq!(remove_invisible_chars(input), "suminsured 5lakh");
    }

    #[test]
    fn test_clean_content_full_pipeline() {
        let input = "\u{FEFF}  Policy Wording\r\n\r\n\r\n\r\nSection 1   \r\n\u{200B}\r\n\r\nExclusions\n\n";
        let result = clean_content(input);
        assert_eq!(result, "Policy Wording\n\nSection 1\n\nExclusions");
    }

    #[test]
    fn test_clean_content_empty() {
        assert_eq!(clean_content("  \n\n \r\n"), "");
    }
}
