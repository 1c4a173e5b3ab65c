//! Pipeline stages for one product analysis.
//!
//! Each submodule implements exactly one step, so each can be tested
//! without a network or a pdfium library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean ──▶ llm ──▶ decode
//! (form)    (pdfium)    (text)   (chat)  (JSON)
//! ```
//!
//! 1. [`input`]   pick the document (PDF wins over pasted text); reject empty submissions
//! 2. [`extract`] page text via pdfium; runs in `spawn_blocking`
//! 3. [`clean`]   normalise whitespace and invisible characters
//! 4. [`llm`]     the single completion call, with optional retry; the only
//!    stage with network I/O
//! 5. [`decode`]  recover a JSON object from free-form model output

pub mod clean;
pub mod decode;
pub mod extract;
pub mod input;
pub mod llm;
