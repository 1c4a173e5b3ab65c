//! Progress-callback trait for analysis stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to learn which
//! stage a submission is in while the caller waits on it. The CLI uses this
//! to drive its spinner; a web front end could forward the same events to a
//! socket.
//!
//! # Example
//!
//! ```rust
//! use investguard::{AnalysisConfig, AnalysisProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl AnalysisProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{}…", stage);
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The stages of one analysis, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Pulling text out of the uploaded PDF (skipped for pasted text).
    Extracting,
    /// Waiting on the completion endpoint.
    Requesting,
    /// Recovering the JSON report from the completion text.
    Decoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Extracting => "Extracting document text",
            Stage::Requesting => "Waiting for the model",
            Stage::Decoding => "Reading the analysis",
        })
    }
}

/// Called by the pipeline as a submission moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before validation; always followed by `on_analysis_complete`.
    fn on_analysis_start(&self) {}

    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called before a retry of the completion call (only when retries are enabled).
    ///
    /// # Arguments
    /// * `attempt`    : 1-based retry number
    /// * `max_retries`: configured retry budget
    /// * `error`      : the failure that triggered the retry
    fn on_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        let _ = (attempt, max_retries, error);
    }

    /// Called once at the end, whatever the outcome.
    fn on_analysis_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {:?}", stage));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("done {:?}", stage));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start();
        cb.on_stage_start(Stage::Requesting);
        cb.on_stage_complete(Stage::Requesting, 10);
        cb.on_retry(1, 2, "502");
        cb.on_analysis_complete(false);
    }

    #[test]
    fn recorder_through_arc_dyn() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_stage_start(Stage::Decoding);
        cb.on_stage_complete(Stage::Decoding, 1);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start Decoding".to_string(), "done Decoding".to_string()]
        );
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::Extracting.to_string(), "Extracting document text");
    }
}
