//! Result, ledger, and progress types for extraction

use chartex_domain::Record;
use std::time::Duration;

/// How a batch's records were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchDisposition {
    /// Parse succeeded and the record count matched the batch
    Extracted,

    /// The model answered with the wrong record count; the normalizer
    /// padded or truncated to restore alignment
    Corrected {
        /// Records the model returned
        parsed: usize,
        /// Records the batch required
        expected: usize,
    },

    /// Every attempt failed; the batch fell back to canonical empty records
    Exhausted,
}

impl BatchDisposition {
    /// Whether the batch needed any fallback, padding, or truncation
    pub fn is_degraded(&self) -> bool {
        !matches!(self, BatchDisposition::Extracted)
    }
}

/// Records and disposition for one extracted batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One record per input note, in input order
    pub records: Vec<Record>,

    /// How the records were produced
    pub disposition: BatchDisposition,
}

/// Result of a full extraction run.
///
/// Degradation never surfaces as an error: the ledger and all-blank records
/// are the only observable signals of batches that fell back.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// One record per input note, same length and order as the input
    pub records: Vec<Record>,

    /// Number of batches processed
    pub total_batches: usize,

    /// 0-based indices of batches that used any fallback, padding, or
    /// truncation correction
    pub failed_batches: Vec<usize>,
}

impl ExtractionReport {
    /// Batches that produced aligned records without correction
    pub fn succeeded_batches(&self) -> usize {
        self.total_batches - self.failed_batches.len()
    }

    /// Whether every batch extracted cleanly
    pub fn is_clean(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

/// Progress events emitted while a run advances
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    /// A batch is about to be extracted
    BatchStarted {
        /// 0-based batch index
        index: usize,
        /// Total batches in the run
        total: usize,
        /// Notes in this batch
        notes: usize,
    },

    /// An attempt failed; the next one runs after `delay`
    RetryScheduled {
        /// 0-based batch index
        index: usize,
        /// 1-based number of the attempt that just failed
        attempt: u32,
        /// Backoff before the next attempt
        delay: Duration,
    },

    /// A batch finished, cleanly or degraded
    BatchFinished {
        /// 0-based batch index
        index: usize,
        /// How the batch's records were produced
        disposition: BatchDisposition,
    },
}

/// Structured observability sink for extraction progress.
///
/// Events arrive in order from the orchestrator's task. Implementations
/// couple the pipeline to whatever sink the host application uses (progress
/// bar, log stream, UI channel) without the pipeline knowing about it.
pub trait ProgressObserver: Send + Sync {
    /// Handle one progress event
    fn on_event(&self, event: &ExtractionEvent);
}
