//! Chartex Extractor
//!
//! Converts free-text clinical notes into schema-shaped records by
//! prompting an LLM completion service and parsing its JSON output.
//!
//! # Architecture
//!
//! ```text
//! Notes → PromptBuilder → CompletionClient → Parser → Normalizer → Records
//!          (per batch, with retry/backoff and a failure ledger)
//! ```
//!
//! # Key Guarantees
//!
//! - **Shape**: output always has one record per input note, in input
//!   order, and every record carries exactly the schema's fields
//! - **Degradation over failure**: after construction, extraction never
//!   errors; batches that exhaust their retries come back as
//!   canonical-empty records and land in the report's ledger
//! - **Sequential**: batches run one at a time with a configurable
//!   rate-limit delay between them
//!
//! # Example Usage
//!
//! ```no_run
//! use chartex_domain::Schema;
//! use chartex_extractor::{Extractor, ExtractorConfig};
//! use chartex_llm::MockClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MockClient::new(r#"{"results": [{"Chief_Complaint": "Chest pain"}]}"#);
//! let extractor = Extractor::new(
//!     client,
//!     Schema::clinical_note(),
//!     ExtractorConfig::default(),
//! )?;
//!
//! let notes = vec!["CC: Chest pain. Pt reports 2 hours of substernal pressure.".to_string()];
//! let report = extractor.extract(&notes).await;
//!
//! assert_eq!(report.records.len(), notes.len());
//! println!("{} batches, {} degraded", report.total_batches, report.failed_batches.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod normalize;
mod parser;
mod prompt;
mod types;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use types::{
    BatchDisposition, BatchOutcome, ExtractionEvent, ExtractionReport, ProgressObserver,
};
