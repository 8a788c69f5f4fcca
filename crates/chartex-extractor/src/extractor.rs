//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::normalize::normalize_records;
use crate::parser::{parse_completion, RawRecord};
use crate::prompt::PromptBuilder;
use crate::types::{
    BatchDisposition, BatchOutcome, ExtractionEvent, ExtractionReport, ProgressObserver,
};
use chartex_domain::{CompletionClient, CompletionRequest, Record, Schema};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// The Extractor turns free-text notes into schema-shaped records.
///
/// One extractor instance carries one schema, one completion client, and
/// one configuration. Batches run strictly sequentially; the only
/// suspension points are the inter-batch rate-limit sleep and the backoff
/// sleep between retry attempts inside a batch.
pub struct Extractor<C>
where
    C: CompletionClient,
{
    client: Arc<C>,
    schema: Schema,
    config: ExtractorConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl<C> Extractor<C>
where
    C: CompletionClient + Send + Sync + 'static,
    C::Error: std::fmt::Display,
{
    /// Create a new Extractor.
    ///
    /// # Errors
    ///
    /// Configuration and schema problems are returned here, before any
    /// batch work can start. After construction, extraction never fails:
    /// it degrades.
    pub fn new(
        client: C,
        schema: Schema,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        schema.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            client: Arc::new(client),
            schema,
            config,
            observer: None,
        })
    }

    /// Attach a structured progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The active schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Extract one record per note.
    ///
    /// Notes are split into `ceil(len / batch_size)` contiguous batches,
    /// processed one at a time with the configured delay between batches.
    /// The report's records always match the input in length and order;
    /// batches that exhausted their retries (or needed pad/truncate
    /// correction) appear in the report's ledger and come back as
    /// canonical-empty records rather than errors.
    pub async fn extract(&self, notes: &[String]) -> ExtractionReport {
        let batch_size = self.config.batch_size;
        let total_batches = notes.len().div_ceil(batch_size);
        let mut records = Vec::with_capacity(notes.len());
        let mut failed_batches = Vec::new();

        info!(
            "Starting extraction: {} notes in {} batches of up to {}",
            notes.len(),
            total_batches,
            batch_size
        );

        for (index, batch) in notes.chunks(batch_size).enumerate() {
            debug!(
                "Processing batch {}/{} ({} notes)",
                index + 1,
                total_batches,
                batch.len()
            );
            self.emit(ExtractionEvent::BatchStarted {
                index,
                total: total_batches,
                notes: batch.len(),
            });

            let outcome = self.run_batch(index, batch).await;
            if outcome.disposition.is_degraded() {
                failed_batches.push(index);
            }
            self.emit(ExtractionEvent::BatchFinished {
                index,
                disposition: outcome.disposition,
            });
            records.extend(outcome.records);

            // Rate limiting delay (except after the last batch)
            if index + 1 < total_batches {
                sleep(self.config.rate_limit_delay()).await;
            }
        }

        info!(
            "Batch processing complete: {} total, {} succeeded, {} degraded",
            total_batches,
            total_batches - failed_batches.len(),
            failed_batches.len()
        );
        if !failed_batches.is_empty() {
            warn!("Degraded batch indices: {:?}", failed_batches);
        }

        ExtractionReport {
            records,
            total_batches,
            failed_batches,
        }
    }

    /// Extract a single batch through the retry state machine.
    ///
    /// Exposed for callers that manage their own batching; `extract` is the
    /// usual entry point.
    pub async fn extract_batch(&self, notes: &[String]) -> BatchOutcome {
        self.run_batch(0, notes).await
    }

    /// One batch: blank partition, then attempt/backoff until success or
    /// exhaustion.
    ///
    /// Blank notes never reach the model. Only the live notes are numbered
    /// into the prompt; parsed records are aligned against the live count
    /// and canonical empties fill the blank positions afterwards, so the
    /// model's numbering and the caller's positions cannot drift.
    async fn run_batch(&self, index: usize, notes: &[String]) -> BatchOutcome {
        let live: Vec<(usize, &str)> = notes
            .iter()
            .enumerate()
            .filter(|(_, note)| !note.trim().is_empty())
            .map(|(pos, note)| (pos, note.as_str()))
            .collect();

        if live.is_empty() {
            debug!(
                "Batch {} carries only blank notes; skipping completion call",
                index + 1
            );
            return BatchOutcome {
                records: vec![self.schema.empty_record(); notes.len()],
                disposition: BatchDisposition::Extracted,
            };
        }

        let builder = PromptBuilder::new(&self.schema);
        let live_notes: Vec<&str> = live.iter().map(|(_, note)| *note).collect();
        let request = CompletionRequest {
            system: builder.system_prompt(),
            user: builder.user_prompt(&live_notes),
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_output_tokens,
            json_mode: true,
        };

        for attempt in 0..self.config.max_retries {
            match self.attempt(&request).await {
                Ok(parsed) => {
                    let parsed_len = parsed.len();
                    let normalized = normalize_records(parsed, &self.schema, live.len());
                    let disposition = if parsed_len == live.len() {
                        BatchDisposition::Extracted
                    } else {
                        // Count drift is corrected here, not retried
                        BatchDisposition::Corrected {
                            parsed: parsed_len,
                            expected: live.len(),
                        }
                    };
                    return BatchOutcome {
                        records: self.reassemble(notes.len(), &live, normalized),
                        disposition,
                    };
                }
                Err(e) => {
                    warn!("Batch {} attempt {} failed: {}", index + 1, attempt + 1, e);
                    if attempt + 1 < self.config.max_retries {
                        // Exponential backoff: 1s, 2s, 4s, ...
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        self.emit(ExtractionEvent::RetryScheduled {
                            index,
                            attempt: attempt + 1,
                            delay,
                        });
                        sleep(delay).await;
                    }
                }
            }
        }

        warn!(
            "Batch {} exhausted all {} attempts; falling back to empty records",
            index + 1,
            self.config.max_retries
        );
        BatchOutcome {
            records: vec![self.schema.empty_record(); notes.len()],
            disposition: BatchDisposition::Exhausted,
        }
    }

    /// One completion attempt: call the service, reject empty content,
    /// parse. Every failure here is retryable.
    async fn attempt(&self, request: &CompletionRequest) -> Result<Vec<RawRecord>, ExtractorError> {
        let raw = self.call_completion(request).await?;
        if raw.trim().is_empty() {
            return Err(ExtractorError::EmptyResponse);
        }
        debug!("Completion response length: {} chars", raw.len());

        let parsed = parse_completion(&raw, &self.schema);
        if parsed.is_empty() {
            return Err(ExtractorError::UnparseableResponse);
        }
        Ok(parsed)
    }

    /// Call the completion client off the async worker threads
    async fn call_completion(&self, request: &CompletionRequest) -> Result<String, ExtractorError> {
        let client = Arc::clone(&self.client);
        let request = request.clone();

        tokio::task::spawn_blocking(move || {
            client
                .complete(&request)
                .map_err(|e| ExtractorError::Completion(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Completion(format!("Task join error: {}", e)))?
    }

    /// Interleave normalized live records with canonical empties at the
    /// blank positions
    fn reassemble(
        &self,
        len: usize,
        live: &[(usize, &str)],
        normalized: Vec<Record>,
    ) -> Vec<Record> {
        if live.len() == len {
            return normalized;
        }

        let mut records = vec![self.schema.empty_record(); len];
        for ((pos, _), record) in live.iter().zip(normalized) {
            records[*pos] = record;
        }
        records
    }

    fn emit(&self, event: ExtractionEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}
