//! Batch run over every property: fetch once, process sequentially.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use listing_inference::TextGenerator;
use listing_shared::{PropertyId, PropertyRecord};
use listing_storage::PropertyStore;
use tracing::{error, info, instrument};

use crate::processor::{RecordOutcome, RecordProcessor, SkipReason};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every fetched record was attempted.
    Completed,
    /// The fetch returned no rows.
    NothingToDo,
    /// The fetch failed; nothing was processed.
    StoreUnavailable,
}

/// Counts collected over a run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub status: RunStatus,
    /// Records returned by the upfront fetch.
    pub fetched: usize,
    /// Records whose title and description were updated.
    pub rewritten: usize,
    /// Summary rows created.
    pub summaries_created: usize,
    /// Records left untouched.
    pub skipped: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    fn new(status: RunStatus) -> Self {
        Self {
            status,
            fetched: 0,
            rewritten: 0,
            summaries_created: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Rewritten { summary_created } => {
                self.rewritten += 1;
                if summary_created {
                    self.summaries_created += 1;
                }
            }
            RecordOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a record is processed.
    fn record_started(&self, record: &PropertyRecord, current: usize, total: usize);
    /// Called after a record is processed.
    fn record_finished(&self, id: PropertyId, outcome: RecordOutcome);
    /// Called when the run ends, whatever the outcome.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_started(&self, _record: &PropertyRecord, _current: usize, _total: usize) {}
    fn record_finished(&self, _id: PropertyId, _outcome: RecordOutcome) {}
    fn done(&self, _report: &BatchReport) {}
}

// ---------------------------------------------------------------------------
// BatchRunner
// ---------------------------------------------------------------------------

/// Drives [`RecordProcessor`] over all fetched properties.
pub struct BatchRunner<'a, G, S> {
    processor: RecordProcessor<'a, G, S>,
    store: &'a S,
    progress: &'a dyn BatchProgress,
}

impl<'a, G, S> BatchRunner<'a, G, S>
where
    G: TextGenerator,
    S: PropertyStore,
{
    pub fn new(generator: &'a G, store: &'a S, progress: &'a dyn BatchProgress) -> Self {
        Self {
            processor: RecordProcessor::new(generator, store),
            store,
            progress,
        }
    }

    /// Run the batch.
    ///
    /// 1. Fetch all properties in one read
    /// 2. Process each one sequentially, isolating failures
    /// 3. Log a completion line
    #[instrument(skip_all)]
    pub async fn run(&self) -> BatchReport {
        let start = Instant::now();

        self.progress.phase("Fetching properties");
        let records = match self.store.fetch_properties().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "error accessing database");
                return self.finish(BatchReport::new(RunStatus::StoreUnavailable), start);
            }
        };

        if records.is_empty() {
            info!("no properties found to process");
            let mut report = BatchReport::new(RunStatus::NothingToDo);
            report.elapsed = start.elapsed();
            self.progress.done(&report);
            return report;
        }

        let mut report = BatchReport::new(RunStatus::Completed);
        report.fetched = records.len();
        let total = records.len();

        self.progress.phase("Rewriting properties");
        for (i, record) in records.iter().enumerate() {
            self.progress.record_started(record, i + 1, total);
            let outcome = self.process_guarded(record).await;
            self.progress.record_finished(record.id, outcome);
            report.record(outcome);
        }

        self.finish(report, start)
    }

    /// Process one record, turning a panic into a skip.
    async fn process_guarded(&self, record: &PropertyRecord) -> RecordOutcome {
        match AssertUnwindSafe(self.processor.process(record))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(property_id = %record.id, %message, "error processing property");
                RecordOutcome::Skipped(SkipReason::Failed)
            }
        }
    }

    fn finish(&self, mut report: BatchReport, start: Instant) -> BatchReport {
        report.elapsed = start.elapsed();
        info!(
            fetched = report.fetched,
            rewritten = report.rewritten,
            summaries = report.summaries_created,
            skipped = report.skipped,
            elapsed_ms = report.elapsed.as_millis(),
            "processing completed"
        );
        self.progress.done(&report);
        report
    }
}
