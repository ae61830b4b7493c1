//! Per-record rewrite and summary pipeline.
//!
//! For one property: generate a rewritten title/description, write it, then
//! generate and store a summary that also mentions the property's amenities.
//! The title/description update and the summary insert share one transaction,
//! but a failed summary generation still commits the update.

use listing_inference::TextGenerator;
use listing_shared::{ListingError, PropertyId, PropertyRecord, PropertySummary, Result, Rewrite};
use listing_storage::{PropertyStore, RecordTransaction};
use tracing::{error, info, instrument, warn};

use crate::prompt;

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Title and description were updated.
    Rewritten { summary_created: bool },
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Why a record was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The rewrite generation call failed or returned nothing.
    RewriteFailed,
    /// The rewrite had no newline separating title from description.
    MalformedRewrite,
    /// A store error or any other unexpected failure.
    Failed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RewriteFailed => "rewrite_failed",
            Self::MalformedRewrite => "malformed_rewrite",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processes one property at a time against a generator and a store.
pub struct RecordProcessor<'a, G, S> {
    generator: &'a G,
    store: &'a S,
}

impl<'a, G, S> RecordProcessor<'a, G, S>
where
    G: TextGenerator,
    S: PropertyStore,
{
    pub fn new(generator: &'a G, store: &'a S) -> Self {
        Self { generator, store }
    }

    /// Rewrite and summarize one record.
    ///
    /// Never fails: every error is logged with the property id and reported
    /// as a [`RecordOutcome::Skipped`].
    #[instrument(skip_all, fields(property_id = %record.id))]
    pub async fn process(&self, record: &PropertyRecord) -> RecordOutcome {
        match self.try_process(record).await {
            Ok(outcome) => outcome,
            Err(ListingError::MalformedResponse { message }) => {
                warn!(property_id = %record.id, %message, "skipping property with malformed rewrite");
                RecordOutcome::Skipped(SkipReason::MalformedRewrite)
            }
            Err(e) => {
                error!(property_id = %record.id, error = %e, "error processing property");
                RecordOutcome::Skipped(SkipReason::Failed)
            }
        }
    }

    async fn try_process(&self, record: &PropertyRecord) -> Result<RecordOutcome> {
        let rewritten = match self.generator.generate(&prompt::rewrite_prompt(record)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(property_id = %record.id, error = %e, "skipping property due to generation error");
                return Ok(RecordOutcome::Skipped(SkipReason::RewriteFailed));
            }
        };

        let rewrite = prompt::split_rewrite(&rewritten)?;

        let tx = self.store.begin_record().await?;
        match self.apply(&tx, record.id, &rewrite).await {
            Ok(summary_created) => {
                tx.commit().await?;
                info!(property_id = %record.id, summary_created, "property rewritten");
                Ok(RecordOutcome::Rewritten { summary_created })
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(property_id = %record.id, error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Writes inside the record's transaction. Returns whether a summary was inserted.
    async fn apply(&self, tx: &S::Transaction, id: PropertyId, rewrite: &Rewrite) -> Result<bool> {
        tx.update_listing(id, rewrite).await?;

        let amenities = tx.amenities_for(id).await?;
        let summary_prompt = prompt::summary_prompt(rewrite, &amenities);

        match self.generator.generate(&summary_prompt).await {
            Ok(summary) => {
                tx.insert_summary(&PropertySummary::new(id, summary)).await?;
                Ok(true)
            }
            Err(e) => {
                warn!(property_id = %id, error = %e, "skipping summary due to generation error");
                Ok(false)
            }
        }
    }
}
