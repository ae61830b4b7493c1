//! Core domain types for property listings and their summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PropertyId
// ---------------------------------------------------------------------------

/// Stable identifier of a property listing (the store's integer key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub i64);

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PropertyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for PropertyId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// PropertyRecord
// ---------------------------------------------------------------------------

/// A property listing as fetched from the store.
///
/// The store owns these rows; the pipeline only reads and updates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub title: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Rewrite
// ---------------------------------------------------------------------------

/// A rewritten title/description pair produced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub title: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// PropertySummary
// ---------------------------------------------------------------------------

/// A generated summary row. Several may exist for the same property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySummary {
    /// Row identifier (UUID v7, time-sortable).
    pub id: String,
    /// The property this summary describes.
    pub property_id: PropertyId,
    /// Generated summary text.
    pub summary: String,
    /// When the summary was created.
    pub created_at: DateTime<Utc>,
}

impl PropertySummary {
    /// Build a fresh summary row for `property_id`.
    pub fn new(property_id: PropertyId, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            property_id,
            summary: summary.into(),
            created_at: Utc::now(),
        }
    }
}
