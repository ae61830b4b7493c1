//! libSQL storage layer for property listings.
//!
//! The [`Storage`] struct wraps a libSQL database holding property listings,
//! their amenities, and generated summaries. The processing pipeline talks to
//! it through two traits:
//! - [`PropertyStore`]: the upfront fetch and opening a per-record transaction
//! - [`RecordTransaction`]: the writes and amenity lookup for one record

mod migrations;

use std::path::Path;

use libsql::{Connection, Database, params};
use listing_shared::{ListingError, PropertyId, PropertyRecord, PropertySummary, Result, Rewrite};

/// Separator between amenity names in the aggregated display string.
pub const AMENITY_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Read access to candidate records plus a per-record transaction factory.
#[allow(async_fn_in_trait)]
pub trait PropertyStore {
    type Transaction: RecordTransaction;

    /// Fetch every property that should be processed, in one read.
    async fn fetch_properties(&self) -> Result<Vec<PropertyRecord>>;

    /// Open a transaction scoped to a single record's writes.
    async fn begin_record(&self) -> Result<Self::Transaction>;
}

/// Operations available inside one record's transaction.
///
/// Nothing written through a transaction is visible until [`commit`] succeeds;
/// [`rollback`] (or dropping the transaction) discards all of it.
///
/// [`commit`]: RecordTransaction::commit
/// [`rollback`]: RecordTransaction::rollback
#[allow(async_fn_in_trait)]
pub trait RecordTransaction {
    /// Replace a property's title and description together.
    async fn update_listing(&self, id: PropertyId, rewrite: &Rewrite) -> Result<()>;

    /// Aggregate the property's amenity names, `""` when it has none.
    async fn amenities_for(&self, id: PropertyId) -> Result<String>;

    /// Insert one summary row.
    async fn insert_summary(&self, summary: &PropertySummary) -> Result<()>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ListingError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ListingError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ListingError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Property operations
    // -----------------------------------------------------------------------

    /// Insert a property listing.
    pub async fn insert_property(&self, record: &PropertyRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO properties_property (property_id, title, description)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.id.0,
                    record.title.as_str(),
                    record.description.as_str()
                ],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a property by ID.
    pub async fn get_property(&self, id: PropertyId) -> Result<Option<PropertyRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT property_id, title, description
                 FROM properties_property WHERE property_id = ?1",
                params![id.0],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_property(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ListingError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Amenity operations
    // -----------------------------------------------------------------------

    /// Insert an amenity name. Returns the new amenity ID.
    pub async fn insert_amenity(&self, name: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO properties_amenity (name) VALUES (?1)",
                params![name],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Associate an amenity with a property.
    pub async fn link_amenity(&self, property_id: PropertyId, amenity_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO properties_property_amenities (property_id, amenity_id)
                 VALUES (?1, ?2)",
                params![property_id.0, amenity_id],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Summary operations
    // -----------------------------------------------------------------------

    /// List summaries for a property, oldest first.
    pub async fn list_summaries(&self, property_id: PropertyId) -> Result<Vec<PropertySummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, property_id, summary, created_at
                 FROM property_summary WHERE property_id = ?1 ORDER BY id",
                params![property_id.0],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => results.push(row_to_summary(&row)?),
                Ok(None) => break,
                Err(e) => return Err(ListingError::Storage(e.to_string())),
            }
        }
        Ok(results)
    }
}

impl PropertyStore for Storage {
    type Transaction = StorageTransaction;

    async fn fetch_properties(&self) -> Result<Vec<PropertyRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT property_id, title, description
                 FROM properties_property ORDER BY property_id",
                params![],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => results.push(row_to_property(&row)?),
                Ok(None) => break,
                Err(e) => return Err(ListingError::Storage(e.to_string())),
            }
        }
        Ok(results)
    }

    async fn begin_record(&self) -> Result<StorageTransaction> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| ListingError::Storage(format!("failed to begin transaction: {e}")))?;
        Ok(StorageTransaction { tx })
    }
}

// ---------------------------------------------------------------------------
// StorageTransaction
// ---------------------------------------------------------------------------

/// A libSQL transaction covering one record's writes.
pub struct StorageTransaction {
    tx: libsql::Transaction,
}

impl RecordTransaction for StorageTransaction {
    async fn update_listing(&self, id: PropertyId, rewrite: &Rewrite) -> Result<()> {
        let changed = self
            .tx
            .execute(
                "UPDATE properties_property
                 SET title = ?1, description = ?2
                 WHERE property_id = ?3",
                params![rewrite.title.as_str(), rewrite.description.as_str(), id.0],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;

        if changed == 0 {
            return Err(ListingError::Storage(format!(
                "property {id} no longer exists"
            )));
        }
        Ok(())
    }

    async fn amenities_for(&self, id: PropertyId) -> Result<String> {
        query_amenities(&self.tx, id).await
    }

    async fn insert_summary(&self, summary: &PropertySummary) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO property_summary (id, property_id, summary, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    summary.id.as_str(),
                    summary.property_id.0,
                    summary.summary.as_str(),
                    summary.created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| ListingError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| ListingError::Storage(format!("commit failed: {e}")))
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| ListingError::Storage(format!("rollback failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

/// Aggregate amenity names in junction-row order.
async fn query_amenities(conn: &Connection, id: PropertyId) -> Result<String> {
    let mut rows = conn
        .query(
            "SELECT group_concat(name, ?2) FROM (
                 SELECT a.name AS name
                 FROM properties_property_amenities pa
                 JOIN properties_amenity a ON a.id = pa.amenity_id
                 WHERE pa.property_id = ?1
                 ORDER BY pa.id
             )",
            params![id.0, AMENITY_SEPARATOR],
        )
        .await
        .map_err(|e| ListingError::Storage(e.to_string()))?;

    match rows.next().await {
        // group_concat over zero rows yields NULL.
        Ok(Some(row)) => Ok(row.get::<String>(0).unwrap_or_default()),
        Ok(None) => Ok(String::new()),
        Err(e) => Err(ListingError::Storage(e.to_string())),
    }
}

/// Convert a database row to a [`PropertyRecord`]. NULL text columns read as empty.
fn row_to_property(row: &libsql::Row) -> Result<PropertyRecord> {
    Ok(PropertyRecord {
        id: PropertyId(
            row.get::<i64>(0)
                .map_err(|e| ListingError::Storage(e.to_string()))?,
        ),
        title: row.get::<String>(1).unwrap_or_default(),
        description: row.get::<String>(2).unwrap_or_default(),
    })
}

/// Convert a database row to a [`PropertySummary`].
fn row_to_summary(row: &libsql::Row) -> Result<PropertySummary> {
    Ok(PropertySummary {
        id: row
            .get::<String>(0)
            .map_err(|e| ListingError::Storage(e.to_string()))?,
        property_id: PropertyId(
            row.get::<i64>(1)
                .map_err(|e| ListingError::Storage(e.to_string()))?,
        ),
        summary: row
            .get::<String>(2)
            .map_err(|e| ListingError::Storage(e.to_string()))?,
        created_at: {
            let s: String = row
                .get(3)
                .map_err(|e| ListingError::Storage(e.to_string()))?;
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| ListingError::Storage(format!("invalid date: {e}")))?
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("lr_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn record(id: i64, title: &str, description: &str) -> PropertyRecord {
        PropertyRecord {
            id: PropertyId(id),
            title: title.into(),
            description: description.into(),
        }
    }

    fn rewrite(title: &str, description: &str) -> Rewrite {
        Rewrite {
            title: title.into(),
            description: description.into(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("lr_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn fetch_returns_rows_in_id_order() {
        let storage = test_storage().await;
        storage.insert_property(&record(3, "C", "third")).await.unwrap();
        storage.insert_property(&record(1, "A", "first")).await.unwrap();

        let fetched = storage.fetch_properties().await.expect("fetch");
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0], record(1, "A", "first"));
        assert_eq!(fetched[1].id, PropertyId(3));
    }

    #[tokio::test]
    async fn fetch_empty_table() {
        let storage = test_storage().await;
        assert!(storage.fetch_properties().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn amenities_aggregate_in_link_order() {
        let storage = test_storage().await;
        storage.insert_property(&record(1, "A", "a")).await.unwrap();
        storage.insert_property(&record(2, "B", "b")).await.unwrap();

        let wifi = storage.insert_amenity("Wifi").await.unwrap();
        let pool = storage.insert_amenity("Pool").await.unwrap();
        let parking = storage.insert_amenity("Parking").await.unwrap();

        storage.link_amenity(PropertyId(1), pool).await.unwrap();
        storage.link_amenity(PropertyId(1), wifi).await.unwrap();
        storage.link_amenity(PropertyId(2), parking).await.unwrap();

        let tx = storage.begin_record().await.unwrap();
        assert_eq!(tx.amenities_for(PropertyId(1)).await.unwrap(), "Pool, Wifi");
        assert_eq!(tx.amenities_for(PropertyId(2)).await.unwrap(), "Parking");
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn no_amenities_is_empty_string() {
        let storage = test_storage().await;
        storage.insert_property(&record(1, "A", "a")).await.unwrap();
        let tx = storage.begin_record().await.unwrap();
        assert_eq!(tx.amenities_for(PropertyId(1)).await.unwrap(), "");
        // Unknown property too.
        assert_eq!(tx.amenities_for(PropertyId(99)).await.unwrap(), "");
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn committed_transaction_persists_update_and_summary() {
        let storage = test_storage().await;
        storage.insert_property(&record(1, "Old", "old text")).await.unwrap();

        let tx = storage.begin_record().await.expect("begin");
        tx.update_listing(PropertyId(1), &rewrite("New", "new text"))
            .await
            .expect("update");
        assert_eq!(tx.amenities_for(PropertyId(1)).await.unwrap(), "");
        tx.insert_summary(&PropertySummary::new(PropertyId(1), "A lovely place"))
            .await
            .expect("insert summary");
        tx.commit().await.expect("commit");

        let updated = storage.get_property(PropertyId(1)).await.unwrap().unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, "new text");

        let summaries = storage.list_summaries(PropertyId(1)).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].summary, "A lovely place");
    }

    #[tokio::test]
    async fn rolled_back_transaction_leaves_no_trace() {
        let storage = test_storage().await;
        storage.insert_property(&record(1, "Old", "old text")).await.unwrap();

        let tx = storage.begin_record().await.expect("begin");
        tx.update_listing(PropertyId(1), &rewrite("New", "new text"))
            .await
            .unwrap();
        tx.insert_summary(&PropertySummary::new(PropertyId(1), "discarded"))
            .await
            .unwrap();
        tx.rollback().await.expect("rollback");

        let unchanged = storage.get_property(PropertyId(1)).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "Old");
        assert!(storage.list_summaries(PropertyId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_property_fails() {
        let storage = test_storage().await;
        let tx = storage.begin_record().await.unwrap();
        let err = tx
            .update_listing(PropertyId(404), &rewrite("T", "D"))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::Storage(_)));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn multiple_summaries_per_property_allowed() {
        let storage = test_storage().await;
        storage.insert_property(&record(1, "A", "a")).await.unwrap();

        for text in ["first run", "second run"] {
            let tx = storage.begin_record().await.unwrap();
            tx.insert_summary(&PropertySummary::new(PropertyId(1), text))
                .await
                .unwrap();
            tx.commit().await.unwrap();
        }

        let summaries = storage.list_summaries(PropertyId(1)).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].summary, "first run");
    }
}
