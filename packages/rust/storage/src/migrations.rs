//! SQL migration definitions for the property database.
//!
//! Migrations are applied in order on database open. Table names follow the
//! layout of the listing application that owns the data, so an existing
//! database is picked up as-is and a fresh one gets the same shape.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Property listings, amenities, and their junction table",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS properties_property (
    property_id INTEGER PRIMARY KEY,
    title       TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS properties_amenity (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS properties_property_amenities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL REFERENCES properties_property(property_id) ON DELETE CASCADE,
    amenity_id  INTEGER NOT NULL REFERENCES properties_amenity(id) ON DELETE CASCADE,
    UNIQUE(property_id, amenity_id)
);

CREATE INDEX IF NOT EXISTS idx_property_amenities_property
    ON properties_property_amenities(property_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Generated property summaries",
            sql: r#"
CREATE TABLE IF NOT EXISTS property_summary (
    id          TEXT PRIMARY KEY,
    property_id INTEGER NOT NULL,
    summary     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_property_summary_property
    ON property_summary(property_id);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
