//! Schema definitions and migration runner for the remote backend.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Image bytes are stored base64-
//! encoded in a string field so the bucket table stays SCHEMAFULL.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::StoreError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['Pending', 'Officer', 'Admin', 'OrgOwner'];
DEFINE FIELD app_owner ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD last_activity ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;

-- =======================================================================
-- Incident records
-- =======================================================================
DEFINE TABLE record SCHEMAFULL;
DEFINE FIELD individual_name ON TABLE record TYPE string;
DEFINE FIELD external_id ON TABLE record TYPE option<string>;
DEFINE FIELD location ON TABLE record TYPE string;
DEFINE FIELD reason ON TABLE record TYPE string;
DEFINE FIELD responsible_officers ON TABLE record TYPE string;
DEFINE FIELD articles ON TABLE record TYPE array<string> DEFAULT [];
DEFINE FIELD seized_items ON TABLE record TYPE option<string>;
DEFINE FIELD observations ON TABLE record TYPE option<string>;
DEFINE FIELD date_time ON TABLE record TYPE datetime;
DEFINE FIELD screenshots ON TABLE record TYPE array<string> DEFAULT [];
DEFINE FIELD created_by ON TABLE record TYPE string;
DEFINE FIELD created_at ON TABLE record TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD edited_by ON TABLE record TYPE option<string>;
DEFINE FIELD edited_at ON TABLE record TYPE option<datetime>;
DEFINE INDEX idx_record_individual ON TABLE record \
    COLUMNS individual_name;

-- =======================================================================
-- Image bucket (screenshot objects)
-- =======================================================================
DEFINE TABLE image SCHEMAFULL;
DEFINE FIELD content_type ON TABLE image TYPE string;
DEFINE FIELD data ON TABLE image TYPE string;
DEFINE FIELD size ON TABLE image TYPE int;
DEFINE FIELD created_at ON TABLE image TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Settings (single row under a fixed id)
-- =======================================================================
DEFINE TABLE settings SCHEMAFULL;
DEFINE FIELD webhook_url ON TABLE settings TYPE option<string>;
DEFINE FIELD message_template ON TABLE settings TYPE string;
DEFINE FIELD title ON TABLE settings TYPE string;
DEFINE FIELD subtitle ON TABLE settings TYPE string;
DEFINE FIELD logo_url ON TABLE settings TYPE option<string>;
DEFINE FIELD favicon_url ON TABLE settings TYPE option<string>;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['RecordCreate', 'RecordEdit', 'RecordDelete', \
    'RoleChange', 'UserRemoval', 'ClearAll'];
DEFINE FIELD performed_by ON TABLE audit_log TYPE string;
DEFINE FIELD target_user ON TABLE audit_log TYPE option<string>;
DEFINE FIELD target_record ON TABLE audit_log TYPE option<string>;
DEFINE FIELD details ON TABLE audit_log TYPE string;
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_timestamp ON TABLE audit_log COLUMNS timestamp;
";

/// Run all pending migrations against the given database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), StoreError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                StoreError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                StoreError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
