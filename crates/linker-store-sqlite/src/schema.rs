//! SQL schema for the study registry.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The table-level `UNIQUE` constraints create the composite key index used
/// by lookups. A pre-existing table is left as it is, so a legacy registry
/// without those constraints is still readable and its duplicates are
/// reported at lookup time.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Written once by the import tool; never updated or deleted while serving.
CREATE TABLE IF NOT EXISTS studies (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id         TEXT NOT NULL,
    study_date         TEXT NOT NULL,   -- YYYY-MM-DD
    modality           TEXT NOT NULL,
    study_reference_id TEXT NOT NULL UNIQUE,
    created_at         TEXT NOT NULL,   -- RFC 3339 UTC; set at import
    UNIQUE (subject_id, study_date, modality)
);

CREATE INDEX IF NOT EXISTS studies_date_idx ON studies(study_date);

PRAGMA user_version = 1;
";
