//! SQLite persistence adapters.
//!
//! One pool is shared by both repositories. Ids are stored as TEXT, times as
//! fixed-width RFC 3339 TEXT (so they sort lexically), list columns as JSON.

mod booker_repo;
mod crisis_repo;

pub use booker_repo::SqliteBookerRepo;
pub use crisis_repo::SqliteCrisisRepo;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::infrastructure::ports::RepoError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS bookers (
        id TEXT PRIMARY KEY,
        company_id TEXT NOT NULL,
        name TEXT NOT NULL,
        creativity_score INTEGER NOT NULL,
        logic_score INTEGER NOT NULL,
        bias_resistance INTEGER NOT NULL,
        preferred_style TEXT NOT NULL,
        preferred_product TEXT NOT NULL,
        likes_underdog INTEGER NOT NULL,
        likes_veteran INTEGER NOT NULL,
        likes_fast_rise INTEGER NOT NULL,
        likes_slow_burn INTEGER NOT NULL,
        auto_booking_enabled INTEGER NOT NULL,
        employment_status TEXT NOT NULL,
        hired_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bookers_company ON bookers (company_id)",
    r#"
    CREATE TABLE IF NOT EXISTS booker_memories (
        id TEXT PRIMARY KEY,
        booker_id TEXT NOT NULL,
        event TEXT NOT NULL,
        description TEXT NOT NULL,
        workers_json TEXT NOT NULL,
        impact_score INTEGER NOT NULL,
        recall_strength INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_memories_booker ON booker_memories (booker_id)",
    r#"
    CREATE TABLE IF NOT EXISTS booker_employment (
        id TEXT PRIMARY KEY,
        booker_id TEXT NOT NULL,
        company_id TEXT NOT NULL,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        termination_reason TEXT,
        performance_score INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS crises (
        id TEXT PRIMARY KEY,
        company_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        stage TEXT NOT NULL,
        severity INTEGER NOT NULL,
        description TEXT NOT NULL,
        affected_workers_json TEXT NOT NULL,
        escalation_score INTEGER NOT NULL,
        resolution_attempts INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        resolved_at TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_crises_company ON crises (company_id, stage)",
    r#"
    CREATE TABLE IF NOT EXISTS communications (
        id TEXT PRIMARY KEY,
        company_id TEXT NOT NULL,
        crisis_id TEXT,
        kind TEXT NOT NULL,
        initiator_id TEXT NOT NULL,
        target_id TEXT,
        message TEXT NOT NULL,
        tone TEXT NOT NULL,
        success_chance INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS communication_outcomes (
        id TEXT PRIMARY KEY,
        communication_id TEXT NOT NULL UNIQUE,
        successful INTEGER NOT NULL,
        morale_impact INTEGER NOT NULL,
        relationship_impact INTEGER NOT NULL,
        escalation_change INTEGER NOT NULL,
        feedback TEXT,
        created_at TEXT NOT NULL
    )
    "#,
];

/// Open (or create) the database file and make sure every table exists.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    ensure_schema(&pool).await?;
    tracing::debug!(db_path, "SQLite schema ready");
    Ok(pool)
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("ensure_schema", e))?;
    }
    Ok(())
}

// =============================================================================
// Column codecs
// =============================================================================

pub(crate) fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepoError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepoError::database("decode_row", e))
}

pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn decode_opt_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>, RepoError> {
    raw.as_deref().map(decode_time).transpose()
}

/// Parse an id or stored enum tag.
pub(crate) fn decode<T>(raw: &str) -> Result<T, RepoError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| RepoError::serialization(format!("bad value {raw:?}: {e}")))
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String, RepoError> {
    serde_json::to_string(value).map_err(RepoError::serialization)
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, RepoError> {
    serde_json::from_str(raw).map_err(RepoError::serialization)
}
