// src/database.rs
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{error, info, warn};

use crate::{
    config::DatabaseConfig,
    errors::SatTrackerError,
    models::{NewSatellite, NoradId, SatelliteRecord},
};

/// Maximum number of records returned by a name search
pub const SEARCH_LIMIT: i64 = 20;

const RECORD_COLUMNS: &str =
    "id, name, norad_id, line1, line2, category, is_active, last_updated";

/// Satellite record store
#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Wrap an existing pool and make sure the schema exists
    pub async fn new(pool: Pool<Sqlite>) -> Result<Self, SatTrackerError> {
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            error!("Failed to run database migrations: {}", e);
            e
        })?;

        Ok(Self { pool })
    }

    /// Open or create the database described by `config`
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, SatTrackerError> {
        config.validate()?;

        info!(
            "Opening database: url={}, max_connections={}",
            config.url, config.max_connections
        );

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to open database: {}", e);
                e
            })?;

        Self::new(pool).await
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// All active records in insertion order
    pub async fn list_active(&self) -> Result<Vec<SatelliteRecord>, SatTrackerError> {
        let query = format!(
            "SELECT {} FROM satellites WHERE is_active = 1 ORDER BY id",
            RECORD_COLUMNS
        );
        let records = sqlx::query_as::<_, SatelliteRecord>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Active records whose name contains `query`, ignoring case.
    ///
    /// At most [`SEARCH_LIMIT`] records are returned. The query is matched
    /// literally; `%` and `_` are not wildcards.
    pub async fn search_active_by_name(
        &self,
        query: &str,
    ) -> Result<Vec<SatelliteRecord>, SatTrackerError> {
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "SELECT {} FROM satellites
             WHERE is_active = 1 AND name LIKE ?1 ESCAPE '\\'
             ORDER BY id
             LIMIT ?2",
            RECORD_COLUMNS
        );
        let records = sqlx::query_as::<_, SatelliteRecord>(&sql)
            .bind(pattern)
            .bind(SEARCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Fetch a record by its surrogate id, active or not
    pub async fn get(&self, id: i64) -> Result<Option<SatelliteRecord>, SatTrackerError> {
        let query = format!("SELECT {} FROM satellites WHERE id = ?1", RECORD_COLUMNS);
        let record = sqlx::query_as::<_, SatelliteRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Insert a new record
    ///
    /// Fails with [`SatTrackerError::DuplicateNoradId`] if the catalog
    /// number is already stored, whether that record is active or not.
    pub async fn create(&self, satellite: &NewSatellite) -> Result<SatelliteRecord, SatTrackerError> {
        satellite.validate()?;

        let query = format!(
            "INSERT INTO satellites (name, norad_id, line1, line2, category, is_active, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
             RETURNING {}",
            RECORD_COLUMNS
        );
        let record = sqlx::query_as::<_, SatelliteRecord>(&query)
            .bind(&satellite.name)
            .bind(satellite.norad_id.value())
            .bind(&satellite.line1)
            .bind(&satellite.line2)
            .bind(satellite.category())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, satellite.norad_id))?;

        info!(
            "Created satellite {} (NORAD {})",
            record.name, record.norad_id
        );
        Ok(record)
    }

    /// Soft-delete the record with the given catalog number.
    ///
    /// Returns whether a record was deactivated.
    pub async fn deactivate(&self, norad_id: NoradId) -> Result<bool, SatTrackerError> {
        let result = sqlx::query("UPDATE satellites SET is_active = 0 WHERE norad_id = ?1")
            .bind(norad_id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert `defaults` if there are no active records, then return the
    /// active records.
    ///
    /// Safe to call repeatedly and concurrently: a non-empty store is left
    /// untouched, and catalog numbers already present (even inactive) are
    /// skipped instead of failing.
    pub async fn seed_if_empty(
        &self,
        defaults: &[NewSatellite],
    ) -> Result<Vec<SatelliteRecord>, SatTrackerError> {
        let existing = self.list_active().await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        // Inserts only: the write lock is taken on the first statement
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for satellite in defaults {
            inserted += insert_default(&mut tx, satellite).await?;
        }
        tx.commit().await?;

        if inserted > 0 {
            info!("Seeded {} default satellites", inserted);
        } else {
            warn!("No active satellites and no default could be seeded");
        }

        self.list_active().await
    }
}

async fn insert_default(
    conn: &mut SqliteConnection,
    satellite: &NewSatellite,
) -> Result<u64, SatTrackerError> {
    satellite.validate()?;

    let result = sqlx::query(
        "INSERT INTO satellites (name, norad_id, line1, line2, category, is_active, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
         ON CONFLICT(norad_id) DO NOTHING",
    )
    .bind(&satellite.name)
    .bind(satellite.norad_id.value())
    .bind(&satellite.line1)
    .bind(&satellite.line2)
    .bind(satellite.category())
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

fn map_unique_violation(e: sqlx::Error, norad_id: NoradId) -> SatTrackerError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            warn!("Rejected duplicate NORAD id {}", norad_id.value());
            return SatTrackerError::DuplicateNoradId(norad_id.value());
        }
    }
    SatTrackerError::DatabaseError(e)
}

/// Escape LIKE wildcards so the pattern matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
