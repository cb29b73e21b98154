//! Legacy flag mirror backed by PostgreSQL
//!
//! A mirror collection is a table and the flag field is a boolean column on
//! it. Records are addressed by their `id` column compared as text, so both
//! integer and text keys work.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use strata_core::{AuthzError, LegacyMirror, Result};

/// Seconds to wait for a pooled connection
const ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL limit on identifier length
const MAX_IDENTIFIER_LEN: usize = 63;

/// Quote a table or column name, rejecting anything but plain identifiers
fn quote_identifier(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(format!("\"{}\"", name))
    } else {
        Err(AuthzError::config_error(format!(
            "Invalid table or column name: {:?}",
            name
        )))
    }
}

/// PostgreSQL implementation of [`LegacyMirror`]
#[derive(Debug, Clone)]
pub struct PgLegacyMirror {
    pool: PgPool,
}

impl PgLegacyMirror {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool of at most `max_connections` to `url`
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(url)
            .await
            .map_err(|e| AuthzError::database_error(format!("Failed to connect: {}", e)))?;

        info!("Connected legacy mirror database");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LegacyMirror for PgLegacyMirror {
    #[instrument(skip(self))]
    async fn set_field(&self, collection: &str, id: &str, field: &str, value: bool) -> Result<()> {
        let query = format!(
            "UPDATE {} SET {} = $1 WHERE id::text = $2",
            quote_identifier(collection)?,
            quote_identifier(field)?
        );

        let result = sqlx::query(&query)
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthzError::database_error(e.to_string()))?;

        if result.rows_affected() == 0 {
            warn!("No {} record with id {} to update", collection, id);
        } else {
            debug!("Set {}.{} = {} for {}", collection, field, value, id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_flagged(&self, collection: &str, field: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT id::text AS id FROM {} WHERE {} = true ORDER BY id",
            quote_identifier(collection)?,
            quote_identifier(field)?
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthzError::database_error(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("id")
                    .map_err(|e| AuthzError::database_error(e.to_string()))
            })
            .collect()
    }
}
