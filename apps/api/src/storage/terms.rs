use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TermStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One key-value terminology row, keyed by `term`.
/// `mapping` holds every language's rendering of the entity (e.g. `EN`, `CHS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRow {
    pub term: String,
    pub entity_type: String,
    pub language: String,
    pub mapping: BTreeMap<String, String>,
}

#[async_trait]
pub trait TermStore: Send + Sync {
    /// Inserts the row, replacing any existing row with the same term.
    async fn upsert(&self, row: &TermRow) -> Result<(), TermStoreError>;
}

/// Postgres-backed store over:
///
/// ```sql
/// CREATE TABLE terminology (
///     term        TEXT PRIMARY KEY,
///     entity_type TEXT NOT NULL,
///     lang        TEXT NOT NULL,
///     mapping     JSONB NOT NULL
/// );
/// ```
#[derive(Clone)]
pub struct PgTermStore {
    pool: PgPool,
}

impl PgTermStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to the terminology database...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        info!("Terminology connection pool established");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TermStore for PgTermStore {
    async fn upsert(&self, row: &TermRow) -> Result<(), TermStoreError> {
        let mapping = serde_json::to_value(&row.mapping)?;

        sqlx::query(
            r#"
            INSERT INTO terminology (term, entity_type, lang, mapping)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (term) DO UPDATE
            SET entity_type = EXCLUDED.entity_type,
                lang = EXCLUDED.lang,
                mapping = EXCLUDED.mapping
            "#,
        )
        .bind(&row.term)
        .bind(&row.entity_type)
        .bind(&row.language)
        .bind(mapping)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
