use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use thiserror::Error;

use crate::entities::Entry;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("entry {0} not found")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage seam for entries. The acquisition pipeline is the only writer of
/// `readable_content`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Entry, RepositoryError>;

    /// Store readable content for an entry that has none yet.
    ///
    /// Returns `false` when the entry already carried non-empty content, in
    /// which case nothing was written.
    async fn update_readable_content(&self, id: i64, html: &str) -> Result<bool, RepositoryError>;

    /// Ids above `after_id` of entries with a source URL but no readable
    /// content, ascending.
    async fn list_missing_readable(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>, RepositoryError>;
}

#[derive(Clone)]
pub struct PgEntryRepository {
    pool: Pool<Postgres>,
}

impl PgEntryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryRepository for PgEntryRepository {
    async fn get_by_id(&self, id: i64) -> Result<Entry, RepositoryError> {
        sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, url, readable_content
            FROM entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound(id))
    }

    async fn update_readable_content(&self, id: i64, html: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET readable_content = $2,
                updated_at = now()
            WHERE id = $1
              AND (readable_content IS NULL OR readable_content = '')
            "#,
        )
        .bind(id)
        .bind(html)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Distinguish "already populated" from "gone".
        self.get_by_id(id).await?;
        Ok(false)
    }

    async fn list_missing_readable(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM entries
            WHERE url IS NOT NULL AND url <> ''
              AND (readable_content IS NULL OR readable_content = '')
              AND id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
