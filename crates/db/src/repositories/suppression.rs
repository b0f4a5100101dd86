use sqlx::Row;

use prosperity_core::domain::suppression::{SuppressionEntry, SuppressionKind};

use super::{RepositoryError, SuppressionRepository};
use crate::DbPool;

pub struct SqlSuppressionRepository {
    pool: DbPool,
}

impl SqlSuppressionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SuppressionRepository for SqlSuppressionRepository {
    async fn insert(&self, entry: &SuppressionEntry) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO suppressions (community_id, subject_id, kind) VALUES (?, ?, ?)")
            .bind(&entry.community_id)
            .bind(&entry.subject_id)
            .bind(entry.kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_write)?;

        Ok(())
    }

    async fn remove(&self, entry: &SuppressionEntry) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM suppressions WHERE community_id = ? AND subject_id = ? AND kind = ?",
        )
        .bind(&entry.community_id)
        .bind(&entry.subject_id)
        .bind(entry.kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        community_id: &str,
        kind: SuppressionKind,
    ) -> Result<Vec<SuppressionEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT subject_id FROM suppressions
             WHERE community_id = ? AND kind = ? ORDER BY subject_id",
        )
        .bind(community_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SuppressionEntry {
                    community_id: community_id.to_string(),
                    subject_id: row.try_get("subject_id").map_err(RepositoryError::decode)?,
                    kind,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()
    }
}
