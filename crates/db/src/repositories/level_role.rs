use sqlx::Row;

use prosperity_core::domain::level_role::LevelRoleBinding;

use super::{LevelRoleRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLevelRoleRepository {
    pool: DbPool,
}

impl SqlLevelRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LevelRoleRepository for SqlLevelRoleRepository {
    async fn list(&self, community_id: &str) -> Result<Vec<LevelRoleBinding>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT community_id, role_id, level FROM level_roles
             WHERE community_id = ? ORDER BY level ASC",
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LevelRoleBinding {
                    community_id: row.try_get("community_id").map_err(RepositoryError::decode)?,
                    role_id: row.try_get("role_id").map_err(RepositoryError::decode)?,
                    level: row.try_get("level").map_err(RepositoryError::decode)?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()
    }

    async fn insert(&self, binding: &LevelRoleBinding) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO level_roles (community_id, role_id, level) VALUES (?, ?, ?)")
            .bind(&binding.community_id)
            .bind(&binding.role_id)
            .bind(binding.level)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_write)?;

        Ok(())
    }

    async fn remove(&self, community_id: &str, role_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM level_roles WHERE community_id = ? AND role_id = ?")
            .bind(community_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
