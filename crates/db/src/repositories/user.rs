use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn is_premium(&self, user_id: &str) -> Result<bool, RepositoryError> {
        let premium: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = ? AND premium = 1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(premium)
    }
}
