use sqlx::Row;

use prosperity_core::domain::community::AboutStats;
use prosperity_core::domain::member::{CommunityMember, RankedMember};

use super::{MemberRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMemberRepository {
    pool: DbPool,
}

impl SqlMemberRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<CommunityMember, RepositoryError> {
    Ok(CommunityMember {
        community_id: row.try_get("community_id").map_err(RepositoryError::decode)?,
        user_id: row.try_get("user_id").map_err(RepositoryError::decode)?,
        xp: row.try_get("xp").map_err(RepositoryError::decode)?,
        level: row.try_get("level").map_err(RepositoryError::decode)?,
    })
}

#[async_trait::async_trait]
impl MemberRepository for SqlMemberRepository {
    async fn find(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<CommunityMember>, RepositoryError> {
        let row = sqlx::query(
            "SELECT community_id, user_id, xp, level
             FROM community_members WHERE community_id = ? AND user_id = ?",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_member).transpose()
    }

    async fn save_progress(&self, member: &CommunityMember) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO community_members (community_id, user_id, xp, level)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(community_id, user_id) DO UPDATE SET
                 xp = excluded.xp,
                 level = excluded.level",
        )
        .bind(&member.community_id)
        .bind(&member.user_id)
        .bind(member.xp)
        .bind(member.level)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_in_level_range(
        &self,
        community_id: &str,
        start: i64,
        end: Option<i64>,
    ) -> Result<Vec<CommunityMember>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT community_id, user_id, xp, level
             FROM community_members
             WHERE community_id = ? AND level >= ? AND (? IS NULL OR level < ?)
             ORDER BY user_id",
        )
        .bind(community_id)
        .bind(start)
        .bind(end)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_member).collect()
    }

    async fn count(&self, community_id: &str) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM community_members WHERE community_id = ?")
                .bind(community_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn leaderboard(
        &self,
        community_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedMember>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT m.community_id, m.user_id, m.xp, m.level, u.username
             FROM community_members m
             LEFT JOIN users u ON u.user_id = m.user_id
             WHERE m.community_id = ?
             ORDER BY m.xp DESC, m.user_id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(community_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| -> Result<RankedMember, RepositoryError> {
                Ok(RankedMember {
                    rank: offset + index as i64 + 1,
                    member: row_to_member(row)?,
                    username: row.try_get("username").map_err(RepositoryError::decode)?,
                })
            })
            .collect()
    }

    async fn about_stats(&self) -> Result<AboutStats, RepositoryError> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM communities WHERE active = 1) AS communities,
                    (SELECT COUNT(*) FROM community_members) AS members",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AboutStats {
            communities: row.try_get("communities").map_err(RepositoryError::decode)?,
            members: row.try_get("members").map_err(RepositoryError::decode)?,
        })
    }
}
