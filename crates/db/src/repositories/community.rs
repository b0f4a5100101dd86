use chrono::Utc;
use sqlx::Row;

use prosperity_core::domain::community::{CommunitySettings, NotificationMode, RoleAssignMode};

use super::{CommunityRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCommunityRepository {
    pool: DbPool,
}

impl SqlCommunityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_settings(row: &sqlx::sqlite::SqliteRow) -> Result<CommunitySettings, RepositoryError> {
    let notification_type: String =
        row.try_get("notification_type").map_err(RepositoryError::decode)?;
    let notification_channel: Option<String> =
        row.try_get("notification_channel").map_err(RepositoryError::decode)?;
    let role_assign_mode: String =
        row.try_get("role_assign_mode").map_err(RepositoryError::decode)?;

    Ok(CommunitySettings {
        community_id: row.try_get("community_id").map_err(RepositoryError::decode)?,
        notifications: NotificationMode::from_parts(&notification_type, notification_channel),
        role_assign_mode: role_assign_mode
            .parse::<RoleAssignMode>()
            .map_err(RepositoryError::decode)?,
        xp_rate: row.try_get("xp_rate").map_err(RepositoryError::decode)?,
        xp_delay_secs: row.try_get("xp_delay_secs").map_err(RepositoryError::decode)?,
    })
}

#[async_trait::async_trait]
impl CommunityRepository for SqlCommunityRepository {
    async fn settings(&self, community_id: &str) -> Result<CommunitySettings, RepositoryError> {
        let row = sqlx::query(
            "SELECT community_id, notification_type, notification_channel, role_assign_mode,
                    xp_rate, xp_delay_secs
             FROM communities WHERE community_id = ?",
        )
        .bind(community_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => row_to_settings(row),
            None => Ok(CommunitySettings::defaults(community_id)),
        }
    }

    async fn save_settings(&self, settings: &CommunitySettings) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO communities (community_id, notification_type, notification_channel,
                                      role_assign_mode, xp_rate, xp_delay_secs,
                                      created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(community_id) DO UPDATE SET
                 notification_type = excluded.notification_type,
                 notification_channel = excluded.notification_channel,
                 role_assign_mode = excluded.role_assign_mode,
                 xp_rate = excluded.xp_rate,
                 xp_delay_secs = excluded.xp_delay_secs,
                 updated_at = excluded.updated_at",
        )
        .bind(&settings.community_id)
        .bind(settings.notifications.kind())
        .bind(settings.notifications.channel_id())
        .bind(settings.role_assign_mode.as_str())
        .bind(settings.xp_rate)
        .bind(settings.xp_delay_secs)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use prosperity_core::domain::community::{
        CommunitySettings, NotificationMode, RoleAssignMode,
    };

    use super::SqlCommunityRepository;
    use crate::repositories::CommunityRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlCommunityRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlCommunityRepository::new(pool)
    }

    #[tokio::test]
    async fn unknown_community_gets_defaults() {
        let repo = setup().await;
        assert_eq!(repo.settings("g1").await.expect("settings"), CommunitySettings::defaults("g1"));
    }

    #[tokio::test]
    async fn saved_settings_are_read_back() {
        let repo = setup().await;
        let mut settings = CommunitySettings::defaults("g1");
        settings.notifications = NotificationMode::Channel("c9".to_string());
        settings.role_assign_mode = RoleAssignMode::Single;
        settings.xp_rate = 2.5;
        settings.xp_delay_secs = 30;
        repo.save_settings(&settings).await.expect("save");

        assert_eq!(repo.settings("g1").await.expect("settings"), settings);

        settings.notifications = NotificationMode::Dm;
        repo.save_settings(&settings).await.expect("save again");
        let reloaded = repo.settings("g1").await.expect("settings");
        assert_eq!(reloaded.notifications, NotificationMode::Dm);
        assert_eq!(reloaded.notifications.channel_id(), None);
    }
}
