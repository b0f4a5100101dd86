use async_trait::async_trait;
use thiserror::Error;

use prosperity_core::domain::community::{AboutStats, CommunitySettings};
use prosperity_core::domain::level_role::LevelRoleBinding;
use prosperity_core::domain::member::{CommunityMember, RankedMember};
use prosperity_core::domain::suppression::{SuppressionEntry, SuppressionKind};
use prosperity_core::domain::tenant::{LifecycleAction, NewTenant, Tenant, TenantId};
use prosperity_core::errors::ApplicationError;

pub mod community;
pub mod level_role;
pub mod member;
pub mod memory;
pub mod suppression;
pub mod tenant;
pub mod user;

pub use community::SqlCommunityRepository;
pub use level_role::SqlLevelRoleRepository;
pub use member::SqlMemberRepository;
pub use memory::{
    InMemoryCommunityRepository, InMemoryLevelRoleRepository, InMemoryMemberRepository,
    InMemorySuppressionRepository, InMemoryTenantRepository, InMemoryUserRepository,
};
pub use suppression::SqlSuppressionRepository;
pub use tenant::SqlTenantRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Classifies a write failure, turning unique-constraint violations into `Conflict`.
    pub(crate) fn from_write(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Database(error),
        }
    }

    pub(crate) fn decode(error: impl std::fmt::Display) -> Self {
        Self::Decode(error.to_string())
    }
}

/// User-facing text for a unique violation that no handler translated. The storage
/// detail stays on the `RepositoryError`.
pub const CONFLICT_MESSAGE: &str = "This record was changed by another request, please retry";

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict(_) => Self::Conflict(CONFLICT_MESSAGE.to_string()),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Secondary tenant records. A record is current until a newer record supersedes it,
/// and resolvable while it is current and not deleted.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_active(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;

    /// Newest current record for `id` in any lifecycle state.
    async fn find_current(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;

    async fn find_current_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<Tenant>, RepositoryError>;

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Tenant>, RepositoryError>;

    async fn list_active(&self) -> Result<Vec<Tenant>, RepositoryError>;

    async fn insert(&self, tenant: NewTenant) -> Result<Tenant, RepositoryError>;

    /// Returns `false` when no current record exists for `id`.
    async fn set_action(
        &self,
        id: &TenantId,
        action: LifecycleAction,
    ) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<CommunityMember>, RepositoryError>;

    /// Writes xp and level together in one statement.
    async fn save_progress(&self, member: &CommunityMember) -> Result<(), RepositoryError>;

    /// Members with `start <= level` and, when `end` is set, `level < end`.
    async fn list_in_level_range(
        &self,
        community_id: &str,
        start: i64,
        end: Option<i64>,
    ) -> Result<Vec<CommunityMember>, RepositoryError>;

    async fn count(&self, community_id: &str) -> Result<i64, RepositoryError>;

    async fn leaderboard(
        &self,
        community_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedMember>, RepositoryError>;

    async fn about_stats(&self) -> Result<AboutStats, RepositoryError>;
}

#[async_trait]
pub trait LevelRoleRepository: Send + Sync {
    async fn list(&self, community_id: &str) -> Result<Vec<LevelRoleBinding>, RepositoryError>;

    /// Fails with `Conflict` when the role or the level is already bound.
    async fn insert(&self, binding: &LevelRoleBinding) -> Result<(), RepositoryError>;

    async fn remove(&self, community_id: &str, role_id: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait SuppressionRepository: Send + Sync {
    /// Fails with `Conflict` when the entry already exists.
    async fn insert(&self, entry: &SuppressionEntry) -> Result<(), RepositoryError>;

    async fn remove(&self, entry: &SuppressionEntry) -> Result<bool, RepositoryError>;

    async fn list(
        &self,
        community_id: &str,
        kind: SuppressionKind,
    ) -> Result<Vec<SuppressionEntry>, RepositoryError>;
}

#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Stored settings, or defaults for a community that never changed any.
    async fn settings(&self, community_id: &str) -> Result<CommunitySettings, RepositoryError>;

    async fn save_settings(&self, settings: &CommunitySettings) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn is_premium(&self, user_id: &str) -> Result<bool, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use prosperity_core::errors::ApplicationError;

    use super::{RepositoryError, CONFLICT_MESSAGE};

    #[test]
    fn conflict_hides_storage_detail() {
        let error = ApplicationError::from(RepositoryError::Conflict(
            "UNIQUE constraint failed: tenants.supersedes_record_id".to_string(),
        ));
        assert_eq!(error, ApplicationError::Conflict(CONFLICT_MESSAGE.to_string()));
    }

    #[test]
    fn decode_failure_is_persistence() {
        let error = ApplicationError::from(RepositoryError::decode("bad action `fly`"));
        assert!(error.is_internal());
    }
}
