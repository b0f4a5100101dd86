use std::sync::Arc;

use prosperity_db::repositories::{
    CommunityRepository, LevelRoleRepository, MemberRepository, SqlCommunityRepository,
    SqlLevelRoleRepository, SqlMemberRepository, SqlSuppressionRepository, SqlTenantRepository,
    SqlUserRepository, SuppressionRepository, TenantRepository, UserRepository,
};
use prosperity_db::DbPool;

/// Storage handles shared by every handler. Built once at bootstrap and cloned into
/// each component that needs it.
#[derive(Clone)]
pub struct Repositories {
    pub tenants: Arc<dyn TenantRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub level_roles: Arc<dyn LevelRoleRepository>,
    pub suppressions: Arc<dyn SuppressionRepository>,
    pub communities: Arc<dyn CommunityRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            tenants: Arc::new(SqlTenantRepository::new(pool.clone())),
            members: Arc::new(SqlMemberRepository::new(pool.clone())),
            level_roles: Arc::new(SqlLevelRoleRepository::new(pool.clone())),
            suppressions: Arc::new(SqlSuppressionRepository::new(pool.clone())),
            communities: Arc::new(SqlCommunityRepository::new(pool.clone())),
            users: Arc::new(SqlUserRepository::new(pool)),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        use prosperity_db::repositories::{
            InMemoryCommunityRepository, InMemoryLevelRoleRepository, InMemoryMemberRepository,
            InMemorySuppressionRepository, InMemoryTenantRepository, InMemoryUserRepository,
        };

        Self {
            tenants: Arc::new(InMemoryTenantRepository::default()),
            members: Arc::new(InMemoryMemberRepository::default()),
            level_roles: Arc::new(InMemoryLevelRoleRepository::default()),
            suppressions: Arc::new(InMemorySuppressionRepository::default()),
            communities: Arc::new(InMemoryCommunityRepository::default()),
            users: Arc::new(InMemoryUserRepository::default()),
        }
    }
}
