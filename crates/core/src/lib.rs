pub mod config;
pub mod domain;
pub mod errors;
pub mod leveling;
pub mod tenancy;

pub use domain::community::{AboutStats, CommunitySettings, NotificationMode, RoleAssignMode};
pub use domain::level_role::LevelRoleBinding;
pub use domain::member::{CommunityMember, RankedMember};
pub use domain::suppression::{SuppressionEntry, SuppressionKind};
pub use domain::tenant::{
    BotIdentity, LifecycleAction, NewTenant, Tenant, TenantId, TenantRecordId,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use tenancy::CredentialMaterial;
