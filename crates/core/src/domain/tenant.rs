use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// External bot id a tenant's webhook route is keyed by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Surrogate key of one stored tenant record. A re-issue creates a new record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantRecordId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
    Delete,
    Recreate,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Delete => "delete",
            Self::Recreate => "recreate",
        }
    }

    /// Actions an owner may pick. `Recreate` is only ever set by a re-issue.
    pub fn selectable() -> [Self; 4] {
        [Self::Start, Self::Stop, Self::Restart, Self::Delete]
    }

    /// Whether webhooks for a tenant in this state are still served.
    pub fn resolves(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl std::str::FromStr for LifecycleAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "delete" => Ok(Self::Delete),
            "recreate" => Ok(Self::Recreate),
            other => Err(DomainError::UnknownLifecycleAction(other.to_string())),
        }
    }
}

/// Identity the upstream platform reports for a bot token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub external_id: String,
    pub display_name: String,
    pub discriminator: String,
    pub avatar_ref: Option<String>,
}

/// A secondary ("whitelabel") bot identity. The primary tenant lives in config, not here.
#[derive(Clone, Debug)]
pub struct Tenant {
    pub record_id: TenantRecordId,
    pub id: TenantId,
    pub owner_id: String,
    pub token: SecretString,
    pub public_key: String,
    pub action: LifecycleAction,
    pub display_name: String,
    pub discriminator: String,
    pub avatar_ref: Option<String>,
    pub supersedes: Option<TenantRecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tenant record that has not been stored yet.
#[derive(Clone, Debug)]
pub struct NewTenant {
    pub id: TenantId,
    pub owner_id: String,
    pub token: SecretString,
    pub public_key: String,
    pub action: LifecycleAction,
    pub display_name: String,
    pub discriminator: String,
    pub avatar_ref: Option<String>,
    pub supersedes: Option<TenantRecordId>,
}
