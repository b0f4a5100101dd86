use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionKind {
    Channel,
    Role,
}

impl SuppressionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Role => "role",
        }
    }

    /// Mention syntax used when listing entries back to a member.
    pub fn mention(self, subject_id: &str) -> String {
        match self {
            Self::Channel => format!("<#{subject_id}>"),
            Self::Role => format!("<@&{subject_id}>"),
        }
    }
}

impl std::str::FromStr for SuppressionKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "channel" | "channels" => Ok(Self::Channel),
            "role" | "roles" => Ok(Self::Role),
            other => Err(DomainError::UnknownSuppressionKind(other.to_string())),
        }
    }
}

/// A channel or role exempt from experience accrual.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuppressionEntry {
    pub community_id: String,
    pub subject_id: String,
    pub kind: SuppressionKind,
}
