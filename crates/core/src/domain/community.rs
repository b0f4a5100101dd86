use serde::{Deserialize, Serialize};

/// Where level-up announcements are posted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "channel_id")]
pub enum NotificationMode {
    Reply,
    Channel(String),
    Dm,
    Disable,
}

impl NotificationMode {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Channel(_) => "channel",
            Self::Dm => "dm",
            Self::Disable => "disable",
        }
    }

    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::Channel(channel_id) => Some(channel_id),
            _ => None,
        }
    }

    /// Rebuilds a mode from its stored columns. Unknown kinds fall back to replies.
    pub fn from_parts(kind: &str, channel_id: Option<String>) -> Self {
        match (kind, channel_id) {
            ("channel", Some(channel_id)) => Self::Channel(channel_id),
            ("dm", _) => Self::Dm,
            ("disable", _) => Self::Disable,
            _ => Self::Reply,
        }
    }
}

/// How level roles accumulate on a member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleAssignMode {
    #[default]
    Stack,
    Single,
}

impl RoleAssignMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::Single => "single",
        }
    }
}

impl std::str::FromStr for RoleAssignMode {
    type Err = crate::errors::DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "stack" => Ok(Self::Stack),
            "single" => Ok(Self::Single),
            other => Err(crate::errors::DomainError::InvariantViolation(format!(
                "role assignment type must be stack or single, got `{other}`"
            ))),
        }
    }
}

pub const MAX_XP_RATE: f64 = 10.0;
pub const MAX_XP_DELAY_SECS: i64 = 60 * 60 * 24;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunitySettings {
    pub community_id: String,
    pub notifications: NotificationMode,
    pub role_assign_mode: RoleAssignMode,
    pub xp_rate: f64,
    pub xp_delay_secs: i64,
}

impl CommunitySettings {
    pub fn defaults(community_id: impl Into<String>) -> Self {
        Self {
            community_id: community_id.into(),
            notifications: NotificationMode::Reply,
            role_assign_mode: RoleAssignMode::Stack,
            xp_rate: 1.0,
            xp_delay_secs: 60,
        }
    }
}

/// Totals shown by the `about` command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AboutStats {
    pub communities: i64,
    pub members: i64,
}
