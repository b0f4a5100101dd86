use serde::{Deserialize, Serialize};

/// Experience record for one user in one community.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMember {
    pub community_id: String,
    pub user_id: String,
    pub xp: i64,
    pub level: i64,
}

impl CommunityMember {
    pub fn new(community_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { community_id: community_id.into(), user_id: user_id.into(), xp: 0, level: 0 }
    }
}

/// A member's position on a community leaderboard. Ranks are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedMember {
    pub rank: i64,
    pub member: CommunityMember,
    pub username: Option<String>,
}

impl RankedMember {
    /// Stored username when known, otherwise a mention.
    pub fn display_name(&self) -> String {
        self.username.clone().unwrap_or_else(|| format!("<@{}>", self.member.user_id))
    }
}
