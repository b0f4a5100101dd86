use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRoleBinding {
    pub community_id: String,
    pub role_id: String,
    pub level: i64,
}
