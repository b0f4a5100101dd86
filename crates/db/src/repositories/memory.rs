use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;

use prosperity_core::domain::community::{AboutStats, CommunitySettings};
use prosperity_core::domain::level_role::LevelRoleBinding;
use prosperity_core::domain::member::{CommunityMember, RankedMember};
use prosperity_core::domain::suppression::{SuppressionEntry, SuppressionKind};
use prosperity_core::domain::tenant::{
    LifecycleAction, NewTenant, Tenant, TenantId, TenantRecordId,
};

use super::{
    CommunityRepository, LevelRoleRepository, MemberRepository, RepositoryError,
    SuppressionRepository, TenantRepository, UserRepository,
};

#[derive(Default)]
pub struct InMemoryTenantRepository {
    records: RwLock<Vec<Tenant>>,
}

fn is_current(records: &[Tenant], tenant: &Tenant) -> bool {
    !records.iter().any(|other| other.supersedes == Some(tenant.record_id))
}

impl InMemoryTenantRepository {
    async fn newest_current(&self, matches: impl Fn(&Tenant) -> bool) -> Option<Tenant> {
        let records = self.records.read().await;
        records
            .iter()
            .rev()
            .find(|tenant| matches(tenant) && is_current(&records, tenant))
            .cloned()
    }
}

#[async_trait::async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_active(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.newest_current(|tenant| &tenant.id == id && tenant.action.resolves()).await)
    }

    async fn find_current(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.newest_current(|tenant| &tenant.id == id).await)
    }

    async fn find_current_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.newest_current(|tenant| tenant.owner_id == owner_id).await)
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Tenant>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|tenant| tenant.owner_id == owner_id && is_current(&records, tenant))
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|tenant| tenant.action.resolves() && is_current(&records, tenant))
            .cloned()
            .collect())
    }

    async fn insert(&self, tenant: NewTenant) -> Result<Tenant, RepositoryError> {
        let mut records = self.records.write().await;
        if let Some(prior) = tenant.supersedes {
            if records.iter().any(|other| other.supersedes == Some(prior)) {
                return Err(RepositoryError::Conflict(format!(
                    "record {} is already superseded",
                    prior.0
                )));
            }
        }

        let now = Utc::now();
        let stored = Tenant {
            record_id: TenantRecordId(records.len() as i64 + 1),
            id: tenant.id,
            owner_id: tenant.owner_id,
            token: tenant.token,
            public_key: tenant.public_key,
            action: tenant.action,
            display_name: tenant.display_name,
            discriminator: tenant.discriminator,
            avatar_ref: tenant.avatar_ref,
            supersedes: tenant.supersedes,
            created_at: now,
            updated_at: now,
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn set_action(
        &self,
        id: &TenantId,
        action: LifecycleAction,
    ) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        let superseded: HashSet<TenantRecordId> =
            records.iter().filter_map(|tenant| tenant.supersedes).collect();

        let mut matched = false;
        for tenant in records.iter_mut() {
            if &tenant.id == id && !superseded.contains(&tenant.record_id) {
                tenant.action = action;
                tenant.updated_at = Utc::now();
                matched = true;
            }
        }
        Ok(matched)
    }
}

#[derive(Default)]
pub struct InMemoryMemberRepository {
    members: RwLock<HashMap<(String, String), CommunityMember>>,
}

#[async_trait::async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<CommunityMember>, RepositoryError> {
        let members = self.members.read().await;
        Ok(members.get(&(community_id.to_string(), user_id.to_string())).cloned())
    }

    async fn save_progress(&self, member: &CommunityMember) -> Result<(), RepositoryError> {
        let mut members = self.members.write().await;
        members.insert((member.community_id.clone(), member.user_id.clone()), member.clone());
        Ok(())
    }

    async fn list_in_level_range(
        &self,
        community_id: &str,
        start: i64,
        end: Option<i64>,
    ) -> Result<Vec<CommunityMember>, RepositoryError> {
        let members = self.members.read().await;
        let mut found: Vec<CommunityMember> = members
            .values()
            .filter(|member| {
                member.community_id == community_id
                    && member.level >= start
                    && end.map_or(true, |end| member.level < end)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(found)
    }

    async fn count(&self, community_id: &str) -> Result<i64, RepositoryError> {
        let members = self.members.read().await;
        Ok(members.values().filter(|member| member.community_id == community_id).count() as i64)
    }

    async fn leaderboard(
        &self,
        community_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedMember>, RepositoryError> {
        let members = self.members.read().await;
        let mut ordered: Vec<&CommunityMember> =
            members.values().filter(|member| member.community_id == community_id).collect();
        ordered.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.user_id.cmp(&b.user_id)));

        Ok(ordered
            .into_iter()
            .enumerate()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(index, member)| RankedMember {
                rank: index as i64 + 1,
                member: member.clone(),
                username: None,
            })
            .collect())
    }

    async fn about_stats(&self) -> Result<AboutStats, RepositoryError> {
        let members = self.members.read().await;
        let communities: BTreeSet<&String> = members.keys().map(|(community, _)| community).collect();
        Ok(AboutStats { communities: communities.len() as i64, members: members.len() as i64 })
    }
}

#[derive(Default)]
pub struct InMemoryLevelRoleRepository {
    bindings: RwLock<Vec<LevelRoleBinding>>,
}

#[async_trait::async_trait]
impl LevelRoleRepository for InMemoryLevelRoleRepository {
    async fn list(&self, community_id: &str) -> Result<Vec<LevelRoleBinding>, RepositoryError> {
        let bindings = self.bindings.read().await;
        let mut found: Vec<LevelRoleBinding> =
            bindings.iter().filter(|b| b.community_id == community_id).cloned().collect();
        found.sort_by_key(|binding| binding.level);
        Ok(found)
    }

    async fn insert(&self, binding: &LevelRoleBinding) -> Result<(), RepositoryError> {
        let mut bindings = self.bindings.write().await;
        let clash = bindings.iter().any(|existing| {
            existing.community_id == binding.community_id
                && (existing.role_id == binding.role_id || existing.level == binding.level)
        });
        if clash {
            return Err(RepositoryError::Conflict(format!(
                "role {} or level {} already bound",
                binding.role_id, binding.level
            )));
        }
        bindings.push(binding.clone());
        Ok(())
    }

    async fn remove(&self, community_id: &str, role_id: &str) -> Result<bool, RepositoryError> {
        let mut bindings = self.bindings.write().await;
        let before = bindings.len();
        bindings.retain(|b| !(b.community_id == community_id && b.role_id == role_id));
        Ok(bindings.len() != before)
    }
}

#[derive(Default)]
pub struct InMemorySuppressionRepository {
    entries: RwLock<BTreeSet<(String, &'static str, String)>>,
}

#[async_trait::async_trait]
impl SuppressionRepository for InMemorySuppressionRepository {
    async fn insert(&self, entry: &SuppressionEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let key = (entry.community_id.clone(), entry.kind.as_str(), entry.subject_id.clone());
        if !entries.insert(key) {
            return Err(RepositoryError::Conflict(format!(
                "{} {} already suppressed",
                entry.kind.as_str(),
                entry.subject_id
            )));
        }
        Ok(())
    }

    async fn remove(&self, entry: &SuppressionEntry) -> Result<bool, RepositoryError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&(
            entry.community_id.clone(),
            entry.kind.as_str(),
            entry.subject_id.clone(),
        )))
    }

    async fn list(
        &self,
        community_id: &str,
        kind: SuppressionKind,
    ) -> Result<Vec<SuppressionEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(community, stored_kind, _)| {
                community == community_id && *stored_kind == kind.as_str()
            })
            .map(|(community, _, subject)| SuppressionEntry {
                community_id: community.clone(),
                subject_id: subject.clone(),
                kind,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCommunityRepository {
    settings: RwLock<BTreeMap<String, CommunitySettings>>,
}

#[async_trait::async_trait]
impl CommunityRepository for InMemoryCommunityRepository {
    async fn settings(&self, community_id: &str) -> Result<CommunitySettings, RepositoryError> {
        let settings = self.settings.read().await;
        Ok(settings
            .get(community_id)
            .cloned()
            .unwrap_or_else(|| CommunitySettings::defaults(community_id)))
    }

    async fn save_settings(&self, settings: &CommunitySettings) -> Result<(), RepositoryError> {
        let mut stored = self.settings.write().await;
        stored.insert(settings.community_id.clone(), settings.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    premium: RwLock<HashSet<String>>,
}

impl InMemoryUserRepository {
    pub fn with_premium<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { premium: RwLock::new(user_ids.into_iter().map(Into::into).collect()) }
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn is_premium(&self, user_id: &str) -> Result<bool, RepositoryError> {
        Ok(self.premium.read().await.contains(user_id))
    }
}
