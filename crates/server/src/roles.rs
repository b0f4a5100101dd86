//! Level-role grants through the platform, applied best-effort after durable writes.

use async_trait::async_trait;
use tracing::warn;

use prosperity_core::errors::ApplicationError;
use prosperity_core::leveling::{plan_role_sync, role_grant_window, RoleSyncPlan};
use prosperity_core::{CommunityMember, LevelRoleBinding, TenantId};
use prosperity_discord::rest::{DiscordRestClient, RestError, RoleSink};
use prosperity_discord::RequestContext;

use crate::credentials::CredentialResolver;
use crate::services::Repositories;

/// Acts with the bot token of whichever tenant received the interaction.
pub struct TenantRoleSink {
    resolver: CredentialResolver,
    rest: DiscordRestClient,
}

impl TenantRoleSink {
    pub fn new(resolver: CredentialResolver, rest: DiscordRestClient) -> Self {
        Self { resolver, rest }
    }

    async fn token(&self, tenant: &TenantId) -> Result<secrecy::SecretString, RestError> {
        match self.resolver.resolve(tenant).await {
            Ok(Some(credential)) => Ok(credential.token),
            Ok(None) | Err(_) => Err(RestError::UnknownTenant(tenant.to_string())),
        }
    }
}

#[async_trait]
impl RoleSink for TenantRoleSink {
    async fn grant(
        &self,
        tenant: &TenantId,
        community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError> {
        let token = self.token(tenant).await?;
        self.rest.add_member_role(&token, community_id, user_id, role_id).await
    }

    async fn revoke(
        &self,
        tenant: &TenantId,
        community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError> {
        let token = self.token(tenant).await?;
        self.rest.remove_member_role(&token, community_id, user_id, role_id).await
    }
}

/// Brings a member's level roles in line with their level. Failures are logged only;
/// the xp/level write that preceded this call stays committed.
pub async fn sync_member_roles(
    repos: &Repositories,
    sink: &dyn RoleSink,
    ctx: &RequestContext,
    member: &CommunityMember,
) -> RoleSyncPlan {
    let loaded = async {
        let bindings = repos.level_roles.list(&member.community_id).await?;
        let settings = repos.communities.settings(&member.community_id).await?;
        Ok::<_, prosperity_db::repositories::RepositoryError>((bindings, settings))
    }
    .await;

    let (bindings, settings) = match loaded {
        Ok(loaded) => loaded,
        Err(error) => {
            warn!(
                event_name = "leveling.roles.sync_skipped",
                correlation_id = %ctx.correlation_id,
                community_id = %member.community_id,
                user_id = %member.user_id,
                error = %error,
                "could not load level roles for sync"
            );
            return RoleSyncPlan::default();
        }
    };

    let plan = plan_role_sync(&bindings, member.level, settings.role_assign_mode);
    for role_id in &plan.grant {
        if let Err(error) =
            sink.grant(&ctx.tenant_id, &member.community_id, &member.user_id, role_id).await
        {
            log_role_failure(ctx, member, role_id, "grant", &error);
        }
    }
    for role_id in &plan.revoke {
        if let Err(error) =
            sink.revoke(&ctx.tenant_id, &member.community_id, &member.user_id, role_id).await
        {
            log_role_failure(ctx, member, role_id, "revoke", &error);
        }
    }
    plan
}

/// Grants a newly created binding's role to every member inside its level window.
/// Returns how many members were targeted.
pub async fn grant_new_binding(
    repos: &Repositories,
    sink: &dyn RoleSink,
    ctx: &RequestContext,
    binding: &LevelRoleBinding,
) -> Result<usize, ApplicationError> {
    let bindings = repos.level_roles.list(&binding.community_id).await?;
    let window = role_grant_window(&bindings, binding.level);
    let members =
        repos.members.list_in_level_range(&binding.community_id, window.start, window.end).await?;

    for member in &members {
        if let Err(error) =
            sink.grant(&ctx.tenant_id, &binding.community_id, &member.user_id, &binding.role_id).await
        {
            log_role_failure(ctx, member, &binding.role_id, "grant", &error);
        }
    }
    Ok(members.len())
}

fn log_role_failure(
    ctx: &RequestContext,
    member: &CommunityMember,
    role_id: &str,
    operation: &'static str,
    error: &RestError,
) {
    warn!(
        event_name = "leveling.roles.sync_failed",
        correlation_id = %ctx.correlation_id,
        community_id = %member.community_id,
        user_id = %member.user_id,
        role_id,
        operation,
        error = %error,
        "level role update failed"
    );
}
