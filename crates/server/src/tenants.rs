use std::sync::Arc;

use tracing::{info, warn};

use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::tenancy::{plan_registration, plan_reissue};
use prosperity_core::{
    BotIdentity, CredentialMaterial, LifecycleAction, NewTenant, Tenant, TenantId,
};
use prosperity_db::repositories::{RepositoryError, TenantRepository};
use prosperity_discord::rest::IdentityService;

pub const CONCURRENT_UPDATE: &str =
    "This whitelabel bot was updated concurrently, please retry";

/// Registers, re-keys and transitions secondary tenants.
#[derive(Clone)]
pub struct TenantLifecycleManager {
    tenants: Arc<dyn TenantRepository>,
    identity: Arc<dyn IdentityService>,
}

impl TenantLifecycleManager {
    pub fn new(tenants: Arc<dyn TenantRepository>, identity: Arc<dyn IdentityService>) -> Self {
        Self { tenants, identity }
    }

    async fn identify(&self, material: &CredentialMaterial) -> Result<BotIdentity, ApplicationError> {
        material.validate()?;
        self.identity.identify(&material.token).await.map_err(|error| {
            warn!(
                event_name = "tenant.identify_failed",
                correlation_id = "tenant",
                error = %error,
                "identity lookup for submitted bot token failed"
            );
            ApplicationError::InvalidCredential("Invalid bot token".to_string())
        })
    }

    /// Inserts a planned record. Losing a race against another write of the same
    /// bot or the same prior record is reported as a retryable conflict.
    async fn store(&self, planned: NewTenant) -> Result<Tenant, ApplicationError> {
        let tenant_id = planned.id.clone();
        self.tenants.insert(planned).await.map_err(|error| match error {
            RepositoryError::Conflict(detail) => {
                warn!(
                    event_name = "tenant.write_conflict",
                    correlation_id = "tenant",
                    tenant_id = %tenant_id,
                    error = %detail,
                    "tenant record changed concurrently"
                );
                ApplicationError::Conflict(CONCURRENT_UPDATE.to_string())
            }
            other => other.into(),
        })
    }

    pub async fn register(
        &self,
        owner_id: &str,
        material: CredentialMaterial,
    ) -> Result<Tenant, ApplicationError> {
        let identity = self.identify(&material).await?;
        let claimed = self.tenants.find_current(&TenantId(identity.external_id.clone())).await?;
        let planned = plan_registration(owner_id, &material, identity, claimed.as_ref())?;

        let tenant = self.store(planned).await?;
        info!(
            event_name = "tenant.registered",
            correlation_id = "tenant",
            tenant_id = %tenant.id,
            owner_id,
            "secondary tenant registered"
        );
        Ok(tenant)
    }

    /// Replaces the owner's current tenant with one built from new credentials.
    pub async fn reissue(
        &self,
        owner_id: &str,
        material: CredentialMaterial,
    ) -> Result<Tenant, ApplicationError> {
        let prior = self.tenants.find_current_for_owner(owner_id).await?.ok_or_else(|| {
            ApplicationError::NotFound("You don't have any whitelabel bots".to_string())
        })?;

        let identity = self.identify(&material).await?;
        let claimed = self.tenants.find_current(&TenantId(identity.external_id.clone())).await?;
        let planned = plan_reissue(&prior, &material, identity, claimed.as_ref())?;

        let tenant = self.store(planned).await?;
        info!(
            event_name = "tenant.reissued",
            correlation_id = "tenant",
            tenant_id = %tenant.id,
            supersedes = %prior.id,
            owner_id,
            "secondary tenant re-issued"
        );
        Ok(tenant)
    }

    /// Registers on first use, re-issues when the owner already has a tenant.
    pub async fn setup(
        &self,
        owner_id: &str,
        material: CredentialMaterial,
    ) -> Result<Tenant, ApplicationError> {
        if self.tenants.find_current_for_owner(owner_id).await?.is_some() {
            self.reissue(owner_id, material).await
        } else {
            self.register(owner_id, material).await
        }
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Tenant>, ApplicationError> {
        Ok(self.tenants.list_for_owner(owner_id).await?)
    }

    /// Any selectable action is accepted from any state.
    pub async fn set_action(
        &self,
        tenant_id: &TenantId,
        action: LifecycleAction,
    ) -> Result<(), ApplicationError> {
        if !LifecycleAction::selectable().contains(&action) {
            return Err(DomainError::UnknownLifecycleAction(action.as_str().to_string()).into());
        }

        if !self.tenants.set_action(tenant_id, action).await? {
            return Err(ApplicationError::NotFound(format!("Whitelabel bot `{tenant_id}` does not exist")));
        }

        info!(
            event_name = "tenant.action_set",
            correlation_id = "tenant",
            tenant_id = %tenant_id,
            action = action.as_str(),
            "tenant lifecycle action updated"
        );
        Ok(())
    }

    /// `set_action` restricted to the tenant's owner.
    pub async fn set_action_as_owner(
        &self,
        owner_id: &str,
        tenant_id: &TenantId,
        action: LifecycleAction,
    ) -> Result<(), ApplicationError> {
        let tenant = self.tenants.find_current(tenant_id).await?.ok_or_else(|| {
            ApplicationError::NotFound(format!("Whitelabel bot `{tenant_id}` does not exist"))
        })?;
        if tenant.owner_id != owner_id {
            return Err(ApplicationError::PermissionDenied(
                "You can only manage your own whitelabel bots".to_string(),
            ));
        }
        self.set_action(tenant_id, action).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use prosperity_core::errors::ApplicationError;
    use prosperity_core::{CredentialMaterial, LifecycleAction, NewTenant, Tenant, TenantId};
    use prosperity_db::repositories::{
        InMemoryTenantRepository, RepositoryError, TenantRepository,
    };

    use super::{TenantLifecycleManager, CONCURRENT_UPDATE};
    use crate::testing::StubIdentityService;

    /// Reports a fixed record as the owner's current tenant, as a request that read it
    /// before another re-issue committed would.
    struct StaleOwnerView {
        inner: Arc<InMemoryTenantRepository>,
        snapshot: Tenant,
    }

    #[async_trait]
    impl TenantRepository for StaleOwnerView {
        async fn find_active(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
            self.inner.find_active(id).await
        }

        async fn find_current(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
            self.inner.find_current(id).await
        }

        async fn find_current_for_owner(
            &self,
            _owner_id: &str,
        ) -> Result<Option<Tenant>, RepositoryError> {
            Ok(Some(self.snapshot.clone()))
        }

        async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Tenant>, RepositoryError> {
            self.inner.list_for_owner(owner_id).await
        }

        async fn list_active(&self) -> Result<Vec<Tenant>, RepositoryError> {
            self.inner.list_active().await
        }

        async fn insert(&self, tenant: NewTenant) -> Result<Tenant, RepositoryError> {
            self.inner.insert(tenant).await
        }

        async fn set_action(
            &self,
            id: &TenantId,
            action: LifecycleAction,
        ) -> Result<bool, RepositoryError> {
            self.inner.set_action(id, action).await
        }
    }

    fn key() -> String {
        "ab".repeat(32)
    }

    fn manager() -> (Arc<InMemoryTenantRepository>, TenantLifecycleManager) {
        let tenants = Arc::new(InMemoryTenantRepository::default());
        let identity = StubIdentityService::default()
            .with("token-a", "500")
            .with("token-b", "501")
            .with("token-c", "500");
        let manager = TenantLifecycleManager::new(tenants.clone(), Arc::new(identity));
        (tenants, manager)
    }

    #[tokio::test]
    async fn register_derives_identity_from_token() {
        let (_, manager) = manager();
        let tenant = manager.register("owner-1", CredentialMaterial::new("token-a", key())).await.expect("register");

        assert_eq!(tenant.id, TenantId("500".to_string()));
        assert_eq!(tenant.display_name, "Bot 500");
        assert_eq!(tenant.action, LifecycleAction::Start);
        assert_eq!(tenant.supersedes, None);
    }

    #[tokio::test]
    async fn refused_token_is_invalid_credential_and_writes_nothing() {
        let (tenants, manager) = manager();
        let error = manager
            .register("owner-1", CredentialMaterial::new("unknown-token", key()))
            .await
            .expect_err("refused");

        assert_eq!(error, ApplicationError::InvalidCredential("Invalid bot token".to_string()));
        assert!(tenants.list_for_owner("owner-1").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn malformed_key_is_rejected_before_lookup() {
        let (_, manager) = manager();
        let error = manager
            .register("owner-1", CredentialMaterial::new("token-a", "not-a-key"))
            .await
            .expect_err("bad key");
        assert!(matches!(error, ApplicationError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn bot_claimed_by_another_owner_conflicts() {
        let (_, manager) = manager();
        manager.register("owner-1", CredentialMaterial::new("token-a", key())).await.expect("first");

        let error = manager
            .register("owner-2", CredentialMaterial::new("token-c", key()))
            .await
            .expect_err("claimed");
        assert!(matches!(error, ApplicationError::Conflict(_)));
    }

    #[tokio::test]
    async fn setup_reissues_for_an_existing_owner() {
        let (tenants, manager) = manager();
        let prior = manager.setup("owner-1", CredentialMaterial::new("token-a", key())).await.expect("register");

        let next = manager
            .setup("owner-1", CredentialMaterial::new("token-b", "cd".repeat(32)))
            .await
            .expect("reissue");

        assert_eq!(next.id, TenantId("501".to_string()));
        assert_eq!(next.supersedes, Some(prior.record_id));
        assert_eq!(next.action, LifecycleAction::Recreate);
        assert_eq!(next.owner_id, "owner-1");
        assert!(tenants.find_active(&prior.id).await.expect("find").is_none());
        assert!(tenants.find_active(&next.id).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn reissue_without_prior_tenant_is_not_found() {
        let (_, manager) = manager();
        let error = manager
            .reissue("owner-1", CredentialMaterial::new("token-a", key()))
            .await
            .expect_err("no prior");
        assert!(matches!(error, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn any_selectable_transition_is_accepted() {
        let (tenants, manager) = manager();
        let tenant = manager.register("owner-1", CredentialMaterial::new("token-a", key())).await.expect("register");

        for action in [LifecycleAction::Delete, LifecycleAction::Stop, LifecycleAction::Delete, LifecycleAction::Restart] {
            manager.set_action(&tenant.id, action).await.expect("transition");
            let current = tenants.find_current(&tenant.id).await.expect("find").expect("current");
            assert_eq!(current.action, action);
        }

        let error = manager.set_action(&tenant.id, LifecycleAction::Recreate).await.expect_err("recreate");
        assert!(matches!(error, ApplicationError::Domain(_)));
        let error = manager
            .set_action(&TenantId("404".to_string()), LifecycleAction::Stop)
            .await
            .expect_err("unknown");
        assert!(matches!(error, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_change_actions() {
        let (_, manager) = manager();
        let tenant = manager.register("owner-1", CredentialMaterial::new("token-a", key())).await.expect("register");

        let error = manager
            .set_action_as_owner("intruder", &tenant.id, LifecycleAction::Delete)
            .await
            .expect_err("not owner");
        assert!(matches!(error, ApplicationError::PermissionDenied(_)));
        manager.set_action_as_owner("owner-1", &tenant.id, LifecycleAction::Stop).await.expect("owner");
    }

    #[tokio::test]
    async fn losing_a_concurrent_reissue_is_a_retryable_conflict() {
        let (tenants, manager) = manager();
        let prior = manager.register("owner-1", CredentialMaterial::new("token-a", key())).await.expect("register");
        manager.reissue("owner-1", CredentialMaterial::new("token-b", key())).await.expect("winner");

        let stale = StaleOwnerView { inner: tenants.clone(), snapshot: prior };
        let identity = StubIdentityService::default().with("token-d", "502");
        let loser = TenantLifecycleManager::new(Arc::new(stale), Arc::new(identity));

        let error = loser
            .reissue("owner-1", CredentialMaterial::new("token-d", key()))
            .await
            .expect_err("prior already superseded");

        assert_eq!(error, ApplicationError::Conflict(CONCURRENT_UPDATE.to_string()));
        let shown = error.into_interface("interaction-1");
        assert_eq!(shown.user_message(), CONCURRENT_UPDATE);
        assert!(tenants.find_current(&TenantId("502".to_string())).await.expect("find").is_none());
    }
}
