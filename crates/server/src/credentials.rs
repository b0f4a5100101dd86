use std::sync::Arc;

use secrecy::SecretString;

use prosperity_core::config::DiscordConfig;
use prosperity_core::errors::ApplicationError;
use prosperity_core::TenantId;
use prosperity_db::repositories::TenantRepository;

/// The built-in bot, configured statically rather than stored.
#[derive(Clone, Debug)]
pub struct PrimaryTenant {
    pub id: TenantId,
    pub public_key: String,
    pub token: SecretString,
}

impl PrimaryTenant {
    pub fn from_config(config: &DiscordConfig) -> Self {
        Self {
            id: TenantId(config.primary_bot_id.clone()),
            public_key: config.public_key.clone(),
            token: config.bot_token.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedCredential {
    pub tenant_id: TenantId,
    pub public_key: String,
    pub token: SecretString,
    pub is_primary: bool,
}

/// Maps a tenant id from the webhook path to the key its requests are signed with.
#[derive(Clone)]
pub struct CredentialResolver {
    primary: PrimaryTenant,
    tenants: Arc<dyn TenantRepository>,
}

impl CredentialResolver {
    pub fn new(primary: PrimaryTenant, tenants: Arc<dyn TenantRepository>) -> Self {
        Self { primary, tenants }
    }

    pub fn primary(&self) -> &PrimaryTenant {
        &self.primary
    }

    /// `None` for an unknown, deleted or superseded tenant.
    pub async fn resolve(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<ResolvedCredential>, ApplicationError> {
        if *tenant_id == self.primary.id {
            return Ok(Some(ResolvedCredential {
                tenant_id: self.primary.id.clone(),
                public_key: self.primary.public_key.clone(),
                token: self.primary.token.clone(),
                is_primary: true,
            }));
        }

        let tenant = self.tenants.find_active(tenant_id).await?;
        Ok(tenant.map(|tenant| ResolvedCredential {
            tenant_id: tenant.id,
            public_key: tenant.public_key,
            token: tenant.token,
            is_primary: false,
        }))
    }
}
