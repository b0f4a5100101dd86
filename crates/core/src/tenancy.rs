//! Rules for creating tenant records. Storage and the upstream identity lookup are
//! supplied by the caller; nothing here performs I/O.

use secrecy::{ExposeSecret, SecretString};

use crate::domain::tenant::{BotIdentity, LifecycleAction, NewTenant, Tenant};
use crate::errors::ApplicationError;

/// Bot token and verification key an owner submits for a secondary tenant.
#[derive(Clone, Debug)]
pub struct CredentialMaterial {
    pub token: SecretString,
    pub public_key: String,
}

impl CredentialMaterial {
    pub fn new(token: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self { token: SecretString::from(token.into()), public_key: public_key.into() }
    }

    /// Shape checks done before any upstream call.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let token = self.token.expose_secret();
        if token.trim().is_empty() || token.chars().any(char::is_whitespace) {
            return Err(ApplicationError::InvalidCredential("Invalid bot token".to_string()));
        }

        let key = self.public_key.trim();
        if key.len() != 64 || !key.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(ApplicationError::InvalidCredential(
                "Public key must be the 64 character hex key from the developer portal"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// First record for an owner that has no tenant yet.
///
/// `claimed_by` is the newest stored record carrying the same external id, if any.
pub fn plan_registration(
    owner_id: &str,
    material: &CredentialMaterial,
    identity: BotIdentity,
    claimed_by: Option<&Tenant>,
) -> Result<NewTenant, ApplicationError> {
    material.validate()?;
    ensure_unclaimed(owner_id, &identity, claimed_by)?;

    Ok(NewTenant {
        id: crate::domain::tenant::TenantId(identity.external_id),
        owner_id: owner_id.to_string(),
        token: material.token.clone(),
        public_key: material.public_key.trim().to_string(),
        action: LifecycleAction::Start,
        display_name: identity.display_name,
        discriminator: identity.discriminator,
        avatar_ref: identity.avatar_ref,
        supersedes: None,
    })
}

/// Replacement record for an owner's existing tenant.
///
/// Ownership carries over from `prior`. Credentials and the identity derived from them
/// come from the new material. `prior` itself is left untouched.
pub fn plan_reissue(
    prior: &Tenant,
    material: &CredentialMaterial,
    identity: BotIdentity,
    claimed_by: Option<&Tenant>,
) -> Result<NewTenant, ApplicationError> {
    material.validate()?;
    ensure_unclaimed(&prior.owner_id, &identity, claimed_by)?;

    Ok(NewTenant {
        id: crate::domain::tenant::TenantId(identity.external_id),
        owner_id: prior.owner_id.clone(),
        token: material.token.clone(),
        public_key: material.public_key.trim().to_string(),
        action: LifecycleAction::Recreate,
        display_name: identity.display_name,
        discriminator: identity.discriminator,
        avatar_ref: identity.avatar_ref,
        supersedes: Some(prior.record_id),
    })
}

fn ensure_unclaimed(
    owner_id: &str,
    identity: &BotIdentity,
    claimed_by: Option<&Tenant>,
) -> Result<(), ApplicationError> {
    match claimed_by {
        Some(existing) if existing.owner_id != owner_id => Err(ApplicationError::Conflict(
            format!("Bot `{}` is already registered to another user", identity.external_id),
        )),
        _ => Ok(()),
    }
}
