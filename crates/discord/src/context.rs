use prosperity_core::errors::ApplicationError;
use prosperity_core::TenantId;

use crate::interaction::InteractionEnvelope;

/// Request-scoped identifiers handed to every handler in place of the raw envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: TenantId,
    pub community_id: Option<String>,
    pub actor_id: Option<String>,
    pub channel_id: Option<String>,
    pub correlation_id: String,
}

impl RequestContext {
    pub fn from_envelope(envelope: &InteractionEnvelope) -> Self {
        Self {
            tenant_id: envelope.tenant_id.clone(),
            community_id: envelope.community_id.clone(),
            actor_id: envelope.actor_id.clone(),
            channel_id: envelope.channel_id.clone(),
            correlation_id: envelope.id.clone(),
        }
    }

    pub fn require_community(&self) -> Result<&str, ApplicationError> {
        self.community_id.as_deref().ok_or_else(|| {
            ApplicationError::PermissionDenied("This command can only be used in a server".to_string())
        })
    }

    pub fn require_actor(&self) -> Result<&str, ApplicationError> {
        self.actor_id.as_deref().ok_or_else(|| {
            ApplicationError::PermissionDenied("Could not determine who sent this interaction".to_string())
        })
    }
}
