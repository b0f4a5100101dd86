//! Webhook entry point: resolve the tenant, check the signature, dispatch.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{debug, error, info, warn};

use prosperity_core::TenantId;
use prosperity_discord::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use prosperity_discord::{DispatchRouter, InteractionEnvelope, RouteOutcome};

use crate::credentials::CredentialResolver;

#[derive(Clone)]
pub struct GatewayState {
    resolver: CredentialResolver,
    dispatch: Arc<DispatchRouter>,
}

impl GatewayState {
    pub fn new(resolver: CredentialResolver, dispatch: DispatchRouter) -> Self {
        Self { resolver, dispatch: Arc::new(dispatch) }
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new().route("/interactions/{tenant_id}", post(interactions)).with_state(state)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

pub async fn interactions(
    State(state): State<GatewayState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let tenant_id = TenantId(tenant_id);

    let credential = match state.resolver.resolve(&tenant_id).await {
        Ok(Some(credential)) => credential,
        Ok(None) => {
            info!(
                event_name = "interaction.tenant.unknown",
                correlation_id = "unverified",
                tenant_id = %tenant_id,
                "no active tenant for webhook path"
            );
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(failure) => {
            error!(
                event_name = "interaction.tenant.resolve_failed",
                correlation_id = "unverified",
                tenant_id = %tenant_id,
                error = %failure,
                "credential lookup failed"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let verified = match (header(&headers, SIGNATURE_HEADER), header(&headers, TIMESTAMP_HEADER)) {
        (Some(signature), Some(timestamp)) => {
            signature::authenticate(&body, timestamp, signature, &credential.public_key)
        }
        _ => false,
    };
    if !verified {
        warn!(
            event_name = "interaction.signature.rejected",
            correlation_id = "unverified",
            tenant_id = %tenant_id,
            "interaction signature missing or invalid"
        );
        return StatusCode::UNAUTHORIZED.into_response();
    }
    debug!(
        event_name = "interaction.signature.verified",
        correlation_id = "unverified",
        tenant_id = %credential.tenant_id,
        is_primary = credential.is_primary,
        "interaction signature verified"
    );

    let envelope = match InteractionEnvelope::parse(tenant_id, &body) {
        Ok(envelope) => envelope,
        Err(failure) => {
            warn!(
                event_name = "interaction.payload.rejected",
                correlation_id = "unverified",
                tenant_id = %credential.tenant_id,
                error = %failure,
                "verified interaction payload could not be parsed"
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.dispatch.route(&envelope).await {
        RouteOutcome::Respond(response) => Json(response).into_response(),
        RouteOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
    }
}
