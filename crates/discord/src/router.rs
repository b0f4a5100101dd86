use std::sync::Arc;

use tracing::{debug, error, info};

use prosperity_core::errors::ApplicationError;

use crate::context::RequestContext;
use crate::interaction::{InteractionEnvelope, InteractionKind};
use crate::registry::HandlerRegistry;
use crate::responses::InteractionResponse;

#[derive(Clone, Debug, PartialEq)]
pub enum RouteOutcome {
    Respond(InteractionResponse),
    /// No handler is registered for the command name or component key.
    NotFound,
}

#[derive(Clone)]
pub struct DispatchRouter {
    registry: Arc<HandlerRegistry>,
}

impl DispatchRouter {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn route(&self, envelope: &InteractionEnvelope) -> RouteOutcome {
        let ctx = RequestContext::from_envelope(envelope);

        let (key, result) = match &envelope.kind {
            InteractionKind::Liveness => {
                debug!(
                    event_name = "interaction.liveness",
                    correlation_id = %ctx.correlation_id,
                    tenant_id = %ctx.tenant_id,
                    "answering ping"
                );
                return RouteOutcome::Respond(InteractionResponse::pong());
            }
            InteractionKind::Command(invocation) => {
                let Some(handler) = self.registry.command(&invocation.name) else {
                    info!(
                        event_name = "interaction.command.unknown",
                        correlation_id = %ctx.correlation_id,
                        command = %invocation.name,
                        "no handler for command"
                    );
                    return RouteOutcome::NotFound;
                };
                (invocation.name.as_str(), handler.execute(&ctx, invocation).await)
            }
            InteractionKind::Component(activation) => {
                let Some(handler) = self.registry.component(&activation.custom_id) else {
                    info!(
                        event_name = "interaction.component.unknown",
                        correlation_id = %ctx.correlation_id,
                        custom_id = %activation.custom_id,
                        "no handler for component"
                    );
                    return RouteOutcome::NotFound;
                };
                (activation.custom_id.as_str(), handler.execute(&ctx, activation).await)
            }
        };

        match result {
            Ok(response) => {
                info!(
                    event_name = "interaction.handled",
                    correlation_id = %ctx.correlation_id,
                    tenant_id = %ctx.tenant_id,
                    key,
                    "interaction handled"
                );
                RouteOutcome::Respond(response)
            }
            Err(failure) => RouteOutcome::Respond(failure_response(&ctx, key, failure)),
        }
    }
}

fn failure_response(ctx: &RequestContext, key: &str, failure: ApplicationError) -> InteractionResponse {
    if failure.is_internal() {
        error!(
            event_name = "interaction.failed",
            correlation_id = %ctx.correlation_id,
            tenant_id = %ctx.tenant_id,
            key,
            error = %failure,
            "handler failed"
        );
    } else {
        info!(
            event_name = "interaction.rejected",
            correlation_id = %ctx.correlation_id,
            key,
            reason = %failure,
            "handler rejected interaction"
        );
    }

    let interface = failure.into_interface(ctx.correlation_id.clone());
    InteractionResponse::error(interface.user_message())
}
