use async_trait::async_trait;

use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::Tenant;
use prosperity_discord::responses::{ActionRow, Embed, SelectMenu, SelectOption, COLOR_DEFAULT};
use prosperity_discord::{ComponentActivation, ComponentHandler, InteractionResponse, RequestContext};

use super::whitelabel_actions;
use crate::tenants::TenantLifecycleManager;

pub const CUSTOM_ID: &str = "whitelabel::botselection";

/// One entry per tenant the owner has registered.
pub fn menu(tenants: &[Tenant]) -> ActionRow {
    let menu = tenants.iter().fold(
        SelectMenu::new(CUSTOM_ID).placeholder("Select a bot"),
        |menu, tenant| {
            menu.option(
                SelectOption::new(
                    format!("{}#{} ({})", tenant.display_name, tenant.discriminator, tenant.id),
                    tenant.id.to_string(),
                )
                .description(format!("Last Action: {}", tenant.action.as_str().to_uppercase())),
            )
        },
    );
    ActionRow::select(menu)
}

pub struct BotSelectionComponent {
    tenants: TenantLifecycleManager,
}

impl BotSelectionComponent {
    pub fn new(tenants: TenantLifecycleManager) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl ComponentHandler for BotSelectionComponent {
    fn custom_id(&self) -> &'static str {
        CUSTOM_ID
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        activation: &ComponentActivation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let actor_id = ctx.require_actor()?;
        let bot_id = activation
            .selected()
            .ok_or_else(|| DomainError::MissingOption("bot".to_string()))?;

        let owned = self.tenants.list_for_owner(actor_id).await?;
        if !owned.iter().any(|tenant| tenant.id.as_str() == bot_id) {
            return Err(ApplicationError::PermissionDenied(
                "You can only manage your own whitelabel bots".to_string(),
            ));
        }

        let embed = Embed::new()
            .description(format!("Select an action for the bot with id `{bot_id}`"))
            .color(COLOR_DEFAULT);
        Ok(InteractionResponse::embed(embed)
            .with_components(vec![whitelabel_actions::menu(bot_id)])
            .ephemeral())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use prosperity_core::errors::ApplicationError;
    use prosperity_core::CredentialMaterial;
    use prosperity_discord::{ComponentActivation, ComponentHandler};

    use super::{menu, BotSelectionComponent, CUSTOM_ID};
    use crate::services::Repositories;
    use crate::tenants::TenantLifecycleManager;
    use crate::testing::{context, StubIdentityService};

    fn manager(repos: &Repositories) -> TenantLifecycleManager {
        TenantLifecycleManager::new(
            repos.tenants.clone(),
            Arc::new(StubIdentityService::default().with("token-a", "500")),
        )
    }

    fn activation(bot_id: &str) -> ComponentActivation {
        ComponentActivation { custom_id: CUSTOM_ID.to_string(), component_type: 3, values: vec![bot_id.to_string()] }
    }

    #[tokio::test]
    async fn owner_gets_the_action_menu() {
        let repos = Repositories::in_memory();
        let manager = manager(&repos);
        let tenant = manager.register("owner-1", CredentialMaterial::new("token-a", "ab".repeat(32))).await.expect("register");

        let row = menu(&[tenant]);
        assert_eq!(row.components[0].options[0].label, "Bot 500#0001 (500)");
        assert_eq!(row.components[0].options[0].description.as_deref(), Some("Last Action: START"));

        let response = BotSelectionComponent::new(manager)
            .execute(&context("g1", "owner-1"), &activation("500"))
            .await
            .expect("select");
        assert_eq!(response.text(), Some("Select an action for the bot with id `500`"));
        let body = serde_json::to_value(&response).expect("serialize");
        assert_eq!(body["data"]["components"][0]["components"][0]["custom_id"], "whitelabel::actions_500");
    }

    #[tokio::test]
    async fn someone_elses_bot_is_refused() {
        let repos = Repositories::in_memory();
        let manager = manager(&repos);
        manager.register("owner-1", CredentialMaterial::new("token-a", "ab".repeat(32))).await.expect("register");

        let error = BotSelectionComponent::new(manager)
            .execute(&context("g1", "intruder"), &activation("500"))
            .await
            .expect_err("not owner");
        assert!(matches!(error, ApplicationError::PermissionDenied(_)));
    }
}
