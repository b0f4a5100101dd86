use async_trait::async_trait;

use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::{LifecycleAction, TenantId};
use prosperity_discord::responses::{ActionRow, SelectMenu, SelectOption};
use prosperity_discord::{ComponentActivation, ComponentHandler, InteractionResponse, RequestContext};

use crate::tenants::TenantLifecycleManager;

pub const CUSTOM_ID: &str = "whitelabel::actions";

/// Action picker for one bot; the bot id rides along as the key suffix.
pub fn menu(bot_id: &str) -> ActionRow {
    let menu = LifecycleAction::selectable().into_iter().fold(
        SelectMenu::new(format!("{CUSTOM_ID}_{bot_id}")).placeholder("Select an action"),
        |menu, action| {
            let label = match action {
                LifecycleAction::Start => "Start",
                LifecycleAction::Stop => "Stop",
                LifecycleAction::Restart => "Restart",
                LifecycleAction::Delete => "Delete",
                LifecycleAction::Recreate => "Recreate",
            };
            menu.option(SelectOption::new(label, action.as_str()))
        },
    );
    ActionRow::select(menu)
}

pub struct WhitelabelActionsComponent {
    tenants: TenantLifecycleManager,
}

impl WhitelabelActionsComponent {
    pub fn new(tenants: TenantLifecycleManager) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl ComponentHandler for WhitelabelActionsComponent {
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
            .key_suffix()
            .ok_or_else(|| DomainError::MissingOption("bot".to_string()))?;
        let action: LifecycleAction = activation
            .selected()
            .ok_or_else(|| DomainError::MissingOption("action".to_string()))?
            .parse()?;

        self.tenants.set_action_as_owner(actor_id, &TenantId(bot_id.to_string()), action).await?;

        Ok(InteractionResponse::message(format!(
            "Whitelabel bot has been set to `{}`",
            action.as_str()
        ))
        .ephemeral())
    }
}
