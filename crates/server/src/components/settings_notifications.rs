use async_trait::async_trait;
use tracing::info;

use prosperity_core::errors::ApplicationError;
use prosperity_core::NotificationMode;
use prosperity_discord::responses::{ActionRow, SelectMenu, SelectOption};
use prosperity_discord::{ComponentActivation, ComponentHandler, InteractionResponse, RequestContext};

use crate::services::Repositories;

pub const CUSTOM_ID: &str = "settings::notifications";

/// Select menu offered by `/settings notifications` when no channel is given.
pub fn menu() -> ActionRow {
    ActionRow::select(
        SelectMenu::new(CUSTOM_ID)
            .placeholder("Choose how level up notifications are sent")
            .option(SelectOption::new("Reply to Message", format!("{CUSTOM_ID}::reply")).emoji("💬"))
            .option(SelectOption::new("Specify Channel", format!("{CUSTOM_ID}::channel")).emoji("📃"))
            .option(SelectOption::new("Direct Messages", format!("{CUSTOM_ID}::dm")).emoji("🔏"))
            .option(
                SelectOption::new("Disable Notifications", format!("{CUSTOM_ID}::disable")).emoji("🚫"),
            ),
    )
}

pub struct NotificationSelectComponent {
    repos: Repositories,
}

impl NotificationSelectComponent {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl ComponentHandler for NotificationSelectComponent {
    fn custom_id(&self) -> &'static str {
        CUSTOM_ID
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        activation: &ComponentActivation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let community_id = ctx.require_community()?;
        let choice = activation
            .selected()
            .and_then(|value| value.strip_prefix(CUSTOM_ID))
            .and_then(|value| value.strip_prefix("::"));

        let (mode, message) = match choice {
            Some("reply") => (
                NotificationMode::Reply,
                "Successfully updated level up notifications to be sent via **replies**",
            ),
            Some("dm") => (
                NotificationMode::Dm,
                "Successfully updated level up notifications to be sent via **Direct Messages**",
            ),
            Some("disable") => (
                NotificationMode::Disable,
                "Successfully updated level up notifications to be **disabled**",
            ),
            Some("channel") => {
                return Ok(InteractionResponse::message(
                    "Please use the slash command `/settings notifications` and specify the channel",
                )
                .ephemeral());
            }
            _ => {
                return Ok(InteractionResponse::message(
                    "Please use the slash command `/settings notifications` command and choose an option",
                )
                .ephemeral());
            }
        };

        let mut settings = self.repos.communities.settings(community_id).await?;
        settings.notifications = mode;
        self.repos.communities.save_settings(&settings).await?;
        info!(
            event_name = "settings.notifications_updated",
            correlation_id = %ctx.correlation_id,
            community_id,
            notifications = settings.notifications.kind(),
            "level up notification mode updated"
        );

        Ok(InteractionResponse::message(message).ephemeral())
    }
}
