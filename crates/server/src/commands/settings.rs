use async_trait::async_trait;
use tracing::info;

use prosperity_core::domain::community::{MAX_XP_DELAY_SECS, MAX_XP_RATE};
use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::{CommunitySettings, NotificationMode, RoleAssignMode};
use prosperity_discord::responses::{Embed, COLOR_DEFAULT};
use prosperity_discord::schema::ADMINS_ONLY;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use crate::components::settings_notifications;
use crate::services::Repositories;

pub struct SettingsCommand {
    repos: Repositories,
}

impl SettingsCommand {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn update<F>(
        &self,
        ctx: &RequestContext,
        community_id: &str,
        change: F,
    ) -> Result<CommunitySettings, ApplicationError>
    where
        F: FnOnce(&mut CommunitySettings),
    {
        let mut settings = self.repos.communities.settings(community_id).await?;
        change(&mut settings);
        self.repos.communities.save_settings(&settings).await?;
        info!(
            event_name = "settings.updated",
            correlation_id = %ctx.correlation_id,
            community_id,
            notifications = settings.notifications.kind(),
            role_assign_mode = settings.role_assign_mode.as_str(),
            xp_rate = settings.xp_rate,
            xp_delay_secs = settings.xp_delay_secs,
            "community settings updated"
        );
        Ok(settings)
    }
}

fn out_of_range(name: &str, value: impl ToString, min: impl ToString, max: impl ToString) -> ApplicationError {
    DomainError::OutOfRange {
        name: name.to_string(),
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
    .into()
}

#[async_trait]
impl CommandHandler for SettingsCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("settings", "Manages server settings")
            .default_permissions(ADMINS_ONLY)
            .option(
                OptionDefinition::subcommand("notifications", "Sets where level up notifications are sent")
                    .option(OptionDefinition::new(
                        OptionType::Channel,
                        "channel",
                        "The channel to send level up notifications to",
                    )),
            )
            .option(
                OptionDefinition::subcommand("roles", "Sets how level roles are assigned").option(
                    OptionDefinition::new(OptionType::String, "type", "The role assignment type")
                        .required()
                        .choice("Single (Only apply one at a time and remove the previous role)", "single")
                        .choice("Stack (Stack all previous roles and do not remove old ones)", "stack"),
                ),
            )
            .option(
                OptionDefinition::subcommand("multiplier", "Sets the xp multiplier").option(
                    OptionDefinition::new(OptionType::Number, "multiplier", "The xp multiplier")
                        .required()
                        .range(0.0, MAX_XP_RATE),
                ),
            )
            .option(
                OptionDefinition::subcommand("delay", "Sets the delay between xp gains").option(
                    OptionDefinition::new(OptionType::Integer, "delay", "The delay in seconds")
                        .required()
                        .range(1.0, MAX_XP_DELAY_SECS as f64),
                ),
            )
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let community_id = ctx.require_community()?;
        let path = invocation.path();

        let message = match path.subcommand {
            Some("notifications") => match path.args.string("channel") {
                Some(channel_id) => {
                    let mode = NotificationMode::Channel(channel_id.to_string());
                    self.update(ctx, community_id, |settings| settings.notifications = mode).await?;
                    format!("Set the notifications channel to <#{channel_id}>")
                }
                None => {
                    let embed = Embed::new()
                        .description("Please select the type of notifications you below")
                        .color(COLOR_DEFAULT);
                    return Ok(InteractionResponse::embed(embed)
                        .with_components(vec![settings_notifications::menu()])
                        .ephemeral());
                }
            },
            Some("roles") => {
                let mode: RoleAssignMode = path.args.require_string("type")?.parse()?;
                self.update(ctx, community_id, |settings| settings.role_assign_mode = mode).await?;
                format!("Set the role assignment type to `{}`", mode.as_str())
            }
            Some("multiplier") => {
                let rate = path.args.require_number("multiplier")?;
                if !(0.0..=MAX_XP_RATE).contains(&rate) {
                    return Err(out_of_range("multiplier", rate, 0, MAX_XP_RATE));
                }
                self.update(ctx, community_id, |settings| settings.xp_rate = rate).await?;
                format!("Set the XP multiplier to `{rate}`")
            }
            Some("delay") => {
                let delay = path.args.require_integer("delay")?;
                if !(1..=MAX_XP_DELAY_SECS).contains(&delay) {
                    return Err(out_of_range("delay", delay, 1, MAX_XP_DELAY_SECS));
                }
                self.update(ctx, community_id, |settings| settings.xp_delay_secs = delay).await?;
                format!("Set the XP delay to `{delay}`")
            }
            _ => return Err(path.unrecognized(&invocation.name)),
        };

        Ok(InteractionResponse::message(message).ephemeral())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use prosperity_core::errors::ApplicationError;
    use prosperity_core::{NotificationMode, RoleAssignMode};
    use prosperity_discord::{CommandHandler, CommandInvocation};

    use super::SettingsCommand;
    use crate::services::Repositories;
    use crate::testing::{context, invocation, option, subcommand};

    fn call(name: &str, args: Vec<prosperity_discord::interaction::CommandOption>) -> CommandInvocation {
        invocation("settings", vec![subcommand(name, args)])
    }

    #[tokio::test]
    async fn notifications_with_channel_saves_channel_mode() {
        let repos = Repositories::in_memory();
        let command = SettingsCommand::new(repos.clone());

        let response = command
            .execute(&context("g1", "admin"), &call("notifications", vec![option("channel", 7, json!("55"))]))
            .await
            .expect("notifications");

        assert_eq!(response.content(), Some("Set the notifications channel to <#55>"));
        assert!(response.is_ephemeral());
        let settings = repos.communities.settings("g1").await.expect("settings");
        assert_eq!(settings.notifications, NotificationMode::Channel("55".to_string()));
    }

    #[tokio::test]
    async fn notifications_without_channel_offers_a_menu() {
        let repos = Repositories::in_memory();
        let command = SettingsCommand::new(repos.clone());

        let response = command.execute(&context("g1", "admin"), &call("notifications", vec![])).await.expect("menu");

        assert_eq!(response.text(), Some("Please select the type of notifications you below"));
        let body = serde_json::to_value(&response).expect("serialize");
        assert_eq!(body["data"]["components"][0]["components"][0]["custom_id"], "settings::notifications");
        let settings = repos.communities.settings("g1").await.expect("settings");
        assert_eq!(settings.notifications, NotificationMode::Reply);
    }

    #[tokio::test]
    async fn role_type_multiplier_and_delay_are_saved() {
        let repos = Repositories::in_memory();
        let command = SettingsCommand::new(repos.clone());
        let ctx = context("g1", "admin");

        let roles = command.execute(&ctx, &call("roles", vec![option("type", 3, json!("single"))])).await.expect("roles");
        let rate = command.execute(&ctx, &call("multiplier", vec![option("multiplier", 10, json!(2.5))])).await.expect("rate");
        let delay = command.execute(&ctx, &call("delay", vec![option("delay", 4, json!(30))])).await.expect("delay");

        assert_eq!(roles.content(), Some("Set the role assignment type to `single`"));
        assert_eq!(rate.content(), Some("Set the XP multiplier to `2.5`"));
        assert_eq!(delay.content(), Some("Set the XP delay to `30`"));
        let settings = repos.communities.settings("g1").await.expect("settings");
        assert_eq!(settings.role_assign_mode, RoleAssignMode::Single);
        assert_eq!(settings.xp_rate, 2.5);
        assert_eq!(settings.xp_delay_secs, 30);
    }

    #[tokio::test]
    async fn out_of_range_values_are_rejected_without_writing() {
        let repos = Repositories::in_memory();
        let command = SettingsCommand::new(repos.clone());
        let ctx = context("g1", "admin");

        let rate = command.execute(&ctx, &call("multiplier", vec![option("multiplier", 10, json!(11.0))])).await;
        let delay = command.execute(&ctx, &call("delay", vec![option("delay", 4, json!(0))])).await;
        let mode = command.execute(&ctx, &call("roles", vec![option("type", 3, json!("random"))])).await;

        assert!(matches!(rate, Err(ApplicationError::Domain(_))));
        assert!(matches!(delay, Err(ApplicationError::Domain(_))));
        assert!(matches!(mode, Err(ApplicationError::Domain(_))));
        let settings = repos.communities.settings("g1").await.expect("settings");
        assert_eq!(settings.xp_rate, 1.0);
        assert_eq!(settings.xp_delay_secs, 60);
    }
}
