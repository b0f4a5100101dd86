use async_trait::async_trait;

use prosperity_core::config::ServerConfig;
use prosperity_core::errors::ApplicationError;
use prosperity_core::CredentialMaterial;
use prosperity_discord::responses::{Embed, COLOR_DEFAULT};
use prosperity_discord::schema::ADMINISTRATOR;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use crate::components::whitelabel_bot_selection;
use crate::services::Repositories;
use crate::tenants::TenantLifecycleManager;

/// Lets premium users run the bot under their own application.
pub struct WhitelabelCommand {
    repos: Repositories,
    tenants: TenantLifecycleManager,
    server: ServerConfig,
}

impl WhitelabelCommand {
    pub fn new(repos: Repositories, tenants: TenantLifecycleManager, server: ServerConfig) -> Self {
        Self { repos, tenants, server }
    }

    async fn setup(
        &self,
        owner_id: &str,
        material: CredentialMaterial,
    ) -> Result<InteractionResponse, ApplicationError> {
        let tenant = self.tenants.setup(owner_id, material).await?;
        let url = self.server.interactions_url(tenant.id.as_str());

        Ok(InteractionResponse::message(format!(
            "Whitelabel bot activated\n\nPlease put the following link in `INTERACTIONS ENDPOINT URL` \
             [here](https://discord.com/developers/applications/{}/information): \n`{url}`",
            tenant.id
        ))
        .ephemeral())
    }

    async fn actions(&self, owner_id: &str) -> Result<InteractionResponse, ApplicationError> {
        let tenants = self.tenants.list_for_owner(owner_id).await?;
        if tenants.is_empty() {
            return Ok(InteractionResponse::message("You don't have any whitelabel bots").ephemeral());
        }

        let embed = Embed::new()
            .title("Whitelabel Bot Actions")
            .description("Please select a bot below")
            .color(COLOR_DEFAULT);
        Ok(InteractionResponse::embed(embed)
            .with_components(vec![whitelabel_bot_selection::menu(&tenants)])
            .ephemeral())
    }
}

#[async_trait]
impl CommandHandler for WhitelabelCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("whitelabel", "Manages your whitelabel bots")
            .default_permissions(ADMINISTRATOR)
            .option(
                OptionDefinition::subcommand("setup", "Sets up a whitelabel bot")
                    .option(
                        OptionDefinition::new(OptionType::String, "token", "The bot token").required(),
                    )
                    .option(
                        OptionDefinition::new(
                            OptionType::String,
                            "public_key",
                            "The public key from the developer portal",
                        )
                        .required(),
                    ),
            )
            .option(OptionDefinition::subcommand("actions", "Starts, stops or deletes your whitelabel bots"))
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let owner_id = ctx.require_actor()?;
        if !self.repos.users.is_premium(owner_id).await? {
            return Err(ApplicationError::PermissionDenied(
                "You are not a whitelabel client".to_string(),
            ));
        }

        let path = invocation.path();
        match path.subcommand {
            Some("setup") => {
                let material = CredentialMaterial::new(
                    path.args.require_string("token")?,
                    path.args.require_string("public_key")?,
                );
                self.setup(owner_id, material).await
            }
            Some("actions") => self.actions(owner_id).await,
            _ => Err(path.unrecognized(&invocation.name)),
        }
    }
}
