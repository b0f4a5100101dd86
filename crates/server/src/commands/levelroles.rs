use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::leveling::MAX_LEVEL;
use prosperity_core::LevelRoleBinding;
use prosperity_db::repositories::RepositoryError;
use prosperity_discord::rest::RoleSink;
use prosperity_discord::schema::ADMINS_ONLY;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use crate::roles::grant_new_binding;
use crate::services::Repositories;

pub struct LevelRolesCommand {
    repos: Repositories,
    roles: Arc<dyn RoleSink>,
}

impl LevelRolesCommand {
    pub fn new(repos: Repositories, roles: Arc<dyn RoleSink>) -> Self {
        Self { repos, roles }
    }

    async fn add(
        &self,
        ctx: &RequestContext,
        community_id: &str,
        role_id: &str,
        level: i64,
    ) -> Result<InteractionResponse, ApplicationError> {
        if !(1..=MAX_LEVEL).contains(&level) {
            return Err(DomainError::OutOfRange {
                name: "level".to_string(),
                value: level.to_string(),
                min: "1".to_string(),
                max: MAX_LEVEL.to_string(),
            }
            .into());
        }

        let binding = LevelRoleBinding {
            community_id: community_id.to_string(),
            role_id: role_id.to_string(),
            level,
        };
        match self.repos.level_roles.insert(&binding).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                return Err(ApplicationError::Conflict("Level role already exists".to_string()));
            }
            Err(other) => return Err(other.into()),
        }
        info!(
            event_name = "leveling.level_role_added",
            correlation_id = %ctx.correlation_id,
            community_id,
            role_id,
            level,
            "level role added"
        );

        let targeted = grant_new_binding(&self.repos, self.roles.as_ref(), ctx, &binding).await?;
        Ok(InteractionResponse::message(format!(
            "<@&{role_id}> will be granted at level **{level}**\n\nAssigning role to **{targeted}** users"
        )))
    }

    async fn remove(
        &self,
        ctx: &RequestContext,
        community_id: &str,
        role_id: &str,
    ) -> Result<InteractionResponse, ApplicationError> {
        if !self.repos.level_roles.remove(community_id, role_id).await? {
            return Err(ApplicationError::NotFound("Level role does not exist".to_string()));
        }
        info!(
            event_name = "leveling.level_role_removed",
            correlation_id = %ctx.correlation_id,
            community_id,
            role_id,
            "level role removed"
        );
        Ok(InteractionResponse::message(format!("<@&{role_id}> has been removed as a level role")))
    }

    async fn list(&self, community_id: &str) -> Result<InteractionResponse, ApplicationError> {
        let bindings = self.repos.level_roles.list(community_id).await?;
        if bindings.is_empty() {
            return Ok(InteractionResponse::message("There are no level roles yet").ephemeral());
        }

        let lines = bindings
            .iter()
            .map(|binding| format!("- <@&{}> at level **{}**", binding.role_id, binding.level))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(InteractionResponse::message(format!("**Level Roles**\n\n{lines}")))
    }
}

#[async_trait]
impl CommandHandler for LevelRolesCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("levelroles", "Manages level roles")
            .default_permissions(ADMINS_ONLY)
            .option(
                OptionDefinition::subcommand("add", "Adds a level role")
                    .option(
                        OptionDefinition::new(OptionType::Role, "role", "The role to grant")
                            .required(),
                    )
                    .option(
                        OptionDefinition::new(
                            OptionType::Integer,
                            "level",
                            "The level the role is granted at",
                        )
                        .required()
                        .range(1.0, MAX_LEVEL as f64),
                    ),
            )
            .option(
                OptionDefinition::subcommand("remove", "Removes a level role").option(
                    OptionDefinition::new(OptionType::Role, "role", "The role to remove").required(),
                ),
            )
            .option(OptionDefinition::subcommand("list", "Lists all level roles"))
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let community_id = ctx.require_community()?;
        let path = invocation.path();

        match path.subcommand {
            Some("add") => {
                let role_id = path.args.require_string("role")?;
                let level = path.args.require_integer("level")?;
                self.add(ctx, community_id, role_id, level).await
            }
            Some("remove") => {
                let role_id = path.args.require_string("role")?;
                self.remove(ctx, community_id, role_id).await
            }
            Some("list") => self.list(community_id).await,
            _ => Err(path.unrecognized(&invocation.name)),
        }
    }
}
