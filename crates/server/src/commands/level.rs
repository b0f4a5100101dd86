use async_trait::async_trait;

use prosperity_core::errors::ApplicationError;
use prosperity_core::leveling::xp_to_next_level;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use super::never_talked;
use crate::services::Repositories;

pub struct LevelCommand {
    repos: Repositories,
}

impl LevelCommand {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl CommandHandler for LevelCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("level", "See your or someone elses current level").option(
            OptionDefinition::new(OptionType::User, "user", "The user you want to check the level of"),
        )
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let community_id = ctx.require_community()?;
        let actor_id = ctx.require_actor()?;
        let target = invocation.path().args.string("user").unwrap_or(actor_id);

        let member = self
            .repos
            .members
            .find(community_id, target)
            .await?
            .ok_or_else(|| never_talked(target))?;
        let needed = xp_to_next_level(&member);

        let message = if target == actor_id {
            format!(
                "Your current level is **{}**\nYou need **{needed}** xp to get to the next level",
                member.level
            )
        } else {
            format!(
                "<@{target}>'s current level is **{}**\nThey need **{needed}** xp to get to the next level",
                member.level
            )
        };
        Ok(InteractionResponse::message(message))
    }
}
