use async_trait::async_trait;

use prosperity_core::errors::ApplicationError;
use prosperity_discord::responses::{Embed, COLOR_DEFAULT};
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, RequestContext,
};

use crate::services::Repositories;

const ABOUT_TEXT: &str = "Prosperity is a levelling bot ready to skill up and boost up your Discord server. \
                          We pride ourselves on openness, transparency and collaboration";

pub struct AboutCommand {
    repos: Repositories,
}

impl AboutCommand {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl CommandHandler for AboutCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("about", "Information about the bot").allow_in_dms()
    }

    async fn execute(
        &self,
        _ctx: &RequestContext,
        _invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let stats = self.repos.members.about_stats().await?;

        Ok(InteractionResponse::embed(
            Embed::new().description(ABOUT_TEXT).color(COLOR_DEFAULT).field(
                "Bot Statistics",
                format!("Servers: {}\nMembers: {}", stats.communities, stats.members),
                true,
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use prosperity_core::CommunityMember;
    use prosperity_discord::CommandHandler;

    use super::AboutCommand;
    use crate::services::Repositories;
    use crate::testing::{context, invocation};

    #[tokio::test]
    async fn reports_member_totals() {
        let repos = Repositories::in_memory();
        repos.members.save_progress(&CommunityMember::new("g1", "u1")).await.expect("seed");
        repos.members.save_progress(&CommunityMember::new("g2", "u1")).await.expect("seed");

        let response = AboutCommand::new(repos)
            .execute(&context("g1", "u1"), &invocation("about", Vec::new()))
            .await
            .expect("about");

        let data = response.data.expect("data");
        assert_eq!(data.embeds[0].fields[0].name, "Bot Statistics");
        assert!(data.embeds[0].fields[0].value.ends_with("Members: 2"));
    }
}
