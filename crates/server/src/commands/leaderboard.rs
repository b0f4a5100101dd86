use async_trait::async_trait;

use prosperity_core::errors::ApplicationError;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use crate::services::Repositories;

const PAGE_SIZE: i64 = 10;

pub struct LeaderboardCommand {
    repos: Repositories,
}

impl LeaderboardCommand {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

fn page_count(members: i64) -> i64 {
    ((members + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
}

#[async_trait]
impl CommandHandler for LeaderboardCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("leaderboard", "Displays the top users and their levels").option(
            OptionDefinition::new(OptionType::Integer, "page", "The page you want to display")
                .range(1.0, f64::from(u32::MAX)),
        )
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let community_id = ctx.require_community()?;
        let page = invocation.path().args.integer("page").unwrap_or(1).max(1);

        let total = self.repos.members.count(community_id).await?;
        let pages = page_count(total);
        let ranked = self
            .repos
            .members
            .leaderboard(community_id, PAGE_SIZE, (page - 1).saturating_mul(PAGE_SIZE))
            .await?;

        if ranked.is_empty() {
            return Ok(InteractionResponse::message(format!(
                "Top 10 Members (Page {page} of {pages})\n\nNobody is on this page yet"
            ))
            .ephemeral());
        }

        let lines: Vec<String> = ranked
            .iter()
            .map(|entry| {
                format!("{}. {} - Level {}", entry.rank, entry.display_name(), entry.member.level)
            })
            .collect();
        Ok(InteractionResponse::message(format!(
            "Top 10 Members (Page {page} of {pages})\n\n{}",
            lines.join("\n")
        )))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use prosperity_core::CommunityMember;
    use prosperity_discord::CommandHandler;

    use super::{page_count, LeaderboardCommand};
    use crate::services::Repositories;
    use crate::testing::{context, invocation, option};

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
    }

    #[tokio::test]
    async fn second_page_continues_ranking() {
        let repos = Repositories::in_memory();
        for index in 0..12_i64 {
            let mut member = CommunityMember::new("g1", format!("u{index:02}"));
            member.xp = 1_000 - index;
            repos.members.save_progress(&member).await.expect("seed");
        }
        let command = LeaderboardCommand::new(repos);

        let response = command
            .execute(&context("g1", "u00"), &invocation("leaderboard", vec![option("page", 4, json!(2))]))
            .await
            .expect("leaderboard");

        let text = response.content().expect("content");
        assert!(text.starts_with("Top 10 Members (Page 2 of 2)"));
        assert!(text.contains("11. <@u10> - Level 0"));
        assert!(text.contains("12. <@u11> - Level 0"));
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let repos = Repositories::in_memory();
        let response = LeaderboardCommand::new(repos)
            .execute(&context("g1", "u1"), &invocation("leaderboard", vec![option("page", 4, json!(5))]))
            .await
            .expect("leaderboard");

        assert!(response.is_ephemeral());
        assert!(response.content().expect("content").contains("Nobody is on this page yet"));
    }
}
