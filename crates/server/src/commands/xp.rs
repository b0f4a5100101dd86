use std::sync::Arc;

use async_trait::async_trait;

use prosperity_core::errors::ApplicationError;
use prosperity_core::leveling::apply_xp_delta;
use prosperity_discord::rest::RoleSink;
use prosperity_discord::schema::ADMINS_ONLY;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use super::{adjust_member, positive};
use crate::services::Repositories;

pub struct XpCommand {
    repos: Repositories,
    roles: Arc<dyn RoleSink>,
}

impl XpCommand {
    pub fn new(repos: Repositories, roles: Arc<dyn RoleSink>) -> Self {
        Self { repos, roles }
    }
}

fn amount_subcommand(name: &str, description: &str, user: &str, amount: &str) -> OptionDefinition {
    OptionDefinition::subcommand(name, description)
        .option(OptionDefinition::new(OptionType::User, "user", user).required())
        .option(
            OptionDefinition::new(OptionType::Integer, "amount", amount)
                .required()
                .range(1.0, 1_000_000_000.0),
        )
}

#[async_trait]
impl CommandHandler for XpCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("xp", "Manages user xp")
            .default_permissions(ADMINS_ONLY)
            .option(amount_subcommand(
                "give",
                "Gives xp to a user",
                "The user to give xp to",
                "The amount of xp to give",
            ))
            .option(amount_subcommand(
                "take",
                "Takes xp from a user",
                "The user to take xp from",
                "The amount of xp to take",
            ))
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let path = invocation.path();
        let (sign, verb, preposition) = match path.subcommand {
            Some("give") => (1, "Given", "to"),
            Some("take") => (-1, "Taken", "from"),
            _ => return Err(path.unrecognized(&invocation.name)),
        };
        let user_id = path.args.require_string("user")?;
        let amount = positive(path.args.require_integer("amount")?)?;

        adjust_member(&self.repos, self.roles.as_ref(), ctx, user_id, |member| {
            apply_xp_delta(member, sign * amount)
        })
        .await?;

        Ok(InteractionResponse::message(format!(
            "{verb} **{amount}** xp {preposition} <@{user_id}>"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use prosperity_core::errors::ApplicationError;
    use prosperity_core::{CommunityMember, LevelRoleBinding};
    use prosperity_discord::CommandHandler;

    use super::XpCommand;
    use crate::services::Repositories;
    use crate::testing::{context, invocation, option, subcommand, RecordingRoleSink, RoleCall};

    fn call(name: &str, user: &str, amount: i64) -> prosperity_discord::CommandInvocation {
        invocation(
            "xp",
            vec![subcommand(
                name,
                vec![option("user", 6, json!(user)), option("amount", 4, json!(amount))],
            )],
        )
    }

    #[tokio::test]
    async fn giving_xp_levels_up_and_grants_roles() {
        let repos = Repositories::in_memory();
        repos.members.save_progress(&CommunityMember::new("g1", "u1")).await.expect("seed");
        repos
            .level_roles
            .insert(&LevelRoleBinding { community_id: "g1".into(), role_id: "r2".into(), level: 2 })
            .await
            .expect("binding");
        let sink = Arc::new(RecordingRoleSink::default());
        let command = XpCommand::new(repos.clone(), sink.clone());

        let response = command.execute(&context("g1", "admin"), &call("give", "u1", 300)).await.expect("give");

        assert_eq!(response.content(), Some("Given **300** xp to <@u1>"));
        let stored = repos.members.find("g1", "u1").await.expect("find").expect("member");
        assert_eq!((stored.xp, stored.level), (300, 2));
        assert_eq!(sink.calls(), vec![RoleCall::grant("u1", "r2")]);
    }

    #[tokio::test]
    async fn taking_more_than_the_balance_floors_at_zero() {
        let repos = Repositories::in_memory();
        repos
            .members
            .save_progress(&CommunityMember { community_id: "g1".into(), user_id: "u1".into(), xp: 120, level: 1 })
            .await
            .expect("seed");
        let command = XpCommand::new(repos.clone(), Arc::new(RecordingRoleSink::default()));

        command.execute(&context("g1", "admin"), &call("take", "u1", 5_000)).await.expect("take");

        let stored = repos.members.find("g1", "u1").await.expect("find").expect("member");
        assert_eq!((stored.xp, stored.level), (0, 0));
    }

    #[tokio::test]
    async fn member_without_activity_is_not_found() {
        let command = XpCommand::new(Repositories::in_memory(), Arc::new(RecordingRoleSink::default()));
        let error = command.execute(&context("g1", "admin"), &call("give", "ghost", 10)).await.expect_err("absent");
        assert!(matches!(error, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_subcommand_is_not_found() {
        let command = XpCommand::new(Repositories::in_memory(), Arc::new(RecordingRoleSink::default()));
        let error = command.execute(&context("g1", "admin"), &call("steal", "u1", 10)).await.expect_err("unknown");
        assert_eq!(error, ApplicationError::NotFound("Unknown command `/xp steal`".to_string()));
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let repos = Repositories::in_memory();
        repos.members.save_progress(&CommunityMember::new("g1", "u1")).await.expect("seed");
        let command = XpCommand::new(repos, Arc::new(RecordingRoleSink::default()));
        let error = command.execute(&context("g1", "admin"), &call("give", "u1", 0)).await.expect_err("zero");
        assert!(matches!(error, ApplicationError::Domain(_)));
    }
}
