use std::sync::Arc;

use async_trait::async_trait;

use prosperity_core::errors::ApplicationError;
use prosperity_core::leveling::{apply_level_delta, MAX_LEVEL};
use prosperity_discord::rest::RoleSink;
use prosperity_discord::schema::ADMINS_ONLY;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use super::{adjust_member, positive};
use crate::services::Repositories;

pub struct LevelsCommand {
    repos: Repositories,
    roles: Arc<dyn RoleSink>,
}

impl LevelsCommand {
    pub fn new(repos: Repositories, roles: Arc<dyn RoleSink>) -> Self {
        Self { repos, roles }
    }
}

fn levels_subcommand(name: &str, description: &str, user: &str, levels: &str) -> OptionDefinition {
    OptionDefinition::subcommand(name, description)
        .option(OptionDefinition::new(OptionType::User, "user", user).required())
        .option(
            OptionDefinition::new(OptionType::Integer, "levels", levels)
                .required()
                .range(1.0, MAX_LEVEL as f64),
        )
}

#[async_trait]
impl CommandHandler for LevelsCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("levels", "Manages user levels")
            .default_permissions(ADMINS_ONLY)
            .option(levels_subcommand(
                "give",
                "Gives levels to a user",
                "The user to give levels to",
                "The amount of levels to give",
            ))
            .option(levels_subcommand(
                "take",
                "Takes levels from a user",
                "The user to take levels from",
                "The amount of levels to take",
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
        let levels = positive(path.args.require_integer("levels")?)?;

        adjust_member(&self.repos, self.roles.as_ref(), ctx, user_id, |member| {
            apply_level_delta(member, sign * levels)
        })
        .await?;

        Ok(InteractionResponse::message(format!(
            "{verb} **{levels}** level(s) {preposition} <@{user_id}>"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use prosperity_core::leveling::required_xp;
    use prosperity_core::{CommunityMember, LevelRoleBinding, RoleAssignMode};
    use prosperity_discord::CommandHandler;

    use super::LevelsCommand;
    use crate::services::Repositories;
    use crate::testing::{context, invocation, option, subcommand, RecordingRoleSink, RoleCall};

    fn call(name: &str, user: &str, levels: i64) -> prosperity_discord::CommandInvocation {
        invocation(
            "levels",
            vec![subcommand(
                name,
                vec![option("user", 6, json!(user)), option("levels", 4, json!(levels))],
            )],
        )
    }

    #[tokio::test]
    async fn giving_levels_resets_xp_to_level_floor() {
        let repos = Repositories::in_memory();
        repos
            .members
            .save_progress(&CommunityMember { community_id: "g1".into(), user_id: "u1".into(), xp: 120, level: 1 })
            .await
            .expect("seed");
        let command = LevelsCommand::new(repos.clone(), Arc::new(RecordingRoleSink::default()));

        let response = command.execute(&context("g1", "admin"), &call("give", "u1", 2)).await.expect("give");

        assert_eq!(response.content(), Some("Given **2** level(s) to <@u1>"));
        let stored = repos.members.find("g1", "u1").await.expect("find").expect("member");
        assert_eq!(stored.level, 3);
        assert_eq!(stored.xp, required_xp(3));
    }

    #[tokio::test]
    async fn taking_levels_in_single_mode_swaps_roles() {
        let repos = Repositories::in_memory();
        for (role, level) in [("r1", 1), ("r5", 5)] {
            repos
                .level_roles
                .insert(&LevelRoleBinding { community_id: "g1".into(), role_id: role.into(), level })
                .await
                .expect("binding");
        }
        let mut settings = repos.communities.settings("g1").await.expect("settings");
        settings.role_assign_mode = RoleAssignMode::Single;
        repos.communities.save_settings(&settings).await.expect("save");
        repos
            .members
            .save_progress(&CommunityMember { community_id: "g1".into(), user_id: "u1".into(), xp: required_xp(6), level: 6 })
            .await
            .expect("seed");
        let sink = Arc::new(RecordingRoleSink::default());
        let command = LevelsCommand::new(repos.clone(), sink.clone());

        command.execute(&context("g1", "admin"), &call("take", "u1", 3)).await.expect("take");

        let stored = repos.members.find("g1", "u1").await.expect("find").expect("member");
        assert_eq!(stored.level, 3);
        assert_eq!(sink.calls(), vec![RoleCall::grant("u1", "r1"), RoleCall::revoke("u1", "r5")]);
    }

    #[tokio::test]
    async fn taking_past_zero_clamps() {
        let repos = Repositories::in_memory();
        repos
            .members
            .save_progress(&CommunityMember { community_id: "g1".into(), user_id: "u1".into(), xp: 300, level: 2 })
            .await
            .expect("seed");
        let command = LevelsCommand::new(repos.clone(), Arc::new(RecordingRoleSink::default()));

        command.execute(&context("g1", "admin"), &call("take", "u1", 10)).await.expect("take");

        let stored = repos.members.find("g1", "u1").await.expect("find").expect("member");
        assert_eq!((stored.xp, stored.level), (0, 0));
    }
}
