use async_trait::async_trait;
use tracing::info;

use prosperity_core::errors::ApplicationError;
use prosperity_core::{SuppressionEntry, SuppressionKind};
use prosperity_db::repositories::RepositoryError;
use prosperity_discord::schema::ADMINS_ONLY;
use prosperity_discord::{
    CommandDefinition, CommandHandler, CommandInvocation, InteractionResponse, OptionDefinition,
    OptionType, RequestContext,
};

use crate::services::Repositories;

pub struct IgnoredCommand {
    repos: Repositories,
}

impl IgnoredCommand {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn add(
        &self,
        ctx: &RequestContext,
        entry: SuppressionEntry,
    ) -> Result<InteractionResponse, ApplicationError> {
        let mention = entry.kind.mention(&entry.subject_id);
        match self.repos.suppressions.insert(&entry).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                return Err(ApplicationError::Conflict(format!("{mention} is already being ignored")));
            }
            Err(other) => return Err(other.into()),
        }
        info!(
            event_name = "leveling.suppression_added",
            correlation_id = %ctx.correlation_id,
            community_id = %entry.community_id,
            subject_id = %entry.subject_id,
            kind = entry.kind.as_str(),
            "xp suppression added"
        );
        Ok(InteractionResponse::message(format!("{mention} will be ignored from gaining xp")))
    }

    async fn remove(
        &self,
        ctx: &RequestContext,
        entry: SuppressionEntry,
    ) -> Result<InteractionResponse, ApplicationError> {
        let mention = entry.kind.mention(&entry.subject_id);
        if !self.repos.suppressions.remove(&entry).await? {
            return Err(ApplicationError::NotFound(format!("{mention} is not being ignored")));
        }
        info!(
            event_name = "leveling.suppression_removed",
            correlation_id = %ctx.correlation_id,
            community_id = %entry.community_id,
            subject_id = %entry.subject_id,
            kind = entry.kind.as_str(),
            "xp suppression removed"
        );
        Ok(InteractionResponse::message(format!("{mention} will no longer be ignored from gaining xp")))
    }

    async fn list(
        &self,
        community_id: &str,
        kind: SuppressionKind,
    ) -> Result<InteractionResponse, ApplicationError> {
        let entries = self.repos.suppressions.list(community_id, kind).await?;
        let title = match kind {
            SuppressionKind::Channel => "Channels",
            SuppressionKind::Role => "Roles",
        };
        if entries.is_empty() {
            return Ok(InteractionResponse::message(format!(
                "No {} are being ignored",
                title.to_lowercase()
            ))
            .ephemeral());
        }

        let lines = entries
            .iter()
            .map(|entry| format!("- {}", kind.mention(&entry.subject_id)))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(InteractionResponse::message(format!("**Ignored {title}**\n\n{lines}")))
    }
}

fn suppression_group(kind: SuppressionKind) -> OptionDefinition {
    let (group, option, option_type, noun) = match kind {
        SuppressionKind::Channel => ("channels", "channel", OptionType::Channel, "channel"),
        SuppressionKind::Role => ("roles", "role", OptionType::Role, "role"),
    };

    OptionDefinition::group(group, format!("Manages ignored {group}"))
        .option(
            OptionDefinition::subcommand("add", format!("Stops a {noun} from gaining xp")).option(
                OptionDefinition::new(option_type, option, format!("The {noun} to ignore")).required(),
            ),
        )
        .option(
            OptionDefinition::subcommand("remove", format!("Lets a {noun} gain xp again")).option(
                OptionDefinition::new(option_type, option, format!("The {noun} to stop ignoring"))
                    .required(),
            ),
        )
        .option(OptionDefinition::subcommand("list", format!("Lists all ignored {group}")))
}

#[async_trait]
impl CommandHandler for IgnoredCommand {
    fn describe(&self) -> CommandDefinition {
        CommandDefinition::new("ignored", "Manages channels and roles that do not gain xp")
            .default_permissions(ADMINS_ONLY)
            .option(suppression_group(SuppressionKind::Channel))
            .option(suppression_group(SuppressionKind::Role))
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError> {
        let community_id = ctx.require_community()?;
        let path = invocation.path();
        let kind: SuppressionKind = match path.group {
            Some(group) => group.parse()?,
            None => return Err(path.unrecognized(&invocation.name)),
        };

        let entry = |option: &str| -> Result<SuppressionEntry, ApplicationError> {
            Ok(SuppressionEntry {
                community_id: community_id.to_string(),
                subject_id: path.args.require_string(option)?.to_string(),
                kind,
            })
        };

        match path.subcommand {
            Some("add") => self.add(ctx, entry(kind.as_str())?).await,
            Some("remove") => self.remove(ctx, entry(kind.as_str())?).await,
            Some("list") => self.list(community_id, kind).await,
            _ => Err(path.unrecognized(&invocation.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use prosperity_core::errors::ApplicationError;
    use prosperity_discord::{CommandHandler, CommandInvocation};

    use super::IgnoredCommand;
    use crate::services::Repositories;
    use crate::testing::{context, group, invocation, option, subcommand};

    fn call(group_name: &str, sub: &str, args: Vec<prosperity_discord::interaction::CommandOption>) -> CommandInvocation {
        invocation("ignored", vec![group(group_name, subcommand(sub, args))])
    }

    #[tokio::test]
    async fn channels_can_be_ignored_once() {
        let command = IgnoredCommand::new(Repositories::in_memory());
        let add = call("channels", "add", vec![option("channel", 7, json!("55"))]);

        let response = command.execute(&context("g1", "admin"), &add).await.expect("add");
        assert_eq!(response.content(), Some("<#55> will be ignored from gaining xp"));

        let error = command.execute(&context("g1", "admin"), &add).await.expect_err("duplicate");
        assert_eq!(error, ApplicationError::Conflict("<#55> is already being ignored".to_string()));
    }

    #[tokio::test]
    async fn roles_are_listed_with_role_mentions() {
        let command = IgnoredCommand::new(Repositories::in_memory());
        for role in ["r1", "r2"] {
            command
                .execute(&context("g1", "admin"), &call("roles", "add", vec![option("role", 8, json!(role))]))
                .await
                .expect("add");
        }

        let listed = command.execute(&context("g1", "admin"), &call("roles", "list", vec![])).await.expect("list");
        assert_eq!(listed.content(), Some("**Ignored Roles**\n\n- <@&r1>\n- <@&r2>"));

        let channels =
            command.execute(&context("g1", "admin"), &call("channels", "list", vec![])).await.expect("list");
        assert!(channels.is_ephemeral());
    }

    #[tokio::test]
    async fn removing_an_unknown_entry_is_not_found() {
        let command = IgnoredCommand::new(Repositories::in_memory());
        let remove = call("channels", "remove", vec![option("channel", 7, json!("55"))]);

        let error = command.execute(&context("g1", "admin"), &remove).await.expect_err("absent");
        assert_eq!(error, ApplicationError::NotFound("<#55> is not being ignored".to_string()));

        command
            .execute(&context("g1", "admin"), &call("channels", "add", vec![option("channel", 7, json!("55"))]))
            .await
            .expect("add");
        let response = command.execute(&context("g1", "admin"), &remove).await.expect("remove");
        assert_eq!(response.content(), Some("<#55> will no longer be ignored from gaining xp"));
    }
}
