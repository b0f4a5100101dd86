//! Startup publication of the command table.

use secrecy::SecretString;
use tracing::{info, warn};

use prosperity_core::errors::ApplicationError;
use prosperity_db::repositories::TenantRepository;
use prosperity_discord::{CommandDefinition, CommandPublisher};

use crate::credentials::PrimaryTenant;

/// Where commands go for the primary application.
pub struct PrimaryTarget<'a> {
    pub tenant: &'a PrimaryTenant,
    pub application_id: &'a str,
    pub guild_id: Option<&'a str>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub published: Vec<String>,
    pub failed: Vec<String>,
}

/// Overwrites the command set of the primary application and of every active tenant.
///
/// A failure for one application is logged and does not stop the others.
pub async fn publish_commands(
    publisher: &dyn CommandPublisher,
    tenants: &dyn TenantRepository,
    primary: PrimaryTarget<'_>,
    commands: &[CommandDefinition],
) -> Result<PublishReport, ApplicationError> {
    let mut targets: Vec<(String, SecretString, Option<&str>)> = vec![(
        primary.application_id.to_string(),
        primary.tenant.token.clone(),
        primary.guild_id,
    )];
    for tenant in tenants.list_active().await? {
        targets.push((tenant.id.to_string(), tenant.token, None));
    }

    let mut report = PublishReport::default();
    for (application_id, token, guild_id) in targets {
        match publisher.publish(&token, &application_id, guild_id, commands).await {
            Ok(count) => {
                info!(
                    event_name = "system.bootstrap.commands_published",
                    correlation_id = "bootstrap",
                    application_id = %application_id,
                    guild_id = guild_id.unwrap_or("global"),
                    count,
                    "command table published"
                );
                report.published.push(application_id);
            }
            Err(failure) => {
                warn!(
                    event_name = "system.bootstrap.commands_publish_failed",
                    correlation_id = "bootstrap",
                    application_id = %application_id,
                    error = %failure,
                    "command table publication failed"
                );
                report.failed.push(application_id);
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::{ExposeSecret, SecretString};

    use prosperity_core::{LifecycleAction, NewTenant, TenantId};
    use prosperity_db::repositories::{InMemoryTenantRepository, TenantRepository};
    use prosperity_discord::{CommandDefinition, CommandPublisher, RestError};

    use super::{publish_commands, PrimaryTarget};
    use crate::credentials::PrimaryTenant;

    #[derive(Default)]
    struct RecordingPublisher {
        calls: Mutex<Vec<(String, String, Option<String>, usize)>>,
    }

    #[async_trait]
    impl CommandPublisher for RecordingPublisher {
        async fn publish(
            &self,
            token: &SecretString,
            application_id: &str,
            guild_id: Option<&str>,
            commands: &[CommandDefinition],
        ) -> Result<usize, RestError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((
                    token.expose_secret().to_string(),
                    application_id.to_string(),
                    guild_id.map(str::to_string),
                    commands.len(),
                ));
            }
            if token.expose_secret() == "revoked" {
                return Err(RestError::UnknownTenant(application_id.to_string()));
            }
            Ok(commands.len())
        }
    }

    fn tenant(id: &str, token: &str, action: LifecycleAction) -> NewTenant {
        NewTenant {
            id: TenantId(id.to_string()),
            owner_id: format!("owner-{id}"),
            token: token.to_string().into(),
            public_key: "ab".repeat(32),
            action,
            display_name: "Bot".to_string(),
            discriminator: "0001".to_string(),
            avatar_ref: None,
            supersedes: None,
        }
    }

    #[tokio::test]
    async fn primary_and_active_tenants_are_published() {
        let tenants = InMemoryTenantRepository::default();
        tenants.insert(tenant("200", "token-200", LifecycleAction::Start)).await.expect("200");
        tenants.insert(tenant("201", "revoked", LifecycleAction::Restart)).await.expect("201");
        tenants.insert(tenant("202", "token-202", LifecycleAction::Delete)).await.expect("202");
        let primary = PrimaryTenant {
            id: TenantId("100".to_string()),
            public_key: "11".repeat(32),
            token: "primary-token".to_string().into(),
        };
        let publisher = RecordingPublisher::default();
        let commands = vec![CommandDefinition::new("about", "About")];

        let report = publish_commands(
            &publisher,
            &tenants,
            PrimaryTarget { tenant: &primary, application_id: "100", guild_id: Some("dev-guild") },
            &commands,
        )
        .await
        .expect("publish");

        assert_eq!(report.published, vec!["100".to_string(), "200".to_string()]);
        assert_eq!(report.failed, vec!["201".to_string()]);
        let calls = publisher.calls.lock().expect("calls").clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], ("primary-token".to_string(), "100".to_string(), Some("dev-guild".to_string()), 1));
        assert_eq!(calls[1].2, None);
    }
}
