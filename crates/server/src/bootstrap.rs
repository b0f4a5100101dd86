use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tracing::info;

use prosperity_core::config::{AppConfig, ConfigError, LoadOptions, ServerConfig};
use prosperity_core::errors::ApplicationError;
use prosperity_db::{connect_with_config, migrations, DbPool};
use prosperity_discord::rest::RoleSink;
use prosperity_discord::{DiscordRestClient, DispatchRouter, HandlerRegistry};

use crate::commands::{
    AboutCommand, IgnoredCommand, LeaderboardCommand, LevelCommand, LevelRolesCommand,
    LevelsCommand, SettingsCommand, WhitelabelCommand, XpCommand,
};
use crate::components::{
    BotSelectionComponent, NotificationSelectComponent, WhitelabelActionsComponent,
};
use crate::credentials::{CredentialResolver, PrimaryTenant};
use crate::gateway::{self, GatewayState};
use crate::health;
use crate::publish::{publish_commands, PrimaryTarget, PublishReport};
use crate::roles::TenantRoleSink;
use crate::services::Repositories;
use crate::tenants::TenantLifecycleManager;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub repos: Repositories,
    pub resolver: CredentialResolver,
    pub registry: Arc<HandlerRegistry>,
    pub rest: DiscordRestClient,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Every command and component the gateway answers.
pub fn build_registry(
    repos: &Repositories,
    roles: Arc<dyn RoleSink>,
    tenants: TenantLifecycleManager,
    server: ServerConfig,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register_command(AboutCommand::new(repos.clone()));
    registry.register_command(LeaderboardCommand::new(repos.clone()));
    registry.register_command(LevelCommand::new(repos.clone()));
    registry.register_command(LevelsCommand::new(repos.clone(), roles.clone()));
    registry.register_command(XpCommand::new(repos.clone(), roles.clone()));
    registry.register_command(LevelRolesCommand::new(repos.clone(), roles));
    registry.register_command(IgnoredCommand::new(repos.clone()));
    registry.register_command(SettingsCommand::new(repos.clone()));
    registry.register_command(WhitelabelCommand::new(repos.clone(), tenants.clone(), server));

    registry.register_component(NotificationSelectComponent::new(repos.clone()));
    registry.register_component(BotSelectionComponent::new(tenants.clone()));
    registry.register_component(WhitelabelActionsComponent::new(tenants));

    registry
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let repos = Repositories::sql(db_pool.clone());
    let rest = DiscordRestClient::new(config.discord.api_base_url.clone());
    let resolver =
        CredentialResolver::new(PrimaryTenant::from_config(&config.discord), repos.tenants.clone());
    let roles: Arc<dyn RoleSink> = Arc::new(TenantRoleSink::new(resolver.clone(), rest.clone()));
    let tenants = TenantLifecycleManager::new(repos.tenants.clone(), Arc::new(rest.clone()));
    let registry = Arc::new(build_registry(&repos, roles, tenants, config.server.clone()));
    info!(
        event_name = "system.bootstrap.registry_built",
        correlation_id = "bootstrap",
        commands = registry.command_count(),
        components = registry.component_count(),
        "handler registry built"
    );

    Ok(Application { config, db_pool, repos, resolver, registry, rest })
}

impl Application {
    /// Webhook and liveness routes.
    pub fn http_router(&self) -> Router {
        let dispatch = DispatchRouter::new(self.registry.clone());
        gateway::router(GatewayState::new(self.resolver.clone(), dispatch))
            .merge(health::router(self.db_pool.clone()))
    }

    pub async fn publish_commands(&self) -> Result<PublishReport, ApplicationError> {
        publish_commands(
            &self.rest,
            self.repos.tenants.as_ref(),
            PrimaryTarget {
                tenant: self.resolver.primary(),
                application_id: self.config.discord.application_id(),
                guild_id: self.config.discord.dev_guild_id.as_deref(),
            },
            &self.registry.definitions(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use prosperity_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                primary_bot_id: Some("100".to_string()),
                public_key: Some("ab".repeat(32)),
                bot_token: Some("primary-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_primary_bot_id() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                public_key: Some("ab".repeat(32)),
                bot_token: Some("primary-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("discord.primary_bot_id"));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_registers_every_handler() {
        let app = bootstrap(valid_overrides("sqlite::memory:")).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('tenants', 'community_members', 'level_roles', 'suppressions', 'communities', 'users')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("tables");
        assert_eq!(table_count, 6);

        assert_eq!(app.registry.command_count(), 9);
        assert_eq!(app.registry.component_count(), 3);
        let names: Vec<String> = app.registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["about", "ignored", "leaderboard", "level", "levelroles", "levels", "settings", "whitelabel", "xp"]
        );
    }

    #[tokio::test]
    async fn http_router_serves_health_without_signature() {
        let app = bootstrap(valid_overrides("sqlite::memory:")).await.expect("bootstrap");

        let response = app
            .http_router()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let unsigned = app
            .http_router()
            .oneshot(Request::post("/interactions/100").body(Body::from("{}")).expect("request"))
            .await
            .expect("response");
        assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);
    }
}
