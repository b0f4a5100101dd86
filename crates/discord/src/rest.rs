//! Outbound calls to the platform's REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use prosperity_core::errors::ApplicationError;
use prosperity_core::{BotIdentity, TenantId};

use crate::schema::CommandDefinition;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("no credentials for tenant `{0}`")]
    UnknownTenant(String),
}

impl RestError {
    /// 401 from the platform, i.e. the bot token was refused.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

impl From<RestError> for ApplicationError {
    fn from(error: RestError) -> Self {
        Self::Integration(error.to_string())
    }
}

/// Resolves the identity behind a bot token.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn identify(&self, token: &SecretString) -> Result<BotIdentity, RestError>;
}

/// Grants and revokes community roles as a given tenant's bot.
#[async_trait]
pub trait RoleSink: Send + Sync {
    async fn grant(
        &self,
        tenant: &TenantId,
        community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError>;

    async fn revoke(
        &self,
        tenant: &TenantId,
        community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError>;
}

/// Replaces an application's whole command set.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    async fn publish(
        &self,
        token: &SecretString,
        application_id: &str,
        guild_id: Option<&str>,
        commands: &[CommandDefinition],
    ) -> Result<usize, RestError>;
}

#[derive(Deserialize)]
struct CurrentUser {
    id: String,
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Clone)]
pub struct DiscordRestClient {
    client: Client,
    base_url: String,
}

impl DiscordRestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        request.header("Authorization", format!("Bot {}", token.expose_secret()))
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, RestError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::Status { status, body });
        }
        Ok(response)
    }

    pub async fn add_member_role(
        &self,
        token: &SecretString,
        community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError> {
        let url = self.url(&format!("/guilds/{community_id}/members/{user_id}/roles/{role_id}"));
        Self::send(Self::authorized(self.client.put(url), token)).await.map(|_| ())
    }

    pub async fn remove_member_role(
        &self,
        token: &SecretString,
        community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError> {
        let url = self.url(&format!("/guilds/{community_id}/members/{user_id}/roles/{role_id}"));
        Self::send(Self::authorized(self.client.delete(url), token)).await.map(|_| ())
    }
}

#[async_trait]
impl IdentityService for DiscordRestClient {
    async fn identify(&self, token: &SecretString) -> Result<BotIdentity, RestError> {
        let request = Self::authorized(self.client.get(self.url("/users/@me")), token);
        let user: CurrentUser = Self::send(request).await?.json().await?;

        Ok(BotIdentity {
            external_id: user.id,
            display_name: user.username,
            discriminator: user.discriminator.unwrap_or_else(|| "0".to_string()),
            avatar_ref: user.avatar,
        })
    }
}

#[async_trait]
impl CommandPublisher for DiscordRestClient {
    async fn publish(
        &self,
        token: &SecretString,
        application_id: &str,
        guild_id: Option<&str>,
        commands: &[CommandDefinition],
    ) -> Result<usize, RestError> {
        let path = match guild_id {
            Some(guild) => format!("/applications/{application_id}/guilds/{guild}/commands"),
            None => format!("/applications/{application_id}/commands"),
        };
        let request = Self::authorized(self.client.put(self.url(&path)), token).json(commands);
        Self::send(request).await?;
        Ok(commands.len())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{CommandPublisher, DiscordRestClient, IdentityService, RestError};
    use crate::schema::CommandDefinition;

    fn token() -> SecretString {
        SecretString::from("bot-token".to_string())
    }

    #[tokio::test]
    async fn identify_reads_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .and(header("authorization", "Bot bot-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42",
                "username": "Levels",
                "discriminator": "0001",
                "avatar": "abc"
            })))
            .mount(&server)
            .await;

        let client = DiscordRestClient::new(server.uri());
        let identity = client.identify(&token()).await.expect("identify");

        assert_eq!(identity.external_id, "42");
        assert_eq!(identity.display_name, "Levels");
        assert_eq!(identity.discriminator, "0001");
        assert_eq!(identity.avatar_ref.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn refused_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
            .mount(&server)
            .await;

        let error = DiscordRestClient::new(server.uri()).identify(&token()).await.expect_err("401");
        assert!(error.is_unauthorized());
        assert!(matches!(error, RestError::Status { .. }));
    }

    #[tokio::test]
    async fn role_grant_and_revoke_hit_member_role_route() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/guilds/g1/members/u1/roles/r1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/guilds/g1/members/u1/roles/r0"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = DiscordRestClient::new(format!("{}/", server.uri()));
        client.add_member_role(&token(), "g1", "u1", "r1").await.expect("grant");
        client.remove_member_role(&token(), "g1", "u1", "r0").await.expect("revoke");
    }

    #[tokio::test]
    async fn publish_uses_guild_route_when_scoped() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/applications/900/guilds/g1/commands"))
            .and(body_partial_json(json!([{"name": "about"}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let published = DiscordRestClient::new(server.uri())
            .publish(&token(), "900", Some("g1"), &[CommandDefinition::new("about", "About")])
            .await
            .expect("publish");
        assert_eq!(published, 1);
    }
}
