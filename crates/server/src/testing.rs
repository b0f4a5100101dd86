//! Shared fixtures for handler and gateway tests.

use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use prosperity_core::{BotIdentity, TenantId};
use prosperity_discord::interaction::{CommandInvocation, CommandOption};
use prosperity_discord::rest::{IdentityService, RestError, RoleSink};
use prosperity_discord::RequestContext;

pub fn context(community_id: &str, actor_id: &str) -> RequestContext {
    RequestContext {
        tenant_id: TenantId("100".to_string()),
        community_id: Some(community_id.to_string()),
        actor_id: Some(actor_id.to_string()),
        channel_id: Some("c1".to_string()),
        correlation_id: "interaction-1".to_string(),
    }
}

pub fn option(name: &str, kind: u8, value: serde_json::Value) -> CommandOption {
    CommandOption { name: name.to_string(), kind, value: Some(value), options: Vec::new() }
}

pub fn subcommand(name: &str, args: Vec<CommandOption>) -> CommandOption {
    CommandOption { name: name.to_string(), kind: 1, value: None, options: args }
}

pub fn group(name: &str, subcommand: CommandOption) -> CommandOption {
    CommandOption { name: name.to_string(), kind: 2, value: None, options: vec![subcommand] }
}

pub fn invocation(name: &str, options: Vec<CommandOption>) -> CommandInvocation {
    CommandInvocation { name: name.to_string(), options }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleCall {
    pub granted: bool,
    pub user_id: String,
    pub role_id: String,
}

impl RoleCall {
    pub fn grant(user_id: &str, role_id: &str) -> Self {
        Self { granted: true, user_id: user_id.to_string(), role_id: role_id.to_string() }
    }

    pub fn revoke(user_id: &str, role_id: &str) -> Self {
        Self { granted: false, user_id: user_id.to_string(), role_id: role_id.to_string() }
    }
}

#[derive(Default)]
pub struct RecordingRoleSink {
    calls: Mutex<Vec<RoleCall>>,
    fail: bool,
}

impl RecordingRoleSink {
    pub fn failing() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail: true }
    }

    pub fn calls(&self) -> Vec<RoleCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: RoleCall, tenant: &TenantId) -> Result<(), RestError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail {
            return Err(RestError::UnknownTenant(tenant.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleSink for RecordingRoleSink {
    async fn grant(
        &self,
        tenant: &TenantId,
        _community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError> {
        self.record(RoleCall::grant(user_id, role_id), tenant)
    }

    async fn revoke(
        &self,
        tenant: &TenantId,
        _community_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), RestError> {
        self.record(RoleCall::revoke(user_id, role_id), tenant)
    }
}

/// Maps known tokens to identities; any other token is refused.
#[derive(Default)]
pub struct StubIdentityService {
    known: Vec<(String, BotIdentity)>,
}

impl StubIdentityService {
    pub fn with(mut self, token: &str, external_id: &str) -> Self {
        self.known.push((
            token.to_string(),
            BotIdentity {
                external_id: external_id.to_string(),
                display_name: format!("Bot {external_id}"),
                discriminator: "0001".to_string(),
                avatar_ref: None,
            },
        ));
        self
    }
}

#[async_trait]
impl IdentityService for StubIdentityService {
    async fn identify(&self, token: &SecretString) -> Result<BotIdentity, RestError> {
        self.known
            .iter()
            .find(|(known, _)| known == token.expose_secret())
            .map(|(_, identity)| identity.clone())
            .ok_or_else(|| RestError::UnknownTenant("token refused".to_string()))
    }
}
