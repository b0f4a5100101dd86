//! Inbound interaction payloads and their normalized envelope.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::TenantId;

const PING: u8 = 1;
const APPLICATION_COMMAND: u8 = 2;
const MESSAGE_COMPONENT: u8 = 3;

const OPTION_SUB_COMMAND: u8 = 1;
const OPTION_SUB_COMMAND_GROUP: u8 = 2;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("interaction payload is not valid json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("interaction type {0} is not supported")]
    Unsupported(u8),
    #[error("interaction of type {0} carries no data")]
    MissingData(u8),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<InteractionMember>,
    #[serde(default)]
    pub user: Option<InteractionUser>,
    #[serde(default)]
    pub token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionMember {
    pub user: Option<InteractionUser>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CommandInvocation {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ComponentActivation {
    pub custom_id: String,
    #[serde(default)]
    pub component_type: u8,
    #[serde(default)]
    pub values: Vec<String>,
}

impl ComponentActivation {
    /// Value of a single-choice select menu.
    pub fn selected(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Suffix following the first `_`, used by keys like `whitelabel::actions_<id>`.
    pub fn key_suffix(&self) -> Option<&str> {
        self.custom_id.split_once('_').map(|(_, suffix)| suffix).filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionKind {
    Liveness,
    Command(CommandInvocation),
    Component(ComponentActivation),
}

/// The normalized unit the router works with.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionEnvelope {
    pub id: String,
    pub tenant_id: TenantId,
    pub community_id: Option<String>,
    pub actor_id: Option<String>,
    pub channel_id: Option<String>,
    pub token: String,
    pub kind: InteractionKind,
}

impl InteractionEnvelope {
    pub fn parse(tenant_id: TenantId, body: &[u8]) -> Result<Self, InteractionError> {
        let interaction: Interaction = serde_json::from_slice(body)?;
        Self::from_interaction(tenant_id, interaction)
    }

    pub fn from_interaction(
        tenant_id: TenantId,
        interaction: Interaction,
    ) -> Result<Self, InteractionError> {
        let kind = match interaction.kind {
            PING => InteractionKind::Liveness,
            APPLICATION_COMMAND => {
                let data = interaction.data.ok_or(InteractionError::MissingData(APPLICATION_COMMAND))?;
                InteractionKind::Command(serde_json::from_value(data)?)
            }
            MESSAGE_COMPONENT => {
                let data = interaction.data.ok_or(InteractionError::MissingData(MESSAGE_COMPONENT))?;
                InteractionKind::Component(serde_json::from_value(data)?)
            }
            other => return Err(InteractionError::Unsupported(other)),
        };

        // Guild interactions carry the actor under `member`, direct messages under `user`.
        let actor_id = interaction
            .member
            .and_then(|member| member.user)
            .or(interaction.user)
            .map(|user| user.id);

        Ok(Self {
            id: interaction.id,
            tenant_id,
            community_id: interaction.guild_id,
            actor_id,
            channel_id: interaction.channel_id,
            token: interaction.token,
            kind,
        })
    }
}

/// Where a command invocation landed in its sub-command tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommandPath<'a> {
    pub group: Option<&'a str>,
    pub subcommand: Option<&'a str>,
    pub args: Arguments<'a>,
}

impl<'a> CommandPath<'a> {
    /// Error for a path the handler does not recognize.
    pub fn unrecognized(&self, command: &str) -> ApplicationError {
        let path = [Some(command), self.group, self.subcommand]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        ApplicationError::NotFound(format!("Unknown command `/{path}`"))
    }
}

impl CommandInvocation {
    /// Walks group, then sub-command, then arguments.
    pub fn path(&self) -> CommandPath<'_> {
        let mut group = None;
        let mut subcommand = None;
        let mut args = self.options.as_slice();

        if let [first] = args {
            if first.kind == OPTION_SUB_COMMAND_GROUP {
                group = Some(first.name.as_str());
                args = first.options.as_slice();
            }
        }
        if let [first] = args {
            if first.kind == OPTION_SUB_COMMAND {
                subcommand = Some(first.name.as_str());
                args = first.options.as_slice();
            }
        }

        CommandPath { group, subcommand, args: Arguments(args) }
    }
}

/// Typed access to the leaf options of an invocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arguments<'a>(&'a [CommandOption]);

impl<'a> Arguments<'a> {
    fn value(&self, name: &str) -> Option<&'a Value> {
        self.0.iter().find(|option| option.name == name).and_then(|option| option.value.as_ref())
    }

    pub fn string(&self, name: &str) -> Option<&'a str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_i64)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    pub fn require_string(&self, name: &str) -> Result<&'a str, ApplicationError> {
        self.string(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| DomainError::MissingOption(name.to_string()).into())
    }

    pub fn require_integer(&self, name: &str) -> Result<i64, ApplicationError> {
        self.integer(name).ok_or_else(|| DomainError::MissingOption(name.to_string()).into())
    }

    pub fn require_number(&self, name: &str) -> Result<f64, ApplicationError> {
        self.number(name).ok_or_else(|| DomainError::MissingOption(name.to_string()).into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
