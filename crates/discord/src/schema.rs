//! Command declarations published to the platform.

use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionType {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Number,
}

impl OptionType {
    pub fn code(self) -> u8 {
        match self {
            Self::SubCommand => 1,
            Self::SubCommandGroup => 2,
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
            Self::User => 6,
            Self::Channel => 7,
            Self::Role => 8,
            Self::Number => 10,
        }
    }
}

impl Serialize for OptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Hidden from everyone but administrators until a server grants it further.
pub const ADMINS_ONLY: &str = "0";
pub const ADMINISTRATOR: &str = "8";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
    pub dm_permission: bool,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            default_member_permissions: None,
            dm_permission: false,
        }
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    pub fn default_permissions(mut self, bits: &str) -> Self {
        self.default_member_permissions = Some(bits.to_string());
        self
    }

    pub fn allow_in_dms(mut self) -> Self {
        self.dm_permission = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionDefinition {
    #[serde(rename = "type")]
    pub kind: OptionType,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl OptionDefinition {
    pub fn new(kind: OptionType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            options: Vec::new(),
            choices: Vec::new(),
            min_value: None,
            max_value: None,
        }
    }

    pub fn subcommand(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionType::SubCommand, name, description)
    }

    pub fn group(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionType::SubCommandGroup, name, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.choices.push(OptionChoice { name: name.into(), value: value.into() });
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }
}
