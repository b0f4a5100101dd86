use serde::{Serialize, Serializer};

/// Only the invoking member can see the message.
pub const EPHEMERAL: u64 = 1 << 6;

pub const COLOR_DEFAULT: u32 = 0x00ff_d700;
pub const COLOR_ERROR: u32 = 0x00ed_4245;

const ACTION_ROW: u8 = 1;
const STRING_SELECT: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    Pong,
    ChannelMessage,
}

impl Serialize for ResponseKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            Self::Pong => 1,
            Self::ChannelMessage => 4,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: ResponseKind::Pong, data: None }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::ChannelMessage,
            data: Some(ResponseData { content: Some(content.into()), ..ResponseData::default() }),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            kind: ResponseKind::ChannelMessage,
            data: Some(ResponseData { embeds: vec![embed], ..ResponseData::default() }),
        }
    }

    /// Ephemeral red embed used for every failed handler.
    pub fn error(message: impl Into<String>) -> Self {
        Self::embed(Embed::new().description(message).color(COLOR_ERROR)).ephemeral()
    }

    pub fn ephemeral(mut self) -> Self {
        if let Some(data) = self.data.as_mut() {
            data.flags = Some(data.flags.unwrap_or(0) | EPHEMERAL);
        }
        self
    }

    pub fn with_components(mut self, rows: Vec<ActionRow>) -> Self {
        if let Some(data) = self.data.as_mut() {
            data.components.extend(rows);
        }
        self
    }

    pub fn content(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.content.as_deref())
    }

    /// Description of the first embed, or the plain content.
    pub fn text(&self) -> Option<&str> {
        let data = self.data.as_ref()?;
        data.embeds
            .first()
            .and_then(|embed| embed.description.as_deref())
            .or(data.content.as_deref())
    }

    pub fn is_ephemeral(&self) -> bool {
        self.data.as_ref().and_then(|data| data.flags).is_some_and(|flags| flags & EPHEMERAL != 0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    pub components: Vec<SelectMenu>,
}

impl ActionRow {
    pub fn select(menu: SelectMenu) -> Self {
        Self { kind: ACTION_ROW, components: vec![menu] }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectMenu {
    #[serde(rename = "type")]
    kind: u8,
    pub custom_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub options: Vec<SelectOption>,
}

impl SelectMenu {
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self { kind: STRING_SELECT, custom_id: custom_id.into(), placeholder: None, options: Vec::new() }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into(), description: None, emoji: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn emoji(mut self, name: impl Into<String>) -> Self {
        self.emoji = Some(Emoji { name: name.into() });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Emoji {
    pub name: String,
}
