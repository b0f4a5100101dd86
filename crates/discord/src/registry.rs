use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use prosperity_core::errors::ApplicationError;

use crate::context::RequestContext;
use crate::interaction::{CommandInvocation, ComponentActivation};
use crate::responses::InteractionResponse;
use crate::schema::CommandDefinition;

/// Separates a component's logical key from a dynamic suffix.
pub const COMPONENT_SUFFIX_DELIMITER: char = '_';

#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn describe(&self) -> CommandDefinition;

    async fn execute(
        &self,
        ctx: &RequestContext,
        invocation: &CommandInvocation,
    ) -> Result<InteractionResponse, ApplicationError>;
}

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    fn custom_id(&self) -> &'static str;

    async fn execute(
        &self,
        ctx: &RequestContext,
        activation: &ComponentActivation,
    ) -> Result<InteractionResponse, ApplicationError>;
}

/// Command and component tables. Built once at bootstrap, read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    components: HashMap<String, Arc<dyn ComponentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command<H>(&mut self, handler: H)
    where
        H: CommandHandler + 'static,
    {
        let name = handler.describe().name;
        self.commands.insert(name, Arc::new(handler));
    }

    pub fn register_component<H>(&mut self, handler: H)
    where
        H: ComponentHandler + 'static,
    {
        self.components.insert(handler.custom_id().to_string(), Arc::new(handler));
    }

    pub fn command(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.get(name).cloned()
    }

    /// Exact key first, then the segment before the first delimiter.
    pub fn component(&self, key: &str) -> Option<Arc<dyn ComponentHandler>> {
        if let Some(handler) = self.components.get(key) {
            return Some(Arc::clone(handler));
        }

        let (prefix, _) = key.split_once(COMPONENT_SUFFIX_DELIMITER)?;
        self.components.get(prefix).cloned()
    }

    /// Declarations for every registered command, sorted by name.
    pub fn definitions(&self) -> Vec<CommandDefinition> {
        let mut definitions: Vec<_> = self.commands.values().map(|handler| handler.describe()).collect();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}
