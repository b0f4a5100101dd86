//! Discord interactions plumbing for prosperity.
//!
//! - **Signature gate** (`signature`) - ed25519 verification over `timestamp || body`
//! - **Interactions** (`interaction`) - wire payloads normalized into an envelope
//! - **Registry** (`registry`) - command and component handler tables
//! - **Router** (`router`) - envelope to handler dispatch
//! - **Responses** (`responses`, `schema`) - response payloads and command declarations
//! - **REST** (`rest`) - identity lookup, role grants, command publication
//!
//! ```text
//! POST /interactions/{tenant} → signature → envelope → DispatchRouter → handler
//!                                                            ↓
//!                                             InteractionResponse ← result
//! ```

pub mod context;
pub mod interaction;
pub mod registry;
pub mod responses;
pub mod rest;
pub mod router;
pub mod schema;
pub mod signature;

pub use context::RequestContext;
pub use interaction::{
    CommandInvocation, ComponentActivation, InteractionEnvelope, InteractionError, InteractionKind,
};
pub use registry::{CommandHandler, ComponentHandler, HandlerRegistry};
pub use responses::InteractionResponse;
pub use rest::{CommandPublisher, DiscordRestClient, IdentityService, RestError, RoleSink};
pub use router::{DispatchRouter, RouteOutcome};
pub use schema::{CommandDefinition, OptionDefinition, OptionType};
