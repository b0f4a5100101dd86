//! Message component handlers, keyed by `custom_id`.

pub mod settings_notifications;
pub mod whitelabel_actions;
pub mod whitelabel_bot_selection;

pub use settings_notifications::NotificationSelectComponent;
pub use whitelabel_actions::WhitelabelActionsComponent;
pub use whitelabel_bot_selection::BotSelectionComponent;
