//! TOML file configuration structures.
//!
//! These structs directly map to the `mini-event.toml` wiring file.

use mini_event::DelegateOptions;
use serde::Deserialize;
use serde_json::Value;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Names of the event targets to create.
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
    #[serde(default)]
    pub relays: Vec<RelayConfig>,
    /// Events fired once the wiring is in place, in order.
    #[serde(default)]
    pub fires: Vec<FireConfig>,
}

/// A handler registered on a target.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    pub target: String,
    /// Event name, or `*` for every event.
    pub event: String,
    pub action: ListenerAction,
    #[serde(default)]
    pub once: bool,
    /// Shown in the log line of a `log` action.
    pub label: Option<String>,
}

/// What a configured listener does when it runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListenerAction {
    Builtin(BuiltinAction),
    /// Anything else is taken as a literal handler value. Only `false` is
    /// accepted.
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinAction {
    Log,
    PreventDefault,
    StopPropagation,
    StopImmediatePropagation,
    DestroyEvents,
}

/// Re-fire events of one target on another.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub from: String,
    pub event: String,
    pub to: String,
    /// Type used on the destination. Defaults to `event`.
    pub to_event: Option<String>,
    #[serde(default)]
    pub options: DelegateOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FireConfig {
    pub target: String,
    pub event: String,
    pub payload: Option<Value>,
}
