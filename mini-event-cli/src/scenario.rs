//! Builds the targets described by a wiring file and replays its fires.

use crate::config::{BuiltinAction, FileConfig, FireConfig, ListenerAction, ListenerConfig};
use mini_event::{Event, EventError, EventTarget, Handler, ListenOptions, Payload, delegate_as};
use serde::Serialize;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown target {0}")]
    UnknownTarget(String),

    #[error("event error on {target}: {source}")]
    Event {
        target: String,
        #[source]
        source: EventError,
    },
}

/// One fired event together with the name of the target that fired it.
#[derive(Debug, Serialize)]
pub struct FireReport {
    pub target: String,
    pub event: Event,
}

/// Named targets with every configured listener and relay attached.
pub struct Scenario {
    targets: HashMap<String, Rc<EventTarget>>,
}

impl Scenario {
    /// Create the targets, then register listeners and relays in file
    /// order. Listeners are registered before relays.
    pub fn build(config: &FileConfig) -> Result<Self, ScenarioError> {
        let targets = config
            .targets
            .iter()
            .map(|name| (name.clone(), Rc::new(EventTarget::new())))
            .collect();
        let scenario = Self { targets };

        for listener in &config.listeners {
            let target = scenario.target(&listener.target)?;
            let handler = listener_handler(listener, target)?;
            let options = if listener.once {
                ListenOptions::new().once()
            } else {
                ListenOptions::new()
            };
            target.on(&listener.event, handler, options);
        }

        for relay in &config.relays {
            let from: &EventTarget = scenario.target(&relay.from)?;
            let to = scenario.target(&relay.to)?;
            let to_event = relay.to_event.as_deref().unwrap_or(&relay.event);
            delegate_as(from, &relay.event, to, to_event, relay.options.clone());
            tracing::debug!(
                from = %relay.from,
                to = %relay.to,
                event_type = %relay.event,
                "relay installed"
            );
        }

        Ok(scenario)
    }

    /// Fire every configured event in order and collect what each fire
    /// returned.
    pub fn replay(&self, fires: &[FireConfig]) -> Result<Vec<FireReport>, ScenarioError> {
        fires
            .iter()
            .map(|fire| {
                let target = self.target(&fire.target)?;
                let payload = fire.payload.clone().map_or(Payload::None, Payload::Value);
                let event = target
                    .fire(&fire.event, payload)
                    .map_err(|source| ScenarioError::Event {
                        target: fire.target.clone(),
                        source,
                    })?;
                Ok(FireReport {
                    target: fire.target.clone(),
                    event,
                })
            })
            .collect()
    }

    pub fn target(&self, name: &str) -> Result<&Rc<EventTarget>, ScenarioError> {
        self.targets
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownTarget(name.to_owned()))
    }
}

fn listener_handler(
    listener: &ListenerConfig,
    target: &Rc<EventTarget>,
) -> Result<Handler, ScenarioError> {
    let action = match &listener.action {
        ListenerAction::Builtin(action) => *action,
        ListenerAction::Literal(value) => {
            return Handler::try_from(value).map_err(|source| ScenarioError::Event {
                target: listener.target.clone(),
                source,
            });
        }
    };

    let handler = match action {
        BuiltinAction::Log => {
            let name = listener.target.clone();
            let label = listener.label.clone().unwrap_or_default();
            Handler::new(move |event, _| {
                let fields = serde_json::to_string(event.fields()).unwrap_or_default();
                tracing::info!(
                    target_name = %name,
                    event_type = event.event_type().unwrap_or_default(),
                    %label,
                    %fields,
                    "event observed"
                );
            })
        }
        BuiltinAction::PreventDefault => Handler::new(|event, _| event.prevent_default()),
        BuiltinAction::StopPropagation => Handler::new(|event, _| event.stop_propagation()),
        BuiltinAction::StopImmediatePropagation => {
            Handler::new(|event, _| event.stop_immediate_propagation())
        }
        BuiltinAction::DestroyEvents => {
            let target = Rc::downgrade(target);
            Handler::new(move |_, _| {
                if let Some(target) = target.upgrade() {
                    target.destroy_events();
                }
            })
        }
    };
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(toml_str: &str) -> (FileConfig, Scenario) {
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let scenario = Scenario::build(&config).unwrap();
        (config, scenario)
    }

    #[test]
    fn test_replay_reports_every_fire() {
        let (config, scenario) = build(
            r#"
targets = ["form"]

[[listeners]]
target = "form"
event = "submit"
action = "prevent-default"

[[fires]]
target = "form"
event = "submit"
payload = { user = "alice" }

[[fires]]
target = "form"
event = "reset"
"#,
        );
        let reports = scenario.replay(&config.fires).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].event.is_default_prevented());
        assert_eq!(reports[0].event.get("user"), Some(&json!("alice")));
        assert!(!reports[1].event.is_default_prevented());

        let form = scenario.target("form").unwrap();
        assert_eq!(reports[0].event.target(), Some(form.id()));
    }

    #[test]
    fn test_false_action_cancels() {
        let (config, scenario) = build(
            r#"
targets = ["a"]

[[listeners]]
target = "a"
event = "*"
action = false
once = true

[[fires]]
target = "a"
event = "x"

[[fires]]
target = "a"
event = "x"
"#,
        );
        let reports = scenario.replay(&config.fires).unwrap();
        assert!(reports[0].event.is_default_prevented());
        assert!(reports[0].event.is_propagation_stopped());
        assert!(!reports[1].event.is_default_prevented());
    }

    #[test]
    fn test_relay_with_sync_state() {
        let (config, scenario) = build(
            r#"
targets = ["child", "parent"]

[[listeners]]
target = "parent"
event = "child-submit"
action = "stop-immediate-propagation"

[[relays]]
from = "child"
event = "submit"
to = "parent"
to_event = "child-submit"
options = { sync_state = true }

[[fires]]
target = "child"
event = "submit"
"#,
        );
        let reports = scenario.replay(&config.fires).unwrap();
        assert!(reports[0].event.is_immediate_propagation_stopped());
        assert!(reports[0].event.is_propagation_stopped());
    }

    #[test]
    fn test_destroy_events_action() {
        let (config, scenario) = build(
            r#"
targets = ["a"]

[[listeners]]
target = "a"
event = "x"
action = "destroy-events"

[[listeners]]
target = "a"
event = "x"
action = "prevent-default"

[[fires]]
target = "a"
event = "x"
"#,
        );
        let reports = scenario.replay(&config.fires).unwrap();
        assert!(!reports[0].event.is_default_prevented());
        assert!(!scenario.target("a").unwrap().has_listeners("x"));
    }

    #[test]
    fn test_unknown_target() {
        let config: FileConfig = toml::from_str(
            r#"
[[listeners]]
target = "ghost"
event = "x"
action = "log"
"#,
        )
        .unwrap();
        assert!(matches!(
            Scenario::build(&config),
            Err(ScenarioError::UnknownTarget(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_report_serializes_event_inline() {
        let (config, scenario) = build(
            r#"
targets = ["a"]

[[fires]]
target = "a"
event = "x"
payload = 5
"#,
        );
        let reports = scenario.replay(&config.fires).unwrap();
        let value = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(value["target"], json!("a"));
        assert_eq!(value["event"]["type"], json!("x"));
        assert_eq!(value["event"]["data"], json!(5));
    }
}
