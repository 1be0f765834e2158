//! Configuration module for the mini-event binary.
//!
//! Loads the wiring file (targets, listeners, relays and fires) from TOML
//! and checks that it describes a scenario that can actually be replayed.

pub mod file;

pub use file::{BuiltinAction, FileConfig, FireConfig, ListenerAction, ListenerConfig};

use file::RelayConfig;
use mini_event::{Handler, WILDCARD};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Read, parse and validate the wiring file.
    pub fn load(&self) -> Result<FileConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let file_config: FileConfig = toml::from_str(&config_content)?;
        validate(&file_config)?;
        tracing::debug!(
            targets = file_config.targets.len(),
            listeners = file_config.listeners.len(),
            relays = file_config.relays.len(),
            fires = file_config.fires.len(),
            "configuration validated"
        );
        Ok(file_config)
    }
}

pub fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for name in &config.targets {
        if name.is_empty() {
            return Err(invalid("target names must not be empty"));
        }
        if !names.insert(name.as_str()) {
            return Err(invalid(format!("target {name} is declared twice")));
        }
    }

    let known = |name: &str, role: &str| {
        if names.contains(name) {
            Ok(())
        } else {
            Err(invalid(format!("{role} references unknown target {name}")))
        }
    };

    for listener in &config.listeners {
        known(&listener.target, "listener")?;
        if listener.event.is_empty() {
            return Err(invalid(format!(
                "listener on {} has an empty event name",
                listener.target
            )));
        }
        if let ListenerAction::Literal(value) = &listener.action {
            Handler::try_from(value).map_err(|e| {
                invalid(format!(
                    "listener for {} on {}: {e}",
                    listener.event, listener.target
                ))
            })?;
        }
    }

    for relay in &config.relays {
        known(&relay.from, "relay")?;
        known(&relay.to, "relay")?;
        if relay.event.is_empty() {
            return Err(invalid(format!(
                "relay from {} has an empty event name",
                relay.from
            )));
        }
        if let Some(to_event) = &relay.to_event {
            if to_event.is_empty() || to_event == WILDCARD {
                return Err(invalid(format!(
                    "relay from {} cannot fire `{to_event}` on {}",
                    relay.from, relay.to
                )));
            }
        } else if relay.event == WILDCARD {
            return Err(invalid(format!(
                "relay of `*` from {} needs a `to_event`",
                relay.from
            )));
        }
    }

    if let Some(relay) = relay_cycle(&config.relays) {
        return Err(invalid(format!(
            "relay of `{}` from {} to {} feeds back into itself",
            relay.event, relay.from, relay.to
        )));
    }

    for fire in &config.fires {
        known(&fire.target, "fire")?;
        if fire.event.is_empty() || fire.event == WILDCARD {
            return Err(invalid(format!(
                "cannot fire `{}` on {}",
                fire.event, fire.target
            )));
        }
    }

    Ok(())
}

/// The first relay that, through any chain of relays, ends up firing the
/// event it listens to again.
fn relay_cycle(relays: &[RelayConfig]) -> Option<&RelayConfig> {
    let feeds = |upstream: &RelayConfig, downstream: &RelayConfig| {
        downstream.from == upstream.to
            && (downstream.event == WILDCARD || downstream.event == destination_event(upstream))
    };

    (0..relays.len()).find_map(|start| {
        let mut visited = vec![false; relays.len()];
        let mut pending = vec![start];
        while let Some(current) = pending.pop() {
            for (next, relay) in relays.iter().enumerate() {
                if !feeds(&relays[current], relay) {
                    continue;
                }
                if next == start {
                    return Some(&relays[start]);
                }
                if !visited[next] {
                    visited[next] = true;
                    pending.push(next);
                }
            }
        }
        None
    })
}

fn destination_event(relay: &RelayConfig) -> &str {
    relay.to_event.as_deref().unwrap_or(&relay.event)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
