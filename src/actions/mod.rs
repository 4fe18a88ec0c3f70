//! Version actions
//!
//! An action turns the current [Version] into a new one. Actions are looked up
//! by name in an [ActionRegistry]; the process-wide registry is built once on
//! first use and never changes afterwards.
//!
//! Built-in actions:
//!
//! - `punch:increase` ([IncreaseAction]): increase one part, reset the later ones
//! - `punch:set` ([SetAction]): assign explicit values to one or more parts

pub mod increase;
pub mod set;

pub use increase::IncreaseAction;
pub use set::SetAction;

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::Deserialize;
use tracing::debug;

use crate::domain::Version;
use crate::error::{PunchError, Result};

pub const INCREASE: &str = "punch:increase";
pub const SET: &str = "punch:set";

/// A transform from the current version to a new one.
///
/// Implementations must not modify their input: callers keep the original
/// version to render the old strings.
pub trait Action: Send + Sync {
    fn process_version(&self, version: &Version) -> Result<Version>;
}

/// Builds an action from its configuration.
pub type ActionConstructor = fn(&ActionConfig) -> Result<Box<dyn Action>>;

/// Configuration of a single action invocation.
///
/// In `punch.toml`:
///
/// ```toml
/// [actions.next_build]
/// type = "punch:increase"
/// part = "build"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "toml::Table")]
pub struct ActionConfig {
    /// Registry key of the action (`type` in the config file)
    pub kind: String,
    /// Action specific `name = value` options
    pub options: BTreeMap<String, String>,
    /// Reset every part after the one being set
    pub reset_on_set: bool,
}

impl ActionConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        ActionConfig {
            kind: kind.into(),
            options: BTreeMap::new(),
            reset_on_set: false,
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Merges invocation options over the configured ones.
    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn with_reset_on_set(mut self, reset_on_set: bool) -> Self {
        self.reset_on_set = self.reset_on_set || reset_on_set;
        self
    }
}

impl TryFrom<toml::Table> for ActionConfig {
    type Error = String;

    fn try_from(mut table: toml::Table) -> std::result::Result<Self, Self::Error> {
        let kind = match table.remove("type") {
            Some(toml::Value::String(kind)) => kind,
            Some(_) => return Err("the action 'type' field must be a string".to_string()),
            None => return Err("the action configuration is missing the 'type' field".to_string()),
        };

        let reset_on_set = match table.remove("reset_on_set") {
            Some(toml::Value::Boolean(flag)) => flag,
            Some(_) => return Err("'reset_on_set' must be a boolean".to_string()),
            None => false,
        };

        let mut options = BTreeMap::new();
        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(n) => n.to_string(),
                other => return Err(format!("option '{}' has unsupported value {}", key, other)),
            };
            options.insert(key, value);
        }

        Ok(ActionConfig {
            kind,
            options,
            reset_on_set,
        })
    }
}

/// Name → constructor table of available actions.
pub struct ActionRegistry {
    constructors: HashMap<&'static str, ActionConstructor>,
}

static GLOBAL_REGISTRY: LazyLock<ActionRegistry> = LazyLock::new(ActionRegistry::with_builtins);

impl ActionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ActionRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in actions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(INCREASE, IncreaseAction::from_config);
        registry.register(SET, SetAction::from_config);
        registry
    }

    /// The process-wide registry, read-only once built.
    pub fn global() -> &'static ActionRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn register(&mut self, name: &'static str, constructor: ActionConstructor) {
        debug!(action = name, "registering action");
        self.constructors.insert(name, constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered action names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the action selected by `config.kind`.
    ///
    /// # Returns
    /// * `Err(PunchError::Configuration)` - If the kind is not registered or
    ///   the options are incomplete
    /// * `Err(PunchError::Validation)` - If the options contradict each other
    pub fn build(&self, config: &ActionConfig) -> Result<Box<dyn Action>> {
        let constructor = self.constructors.get(config.kind.as_str()).ok_or_else(|| {
            PunchError::configuration(format!(
                "unknown action type '{}' (available: {})",
                config.kind,
                self.names().join(", ")
            ))
        })?;
        debug!(action = %config.kind, options = ?config.options, "building action");
        constructor(config)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
