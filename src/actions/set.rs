use tracing::debug;

use crate::actions::{Action, ActionConfig};
use crate::domain::{PartValue, Version};
use crate::error::{PunchError, Result};

/// Assigns explicit values to one or more parts.
///
/// With `reset_on_set` only a single part may be given, and every part
/// declared after it is reset to its zero value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetAction {
    values: Vec<(String, String)>,
    reset_on_set: bool,
}

impl SetAction {
    pub fn new(values: Vec<(String, String)>, reset_on_set: bool) -> Result<Self> {
        if values.is_empty() {
            return Err(PunchError::configuration(
                "the set action needs at least one part=value option",
            ));
        }
        if reset_on_set && values.len() > 1 {
            return Err(PunchError::validation(
                "if you specify reset_on_set you may set only one value",
            ));
        }
        Ok(SetAction {
            values,
            reset_on_set,
        })
    }

    /// Every option is a `part = value` assignment.
    pub fn from_config(config: &ActionConfig) -> Result<Box<dyn Action>> {
        let values = config
            .options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(SetAction::new(values, config.reset_on_set)?))
    }
}

impl Action for SetAction {
    fn process_version(&self, version: &Version) -> Result<Version> {
        let mut next = version.clone();
        for (name, value) in &self.values {
            next.set_part(name, PartValue::Text(value.clone()))?;
        }

        if self.reset_on_set {
            if let Some((name, _)) = self.values.first() {
                next = next.reset_after(name)?;
            }
        }

        debug!(from = %version, to = %next, reset = self.reset_on_set, "parts set");
        Ok(next)
    }
}
