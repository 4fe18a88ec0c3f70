use tracing::debug;

use crate::actions::{Action, ActionConfig};
use crate::domain::Version;
use crate::error::{PunchError, Result};

/// Increases one part and resets every part declared after it.
///
/// `[major, minor, patch] = [1, 1, 1]` increased on `minor` gives `[1, 2, 0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreaseAction {
    pub part: String,
}

impl IncreaseAction {
    pub fn new(part: impl Into<String>) -> Self {
        IncreaseAction { part: part.into() }
    }

    /// Reads the required `part` option.
    pub fn from_config(config: &ActionConfig) -> Result<Box<dyn Action>> {
        let part = config.options.get("part").ok_or_else(|| {
            PunchError::configuration(format!(
                "action '{}' needs a 'part' option",
                config.kind
            ))
        })?;
        Ok(Box::new(IncreaseAction::new(part.clone())))
    }
}

impl Action for IncreaseAction {
    fn process_version(&self, version: &Version) -> Result<Version> {
        let next = version.increase_part(&self.part)?;
        debug!(part = %self.part, from = %version, to = %next, "part increased");
        Ok(next)
    }
}
