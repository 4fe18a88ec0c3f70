//! In-place version replacement in configured files

use std::fs;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::config::FileConfig;
use crate::domain::VersionMapping;
use crate::error::{PunchError, Result};
use crate::replacer::{Replacer, VersionChange};

/// Replaces the rendered current version with the new one in a single file.
pub struct FileUpdater {
    config: FileConfig,
    replacer: Replacer,
}

impl FileUpdater {
    pub fn new(config: &FileConfig) -> Self {
        FileUpdater {
            replacer: Replacer::new(config.serializers.iter().cloned()),
            config: config.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Lists the changes `update` would apply to the file as it is now.
    ///
    /// Serializers whose rendering does not change are left out. A file that
    /// holds none of the current renderings is already up to date and gives
    /// an empty list, so after a successful `update` this returns nothing.
    ///
    /// # Returns
    /// * `Ok(Vec<VersionChange>)` - The changes `update` would apply
    /// * `Err(PunchError::PatternMismatch)` - If only some current renderings
    ///   are in the file; `update` would skip it
    pub fn get_summary(
        &self,
        current: &VersionMapping,
        new: &VersionMapping,
    ) -> Result<Vec<VersionChange>> {
        let content = fs::read_to_string(&self.config.path)?;
        let changes = self.changes(current, new);
        if !changes.iter().any(|change| content.contains(&change.current)) {
            return Ok(Vec::new());
        }
        self.check_presence(&content, &changes)?;
        Ok(changes)
    }

    /// Replaces every occurrence of each current rendering with the new one.
    ///
    /// The file is read once and written once. All renderings are replaced in
    /// a single pass over the original text; where two of them overlap, the
    /// longest one wins. If a current rendering is missing from the file,
    /// nothing is written.
    ///
    /// # Returns
    /// * `Ok(Vec<VersionChange>)` - The changes that matched at least once
    /// * `Err(PunchError::PatternMismatch)` - If a current rendering is not in the file
    /// * `Err(PunchError::Io)` - If the file cannot be read or written
    pub fn update(
        &self,
        current: &VersionMapping,
        new: &VersionMapping,
    ) -> Result<Vec<VersionChange>> {
        let path = &self.config.path;
        let original = fs::read_to_string(path)?;

        let changes = self.changes(current, new);
        self.check_presence(&original, &changes)?;
        let (updated, applied) = replace_all(&original, changes)?;

        if updated != original {
            fs::write(path, &updated)?;
            info!(path = %path.display(), changes = applied.len(), "file updated");
        }

        Ok(applied)
    }

    fn changes(&self, current: &VersionMapping, new: &VersionMapping) -> Vec<VersionChange> {
        self.replacer
            .run_all_serializers(current, new)
            .into_iter()
            .filter(VersionChange::is_change)
            .collect()
    }

    fn check_presence(&self, content: &str, changes: &[VersionChange]) -> Result<()> {
        match changes.iter().find(|change| !content.contains(&change.current)) {
            Some(missing) => Err(PunchError::PatternMismatch {
                path: self.config.path.clone(),
                pattern: missing.current.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Substitutes every change in one pass, longest current rendering first.
///
/// Returns the new text and the changes that matched, in their original order.
fn replace_all(content: &str, changes: Vec<VersionChange>) -> Result<(String, Vec<VersionChange>)> {
    if changes.is_empty() {
        return Ok((content.to_string(), changes));
    }

    let mut by_length: Vec<&VersionChange> = changes.iter().collect();
    by_length.sort_by(|a, b| b.current.len().cmp(&a.current.len()));
    let alternation = by_length
        .iter()
        .map(|change| regex::escape(&change.current))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&alternation)
        .map_err(|e| PunchError::configuration(format!("cannot match serializers: {}", e)))?;

    let mut matched = vec![false; changes.len()];
    let updated = pattern
        .replace_all(content, |caps: &Captures| {
            let found = &caps[0];
            match changes.iter().position(|change| change.current == found) {
                Some(index) => {
                    matched[index] = true;
                    changes[index].new.clone()
                }
                None => found.to_string(),
            }
        })
        .into_owned();

    let applied = changes
        .into_iter()
        .zip(matched)
        .filter_map(|(change, hit)| hit.then_some(change))
        .inspect(|change| debug!(%change, "pattern replaced"))
        .collect();
    Ok((updated, applied))
}
