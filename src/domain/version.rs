use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::domain::part::{PartConfig, PartKind, PartValue, VersionPart};
use crate::error::{PunchError, Result};

/// A version made of ordered, typed parts (e.g. `major`, `minor`, `patch`).
///
/// Transforms never touch `self`: they return a new `Version`, so callers can
/// keep the previous one around and diff the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<VersionPart>,
}

impl Version {
    /// Creates a version with every declared part set to its zero value.
    pub fn zero(declared: &[PartConfig]) -> Result<Self> {
        check_unique_names(declared)?;
        Ok(Version {
            parts: declared.iter().map(VersionPart::zero).collect(),
        })
    }

    /// Reads the version file at `path`.
    ///
    /// # Arguments
    /// * `path` - Version file, one `name = value` assignment per line
    /// * `declared` - Parts declared in the configuration, in order
    ///
    /// # Returns
    /// * `Ok(Version)` - Every declared part, typed according to its kind
    /// * `Err(PunchError::Parse)` - If the file is malformed, a part is missing
    ///   or a value does not fit its part's kind
    pub fn from_store<P: AsRef<Path>>(path: P, declared: &[PartConfig]) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PunchError::parse(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "reading version file");
        Self::from_store_str(&content, declared)
    }

    /// Parses version file content. See [`Version::from_store`].
    pub fn from_store_str(content: &str, declared: &[PartConfig]) -> Result<Self> {
        check_unique_names(declared)?;

        let table: toml::Table = toml::from_str(content)
            .map_err(|e| PunchError::parse(format!("malformed version file: {}", e)))?;

        let mut parts = Vec::with_capacity(declared.len());
        for config in declared {
            let raw = table.get(&config.name).ok_or_else(|| {
                PunchError::parse(format!("part '{}' is missing", config.name))
            })?;
            let value = stored_value(config, raw)?;
            let part = VersionPart::new(config, value)
                .map_err(|e| PunchError::parse(e.to_string()))?;
            parts.push(part);
        }

        Ok(Version { parts })
    }

    /// Writes the version file, one assignment per part in declared order.
    ///
    /// Overwrites `path`. Never call this during a simulated run.
    pub fn to_store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_store_string())?;
        debug!(path = %path.display(), version = %self, "version file written");
        Ok(())
    }

    pub fn to_store_string(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            let value = match &part.value {
                PartValue::Integer(n) => n.to_string(),
                PartValue::Text(s) => toml::Value::String(s.clone()).to_string(),
            };
            out.push_str(&format!("{} = {}\n", part.name, value));
        }
        out
    }

    pub fn parts(&self) -> &[VersionPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&PartValue> {
        self.parts.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Assigns `value` to the named part.
    ///
    /// # Returns
    /// * `Err(PunchError::Configuration)` - If no such part is declared
    /// * `Err(PunchError::Validation)` - If the value does not fit the part's kind
    pub fn set_part(&mut self, name: &str, value: PartValue) -> Result<()> {
        let index = self.index_of(name)?;
        let part = &self.parts[index];
        let value = match value {
            PartValue::Text(raw) if part.kind == PartKind::Integer => part.coerce(&raw)?,
            other => other,
        };
        let config = PartConfig {
            name: part.name.clone(),
            kind: part.kind.clone(),
        };
        self.parts[index] = VersionPart::new(&config, value)?;
        Ok(())
    }

    /// Returns a copy with `name` increased and every later part reset.
    pub fn increase_part(&self, name: &str) -> Result<Version> {
        let index = self.index_of(name)?;
        let mut next = self.clone();
        next.parts[index].value = self.parts[index].next_value()?;
        next.reset_from(index + 1);
        Ok(next)
    }

    /// Returns a copy with every part declared after `name` reset to its zero value.
    pub fn reset_after(&self, name: &str) -> Result<Version> {
        let index = self.index_of(name)?;
        let mut next = self.clone();
        next.reset_from(index + 1);
        Ok(next)
    }

    /// Name → rendered value, in declared order.
    pub fn as_mapping(&self) -> VersionMapping {
        VersionMapping(
            self.parts
                .iter()
                .map(|p| (p.name.clone(), p.value.to_string()))
                .collect(),
        )
    }

    /// Position of the named part, or a configuration error.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.parts
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PunchError::configuration(format!("unknown version part '{}'", name)))
    }

    fn reset_from(&mut self, start: usize) {
        for part in self.parts.iter_mut().skip(start) {
            part.value = part.zero_value();
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|p| format!("{}={}", p.name, p.value))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

/// Ordered name → string view of a version, used for template rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionMapping(Vec<(String, String)>);

impl VersionMapping {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Adds (or overrides) a variable that is not a version part, such as
    /// `current_version` for commit messages.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn check_unique_names(declared: &[PartConfig]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for config in declared {
        if !seen.insert(config.name.as_str()) {
            return Err(PunchError::configuration(format!(
                "version part '{}' is declared twice",
                config.name
            )));
        }
    }
    Ok(())
}

fn stored_value(config: &PartConfig, raw: &toml::Value) -> Result<PartValue> {
    match (&config.kind, raw) {
        (PartKind::Integer, toml::Value::Integer(n)) => u64::try_from(*n)
            .map(PartValue::Integer)
            .map_err(|_| {
                PunchError::parse(format!("part '{}' must not be negative", config.name))
            }),
        (PartKind::Integer, toml::Value::String(s)) => {
            s.trim().parse::<u64>().map(PartValue::Integer).map_err(|_| {
                PunchError::parse(format!(
                    "part '{}' must be an integer, found '{}'",
                    config.name, s
                ))
            })
        }
        (PartKind::String | PartKind::ValueList { .. }, toml::Value::String(s)) => {
            Ok(PartValue::Text(s.clone()))
        }
        (PartKind::String | PartKind::ValueList { .. }, toml::Value::Integer(n)) => {
            Ok(PartValue::Text(n.to_string()))
        }
        (_, other) => Err(PunchError::parse(format!(
            "part '{}' has an unsupported value {}",
            config.name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semver_parts() -> Vec<PartConfig> {
        vec![
            PartConfig::integer("major"),
            PartConfig::integer("minor"),
            PartConfig::integer("patch"),
        ]
    }

    #[test]
    fn test_from_store_str() {
        let v = Version::from_store_str("major = 1\nminor = 2\npatch = 3\n", &semver_parts())
            .unwrap();
        assert_eq!(v.part("major"), Some(&PartValue::Integer(1)));
        assert_eq!(v.part("minor"), Some(&PartValue::Integer(2)));
        assert_eq!(v.part("patch"), Some(&PartValue::Integer(3)));
        assert_eq!(v.part("build"), None);
    }

    #[test]
    fn test_from_store_str_keeps_declared_order() {
        let v = Version::from_store_str("patch = 3\nmajor = 1\nminor = 2\n", &semver_parts())
            .unwrap();
        let names: Vec<&str> = v.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["major", "minor", "patch"]);
    }

    #[test]
    fn test_from_store_str_missing_part() {
        let err = Version::from_store_str("major = 1\nminor = 2\n", &semver_parts()).unwrap_err();
        assert!(matches!(err, PunchError::Parse(_)));
        assert!(err.to_string().contains("'patch' is missing"));
    }

    #[test]
    fn test_from_store_str_wrong_kind() {
        let err =
            Version::from_store_str("major = 1\nminor = 'two'\npatch = 3\n", &semver_parts())
                .unwrap_err();
        assert!(matches!(err, PunchError::Parse(_)));
    }

    #[test]
    fn test_from_store_str_malformed() {
        let err = Version::from_store_str("major 1\n", &semver_parts()).unwrap_err();
        assert!(matches!(err, PunchError::Parse(_)));
    }

    #[test]
    fn test_from_store_str_quoted_string_part() {
        let declared = vec![PartConfig::integer("major"), PartConfig::string("label")];
        let v = Version::from_store_str("major = 4\nlabel = 'beta'\n", &declared).unwrap();
        assert_eq!(v.part("label"), Some(&PartValue::Text("beta".to_string())));
    }

    #[test]
    fn test_store_string_round_trip() {
        let declared = vec![PartConfig::integer("major"), PartConfig::string("label")];
        let v = Version::from_store_str("label = \"rc 1\"\nmajor = 4\n", &declared).unwrap();
        let stored = v.to_store_string();
        assert_eq!(stored, "major = 4\nlabel = \"rc 1\"\n");
        assert_eq!(Version::from_store_str(&stored, &declared).unwrap(), v);
    }

    #[test]
    fn test_increase_part_resets_later_parts() {
        let v = Version::from_store_str("major = 1\nminor = 1\npatch = 1\n", &semver_parts())
            .unwrap();
        let next = v.increase_part("minor").unwrap();

        assert_eq!(next.part("major"), Some(&PartValue::Integer(1)));
        assert_eq!(next.part("minor"), Some(&PartValue::Integer(2)));
        assert_eq!(next.part("patch"), Some(&PartValue::Integer(0)));
        // the original is untouched
        assert_eq!(v.part("minor"), Some(&PartValue::Integer(1)));
    }

    #[test]
    fn test_set_part_unknown_name() {
        let mut v = Version::zero(&semver_parts()).unwrap();
        let err = v.set_part("build", PartValue::Integer(1)).unwrap_err();
        assert!(matches!(err, PunchError::Configuration(_)));
    }

    #[test]
    fn test_set_part_coerces_text_for_integer_parts() {
        let mut v = Version::zero(&semver_parts()).unwrap();
        v.set_part("minor", PartValue::Text("7".to_string())).unwrap();
        assert_eq!(v.part("minor"), Some(&PartValue::Integer(7)));
    }

    #[test]
    fn test_duplicate_part_names_rejected() {
        let declared = vec![PartConfig::integer("major"), PartConfig::integer("major")];
        assert!(matches!(
            Version::zero(&declared),
            Err(PunchError::Configuration(_))
        ));
    }

    #[test]
    fn test_as_mapping() {
        let v = Version::from_store_str("major = 1\nminor = 2\npatch = 3\n", &semver_parts())
            .unwrap();
        let mapping = v.as_mapping();
        let pairs: Vec<(&str, &str)> = mapping.iter().collect();
        assert_eq!(pairs, vec![("major", "1"), ("minor", "2"), ("patch", "3")]);

        let mapping = mapping.with_extra("new_version", "1.2.3");
        assert_eq!(mapping.get("new_version"), Some("1.2.3"));
        assert_eq!(mapping.get("major"), Some("1"));
    }

    #[test]
    fn test_version_file_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("punch_version.toml");
        std::fs::write(&path, "major = 0\nminor = 9\npatch = 9\n").unwrap();

        let v = Version::from_store(&path, &semver_parts()).unwrap();
        let next = v.increase_part("major").unwrap();
        next.to_store(&path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "major = 1\nminor = 0\npatch = 0\n"
        );
    }

    #[test]
    fn test_from_store_missing_file() {
        let err = Version::from_store("/nonexistent/punch_version.toml", &semver_parts())
            .unwrap_err();
        assert!(matches!(err, PunchError::Parse(_)));
    }
}
