//! Template rendering
//!
//! Templates are plain strings with `{{ name }}` placeholders, e.g.
//! `"v{{major}}.{{minor}}"`. A placeholder whose name is not in the mapping is
//! kept verbatim, so templates can carry literal braces for other tools.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::FileConfig;
use crate::domain::VersionMapping;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("Invalid regex")
});

/// A template rendered for the current and the new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub current: String,
    pub new: String,
}

impl VersionChange {
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        VersionChange {
            current: current.into(),
            new: new.into(),
        }
    }

    /// Whether rendering the template gave different strings.
    pub fn is_change(&self) -> bool {
        self.current != self.new
    }
}

impl fmt::Display for VersionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.current, self.new)
    }
}

/// Renders `template` with the values of `mapping`.
///
/// # Example
/// ```ignore
/// let mapping = version.as_mapping(); // major=1, minor=2
/// assert_eq!(render("v{{major}}.{{ minor }}", &mapping), "v1.2");
/// assert_eq!(render("{{build}}", &mapping), "{{build}}");
/// ```
pub fn render(template: &str, mapping: &VersionMapping) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| match mapping.get(&caps["name"]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Renders a list of serializers for a pair of versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacer {
    serializers: Vec<String>,
}

impl Replacer {
    /// Creates a replacer; duplicate serializers are dropped, first one wins.
    pub fn new<I, S>(serializers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for serializer in serializers {
            let serializer = serializer.into();
            if !unique.contains(&serializer) {
                unique.push(serializer);
            }
        }
        Replacer {
            serializers: unique,
        }
    }

    /// Collects the main serializers followed by every file's serializers,
    /// deduplicated in first-seen order.
    pub fn from_files(main: &[String], files: &[FileConfig]) -> Self {
        let all = main
            .iter()
            .chain(files.iter().flat_map(|f| f.serializers.iter()))
            .cloned();
        Self::new(all)
    }

    pub fn serializers(&self) -> &[String] {
        &self.serializers
    }

    /// Renders the first serializer, the one used to name the version.
    ///
    /// An empty replacer yields two empty strings.
    pub fn run_main_serializer(
        &self,
        current: &VersionMapping,
        new: &VersionMapping,
    ) -> (String, String) {
        match self.serializers.first() {
            Some(main) => (render(main, current), render(main, new)),
            None => (String::new(), String::new()),
        }
    }

    /// Renders every serializer, in order.
    pub fn run_all_serializers(
        &self,
        current: &VersionMapping,
        new: &VersionMapping,
    ) -> Vec<VersionChange> {
        self.serializers
            .iter()
            .map(|s| VersionChange::new(render(s, current), render(s, new)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PartConfig, Version};

    fn mapping(major: u64, minor: u64, patch: u64) -> VersionMapping {
        let declared = vec![
            PartConfig::integer("major"),
            PartConfig::integer("minor"),
            PartConfig::integer("patch"),
        ];
        Version::from_store_str(
            &format!("major = {}\nminor = {}\npatch = {}", major, minor, patch),
            &declared,
        )
        .unwrap()
        .as_mapping()
    }

    #[test]
    fn test_render_placeholders() {
        let m = mapping(1, 2, 3);
        assert_eq!(render("{{major}}.{{minor}}.{{patch}}", &m), "1.2.3");
        assert_eq!(render("version = \"v{{ major }}.{{minor }}\"", &m), "version = \"v1.2\"");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let m = mapping(1, 2, 3);
        assert_eq!(render("{{major}}-{{build}}", &m), "1-{{build}}");
        assert_eq!(render("{major}.{{minor}}", &m), "{major}.2");
        assert_eq!(render("no placeholders", &m), "no placeholders");
    }

    #[test]
    fn test_render_is_pure() {
        let m = mapping(4, 0, 1);
        let template = "{{major}}.{{minor}}.{{patch}}";
        assert_eq!(render(template, &m), render(template, &m));
    }

    #[test]
    fn test_render_special_variables() {
        let m = mapping(1, 0, 0)
            .with_extra("current_version", "0.9.0")
            .with_extra("new_version", "1.0.0");
        assert_eq!(
            render("Version updated {{ current_version }} -> {{ new_version }}", &m),
            "Version updated 0.9.0 -> 1.0.0"
        );
    }

    #[test]
    fn test_run_main_serializer() {
        let replacer = Replacer::new(["{{major}}.{{minor}}.{{patch}}", "{{major}}.{{minor}}"]);
        let (current, new) = replacer.run_main_serializer(&mapping(1, 2, 3), &mapping(1, 3, 0));
        assert_eq!(current, "1.2.3");
        assert_eq!(new, "1.3.0");
    }

    #[test]
    fn test_run_all_serializers_deduplicates_in_order() {
        let replacer = Replacer::new([
            "{{major}}.{{minor}}",
            "v{{major}}",
            "{{major}}.{{minor}}",
        ]);
        let changes = replacer.run_all_serializers(&mapping(1, 2, 3), &mapping(1, 3, 0));
        assert_eq!(
            changes,
            vec![VersionChange::new("1.2", "1.3"), VersionChange::new("v1", "v1")]
        );
        assert!(changes[0].is_change());
        assert!(!changes[1].is_change());
    }

    #[test]
    fn test_from_files() {
        let files = vec![
            FileConfig::new("a.txt", vec!["v{{major}}".to_string()]),
            FileConfig::new(
                "b.txt",
                vec!["{{major}}.{{minor}}.{{patch}}".to_string(), "{{minor}}".to_string()],
            ),
        ];
        let replacer = Replacer::from_files(&["{{major}}.{{minor}}.{{patch}}".to_string()], &files);
        assert_eq!(
            replacer.serializers(),
            &["{{major}}.{{minor}}.{{patch}}", "v{{major}}", "{{minor}}"]
        );
    }

    #[test]
    fn test_version_change_display() {
        assert_eq!(VersionChange::new("1.0", "2.0").to_string(), "1.0 -> 2.0");
    }
}
