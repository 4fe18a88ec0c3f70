use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::actions::ActionConfig;
use crate::domain::PartConfig;
use crate::error::{PunchError, Result};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "punch.toml";
pub const DEFAULT_VERSION_FILE_NAME: &str = "punch_version.toml";

pub const DEFAULT_CONFIG_FILE_CONTENT: &str = r#"version = ["major", "minor", "patch"]

files = []

[globals]
serializer = "{{major}}.{{minor}}.{{patch}}"

[vcs]
name = "git"
commit_message = "Version updated from {{ current_version }} to {{ new_version }}"
"#;

pub const DEFAULT_VERSION_FILE_CONTENT: &str = "major = 0\nminor = 1\npatch = 0\n";

pub const DEFAULT_COMMIT_MESSAGE: &str =
    "Version update {{ current_version }} -> {{ new_version }}";

/// Represents the complete configuration of punch.
///
/// Contains the declared version parts, the serializers, the files to update,
/// the version control settings and the named actions.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub globals: GlobalsConfig,

    #[serde(default)]
    pub files: Vec<FileConfig>,

    #[serde(default)]
    pub version: Vec<PartConfig>,

    #[serde(default)]
    pub vcs: Option<VcsConfig>,

    #[serde(default)]
    pub actions: BTreeMap<String, ActionConfig>,
}

/// Settings shared by every file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GlobalsConfig {
    /// Serializers used for files that do not declare their own; the first
    /// one names the version in commit messages and tags.
    #[serde(
        default = "default_serializers",
        deserialize_with = "one_or_many"
    )]
    pub serializer: Vec<String>,
}

/// Returns the default global serializer list.
fn default_serializers() -> Vec<String> {
    vec!["{{major}}.{{minor}}.{{patch}}".to_string()]
}

impl Default for GlobalsConfig {
    fn default() -> Self {
        GlobalsConfig {
            serializer: default_serializers(),
        }
    }
}

/// A file whose content carries the version.
///
/// Either a bare path (uses the global serializers) or a table:
///
/// ```toml
/// [[files]]
/// path = "setup.py"
/// serializer = ["{{major}}.{{minor}}.{{patch}}", "v{{major}}.{{minor}}"]
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(from = "RawFileConfig")]
pub struct FileConfig {
    pub path: PathBuf,
    pub serializers: Vec<String>,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>, serializers: Vec<String>) -> Self {
        FileConfig {
            path: path.into(),
            serializers,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFileConfig {
    Path(PathBuf),
    Table {
        path: PathBuf,
        #[serde(default, deserialize_with = "one_or_many")]
        serializer: Vec<String>,
    },
}

impl From<RawFileConfig> for FileConfig {
    fn from(raw: RawFileConfig) -> Self {
        match raw {
            RawFileConfig::Path(path) => FileConfig::new(path, Vec::new()),
            RawFileConfig::Table { path, serializer } => FileConfig::new(path, serializer),
        }
    }
}

/// Version control settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VcsConfig {
    /// `git` or `git-flow`
    pub name: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default)]
    pub options: VcsOptions,
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

/// Adapter specific switches. Unused ones are ignored by each adapter.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VcsOptions {
    /// Work on a `release/<version>` branch merged back on finish (git)
    #[serde(default = "default_true")]
    pub make_release_branch: bool,

    /// Create an annotated tag instead of a lightweight one (git)
    #[serde(default)]
    pub annotate_tags: bool,

    /// Template of the tag annotation
    #[serde(default = "default_annotation_message")]
    pub annotation_message: String,

    /// Branch the release starts from and is merged into (git)
    #[serde(default = "default_target_branch")]
    pub target_branch: String,
}

fn default_true() -> bool {
    true
}

fn default_annotation_message() -> String {
    "Version {{ new_version }}".to_string()
}

fn default_target_branch() -> String {
    "master".to_string()
}

impl Default for VcsOptions {
    fn default() -> Self {
        VcsOptions {
            make_release_branch: default_true(),
            annotate_tags: false,
            annotation_message: default_annotation_message(),
            target_branch: default_target_branch(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            globals: GlobalsConfig::default(),
            files: Vec::new(),
            version: vec![
                PartConfig::integer("major"),
                PartConfig::integer("minor"),
                PartConfig::integer("patch"),
            ],
            vcs: Some(VcsConfig {
                name: "git".to_string(),
                commit_message: "Version updated from {{ current_version }} to {{ new_version }}"
                    .to_string(),
                options: VcsOptions::default(),
            }),
            actions: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parses and validates configuration text.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| PunchError::configuration(format!("invalid configuration: {}", e)))?;
        config.apply_global_serializers();
        config.validate()?;
        Ok(config)
    }

    /// Files without serializers of their own use the global ones.
    fn apply_global_serializers(&mut self) {
        for file in &mut self.files {
            if file.serializers.is_empty() {
                file.serializers = self.globals.serializer.clone();
            }
        }
    }

    /// Checks the invariants the rest of punch relies on.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(PunchError::configuration(
                "the configuration does not declare any version part",
            ));
        }

        let mut seen = HashSet::new();
        for part in &self.version {
            if !seen.insert(part.name.as_str()) {
                return Err(PunchError::configuration(format!(
                    "version part '{}' is declared twice",
                    part.name
                )));
            }
        }

        if self.globals.serializer.is_empty() {
            return Err(PunchError::configuration(
                "the global serializer list is empty",
            ));
        }

        if let Some(vcs) = &self.vcs {
            if !matches!(vcs.name.as_str(), "git" | "git-flow") {
                return Err(PunchError::configuration(format!(
                    "the requested version control system '{}' is not supported",
                    vcs.name
                )));
            }
        }

        Ok(())
    }

    /// The serializer naming the version (first global serializer).
    pub fn main_serializer(&self) -> &str {
        self.globals
            .serializer
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Looks up a configured action by name.
    pub fn action(&self, name: &str) -> Result<&ActionConfig> {
        self.actions.get(name).ok_or_else(|| {
            PunchError::configuration(format!("the requested action '{}' is not defined", name))
        })
    }
}

/// Accepts either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Loads the configuration file.
///
/// # Arguments
/// * `config_path` - Path of the TOML configuration file
///
/// # Returns
/// * `Ok(Config)` - Parsed configuration, global serializers applied to files
/// * `Err(PunchError::Configuration)` - If the file cannot be read, parsed or
///   fails validation
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config> {
    let path = config_path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        PunchError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "loading configuration");
    Config::from_toml_str(&content)
}

/// Writes the default configuration and version files into `dir`.
///
/// Existing files are left alone. Returns the paths that were created.
pub fn init_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut created = Vec::new();

    for (name, content) in [
        (DEFAULT_CONFIG_FILE_NAME, DEFAULT_CONFIG_FILE_CONTENT),
        (DEFAULT_VERSION_FILE_NAME, DEFAULT_VERSION_FILE_CONTENT),
    ] {
        let path = dir.join(name);
        if path.exists() {
            debug!(path = %path.display(), "keeping existing file");
            continue;
        }
        fs::write(&path, content)?;
        created.push(path);
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PartKind;

    #[test]
    fn test_default_content_matches_default_config() {
        let parsed = Config::from_toml_str(DEFAULT_CONFIG_FILE_CONTENT).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_files_use_global_serializers() {
        let config = Config::from_toml_str(
            r#"
version = ["major", "minor"]
files = ["README.md", { path = "setup.py", serializer = "v{{major}}" }]

[globals]
serializer = ["{{major}}.{{minor}}", "{{major}}"]
"#,
        )
        .unwrap();

        assert_eq!(config.files[0].path, PathBuf::from("README.md"));
        assert_eq!(config.files[0].serializers, vec!["{{major}}.{{minor}}", "{{major}}"]);
        assert_eq!(config.files[1].serializers, vec!["v{{major}}"]);
        assert_eq!(config.main_serializer(), "{{major}}.{{minor}}");
    }

    #[test]
    fn test_missing_version_parts() {
        let err = Config::from_toml_str("files = []").unwrap_err();
        assert!(matches!(err, PunchError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_version_parts() {
        let err = Config::from_toml_str(r#"version = ["major", "major"]"#).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_unsupported_vcs() {
        let err = Config::from_toml_str(
            r#"
version = ["major"]

[vcs]
name = "svn"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("svn"));
    }

    #[test]
    fn test_vcs_defaults() {
        let config = Config::from_toml_str(
            r#"
version = ["major"]

[vcs]
name = "git-flow"
"#,
        )
        .unwrap();
        let vcs = config.vcs.unwrap();
        assert_eq!(vcs.commit_message, DEFAULT_COMMIT_MESSAGE);
        assert!(vcs.options.make_release_branch);
        assert!(!vcs.options.annotate_tags);
        assert_eq!(vcs.options.target_branch, "master");
    }

    #[test]
    fn test_actions_and_typed_parts() {
        let config = Config::from_toml_str(
            r#"
version = ["major", { name = "stage", type = "value_list", allowed_values = ["alpha", "beta"] }]

[actions.next_stage]
type = "punch:increase"
part = "stage"
"#,
        )
        .unwrap();

        assert!(matches!(config.version[1].kind, PartKind::ValueList { .. }));
        let action = config.action("next_stage").unwrap();
        assert_eq!(action.kind, "punch:increase");
        assert_eq!(action.options.get("part"), Some(&"stage".to_string()));
        assert!(matches!(
            config.action("missing"),
            Err(PunchError::Configuration(_))
        ));
    }

    #[test]
    fn test_init_files_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let version_path = dir.path().join(DEFAULT_VERSION_FILE_NAME);
        fs::write(&version_path, "major = 5\nminor = 0\npatch = 0\n").unwrap();

        let created = init_files(dir.path()).unwrap();

        assert_eq!(created, vec![dir.path().join(DEFAULT_CONFIG_FILE_NAME)]);
        assert_eq!(
            fs::read_to_string(&version_path).unwrap(),
            "major = 5\nminor = 0\npatch = 0\n"
        );
        assert!(load_config(dir.path().join(DEFAULT_CONFIG_FILE_NAME)).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/punch.toml").unwrap_err();
        assert!(matches!(err, PunchError::Configuration(_)));
    }
}
