// tests/config_test.rs
use std::io::Write;
use std::path::PathBuf;

use punch::config::{init_files, load_config, DEFAULT_CONFIG_FILE_NAME, DEFAULT_VERSION_FILE_NAME};
use punch::domain::{PartKind, Version};
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_from_file() {
    let temp_file = write_config(
        r#"
version = [
    "major",
    "minor",
    { name = "build", type = "value_list", allowed_values = ["alpha", "beta", "final"] },
]

files = [
    "VERSION",
    { path = "docs/conf.py", serializer = "'{{major}}.{{minor}}'" },
]

[globals]
serializer = ["{{major}}.{{minor}}-{{build}}", "{{major}}.{{minor}}"]

[vcs]
name = "git"
commit_message = "Release {{ new_version }}"

[vcs.options]
make_release_branch = false
target_branch = "main"

[actions.next_build]
type = "punch:increase"
part = "build"
"#,
    );

    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.version.len(), 3);
    assert!(matches!(config.version[2].kind, PartKind::ValueList { .. }));
    assert_eq!(config.main_serializer(), "{{major}}.{{minor}}-{{build}}");

    assert_eq!(config.files[0].path, PathBuf::from("VERSION"));
    assert_eq!(config.files[0].serializers, config.globals.serializer);
    assert_eq!(config.files[1].serializers, vec!["'{{major}}.{{minor}}'"]);

    let vcs = config.vcs.as_ref().unwrap();
    assert_eq!(vcs.commit_message, "Release {{ new_version }}");
    assert!(!vcs.options.make_release_branch);
    assert_eq!(vcs.options.target_branch, "main");

    let action = config.action("next_build").unwrap();
    assert_eq!(action.kind, "punch:increase");
    assert_eq!(action.options.get("part").map(String::as_str), Some("build"));
}

#[test]
fn test_init_files_are_usable() {
    let dir = TempDir::new().unwrap();

    let created = init_files(dir.path()).unwrap();
    assert_eq!(created.len(), 2);

    let config = load_config(dir.path().join(DEFAULT_CONFIG_FILE_NAME)).unwrap();
    let version =
        Version::from_store(dir.path().join(DEFAULT_VERSION_FILE_NAME), &config.version).unwrap();
    assert_eq!(version.to_string(), "major=0, minor=1, patch=0");
}
