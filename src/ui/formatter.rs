//! Formatting functions for terminal output.
//!
//! Every function prints directly; nothing here reads input.

use console::style;

use crate::cli::FileReport;
use crate::domain::Version;
use crate::replacer::VersionChange;
use crate::vcs::VcsConfiguration;
use crate::warning::UpdateWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a skipped file to the user.
///
/// # Arguments
/// * `warning` - The warning to display
pub fn display_warning(warning: &UpdateWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow().bold(), warning);
}

/// Display every part of a version, one per line.
///
/// # Arguments
/// * `title` - Heading printed above the parts
/// * `version` - The version to display
pub fn display_version(title: &str, version: &Version) {
    println!("\n{}", style(title).bold());
    for part in version.parts() {
        println!("  {}={}", part.name, part.value);
    }
}

/// Display a list of `old -> new` changes, one per line.
pub fn display_changes(changes: &[VersionChange]) {
    for change in changes {
        println!(
            "  * {} -> {}",
            style(&change.current).red(),
            style(&change.new).green()
        );
    }
}

/// Display the changes planned for each configured file.
///
/// Files with nothing to change are listed as such.
pub fn display_file_reports(reports: &[FileReport]) {
    println!("\n{}", style("Files to update:").bold());
    for report in reports {
        println!("  {}", style(report.path.display()).cyan());
        if report.changes.is_empty() {
            println!("    {}", style("nothing to change").dim());
            continue;
        }
        for change in &report.changes {
            println!("    * {} -> {}", change.current, change.new);
        }
    }
}

/// Display the rendered version control settings.
pub fn display_vcs_configuration(configuration: &VcsConfiguration) {
    println!("\n{}", style("Version control:").bold());
    println!("  Name: {}", configuration.name);
    println!("  Commit message: {}", configuration.commit_message);
    println!("  Release: {}", configuration.release_name);
    if configuration.options.make_release_branch {
        println!(
            "  Release branch merged into: {}",
            configuration.options.target_branch
        );
    }
    if configuration.options.annotate_tags {
        println!("  Tag annotation: {}", configuration.annotation_message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_success() {
        // Visual verification test - output is printed to stdout
        display_success("test success");
    }

    #[test]
    fn test_display_file_reports() {
        display_file_reports(&[
            FileReport {
                path: PathBuf::from("VERSION"),
                changes: vec![VersionChange::new("1.0.0", "1.1.0")],
            },
            FileReport {
                path: PathBuf::from("README.md"),
                changes: Vec::new(),
            },
        ]);
    }
}
