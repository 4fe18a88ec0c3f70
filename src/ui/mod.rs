//! User interface module
//!
//! - `formatter` - Single-purpose display functions
//! - This module - Reports assembled from a workflow result

pub mod formatter;

pub use formatter::{
    display_changes, display_error, display_file_reports, display_status, display_success,
    display_vcs_configuration, display_version, display_warning,
};

use crate::cli::{ExecutionReport, ReleasePlan, WorkflowResult};

/// Prints what the run is about to do.
///
/// Shown with `--verbose`, and always for a simulated run.
pub fn display_plan(result: &WorkflowResult) {
    let plan: &ReleasePlan = &result.plan;

    display_version("Current version:", &plan.current_version);
    display_version("New version:", &plan.new_version);

    println!("\n{}", console::style("Version updates:").bold());
    display_changes(&plan.global_changes);

    display_file_reports(&result.summaries);
    for warning in &result.summary_warnings {
        display_warning(warning);
    }

    if let Some(vcs) = &plan.vcs {
        display_vcs_configuration(vcs);
    }
}

/// Prints the outcome of a release that was carried out.
pub fn display_execution(plan: &ReleasePlan, report: &ExecutionReport) {
    for file in &report.updated {
        display_success(&format!("Updated {}", file.path.display()));
    }
    for warning in &report.warnings {
        display_warning(warning);
    }
    display_success(&format!(
        "Version {} -> {}",
        plan.current_version_string, plan.new_version_string
    ));
}
