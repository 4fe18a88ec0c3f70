//! Release pipeline behind the `punch` command
//!
//! Kept apart from clap so the pipeline can be driven programmatically:
//!
//! 1. [plan_release]: validate the arguments, read the version file, run the
//!    selected action and render every template
//! 2. [file_summaries]: preview the changes each configured file would get
//! 3. [execute_release]: update the files and the version file inside the
//!    release workflow of a [Repository]
//!
//! [run_punch_workflow] chains the three and opens the configured repository.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::actions::{self, ActionConfig, ActionRegistry};
use crate::cli::options::parse_option_string;
use crate::config::{Config, FileConfig};
use crate::domain::{Version, VersionMapping};
use crate::error::{PunchError, Result};
use crate::file_updater::FileUpdater;
use crate::release::{ReleaseState, ReleaseWorkflow};
use crate::replacer::{Replacer, VersionChange};
use crate::vcs::{self, Repository, VcsConfiguration};
use crate::warning::UpdateWarning;

/// Arguments for the punch workflow
///
/// Mirrors the CLI arguments without depending on clap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PunchWorkflowArgs {
    /// Configuration file; target file paths are relative to its directory
    pub config_path: PathBuf,

    /// Version file to read and rewrite
    pub version_file: PathBuf,

    /// Part to increase (`--part`)
    pub part: Option<String>,

    /// `part=value` assignments (`--set-part`)
    pub set_part: Option<String>,

    /// Name of an action declared in the configuration (`--action`)
    pub action: Option<String>,

    /// Extra `key=value` options for `--action`
    pub action_options: Option<String>,

    /// Reset every part after the one being set
    pub reset_on_set: bool,

    /// Preview only, nothing is written
    pub simulate: bool,
}

/// Everything computed before any file is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    pub current_version: Version,
    pub new_version: Version,
    /// Current version rendered with the main serializer
    pub current_version_string: String,
    /// New version rendered with the main serializer
    pub new_version_string: String,
    /// Every distinct serializer rendered with both versions
    pub global_changes: Vec<VersionChange>,
    /// Target files, paths resolved against the configuration directory
    pub files: Vec<FileConfig>,
    pub version_file: PathBuf,
    /// Directory the repository is opened in
    pub workdir: PathBuf,
    /// Rendered VCS settings; `None` when no VCS is configured
    pub vcs: Option<VcsConfiguration>,
    /// Template variables of the current version
    pub current_mapping: VersionMapping,
    /// Template variables of the new version
    pub new_mapping: VersionMapping,
}

/// Changes for a single target file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub changes: Vec<VersionChange>,
}

/// Outcome of [execute_release].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Files that were rewritten, with the changes applied to each
    pub updated: Vec<FileReport>,
    /// Files that were skipped
    pub warnings: Vec<UpdateWarning>,
    /// Last release step reached
    pub release_state: ReleaseState,
}

/// Result of a successful punch workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub plan: ReleasePlan,
    /// Per-file preview computed before anything was written
    pub summaries: Vec<FileReport>,
    /// Files that could not be previewed
    pub summary_warnings: Vec<UpdateWarning>,
    /// `None` for a simulated run
    pub execution: Option<ExecutionReport>,
}

/// Runs the whole workflow, opening the repository selected by the configuration.
///
/// # Arguments
///
/// * `args` - Workflow arguments
/// * `config` - Loaded punch configuration
///
/// # Returns
///
/// * `Ok(WorkflowResult)` - The plan, the previews and, unless simulating,
///   what was written
/// * `Err(PunchError)` - The first fatal error; skipped files are warnings
pub fn run_punch_workflow(args: &PunchWorkflowArgs, config: &Config) -> Result<WorkflowResult> {
    let plan = plan_release(args, config)?;
    let (summaries, summary_warnings) = file_summaries(&plan);

    let execution = if args.simulate {
        info!("simulated run, nothing written");
        None
    } else {
        let repository = vcs::open_repository(&plan.workdir, plan.vcs.as_ref())?;
        Some(execute_release(&plan, repository)?)
    };

    Ok(WorkflowResult {
        plan,
        summaries,
        summary_warnings,
        execution,
    })
}

/// Computes the new version and renders every template without writing anything.
pub fn plan_release(args: &PunchWorkflowArgs, config: &Config) -> Result<ReleasePlan> {
    let action_config = select_action(args, config)?;

    if !args.simulate && config.files.is_empty() {
        return Err(PunchError::configuration(
            "you must specify a list of files to update",
        ));
    }

    let current_version = Version::from_store(&args.version_file, &config.version)?;
    let action = ActionRegistry::global().build(&action_config)?;
    let new_version = action.process_version(&current_version)?;
    info!(action = %action_config.kind, from = %current_version, to = %new_version, "version processed");

    let workdir = config_dir(&args.config_path);
    let files: Vec<FileConfig> = config
        .files
        .iter()
        .map(|file| FileConfig::new(workdir.join(&file.path), file.serializers.clone()))
        .collect();

    let current_parts = current_version.as_mapping();
    let new_parts = new_version.as_mapping();
    let replacer = Replacer::from_files(&config.globals.serializer, &files);
    let (current_version_string, new_version_string) =
        replacer.run_main_serializer(&current_parts, &new_parts);
    let global_changes = replacer.run_all_serializers(&current_parts, &new_parts);

    let current_mapping = with_special_variables(
        current_parts,
        &current_version_string,
        &new_version_string,
    );
    let new_mapping =
        with_special_variables(new_parts, &current_version_string, &new_version_string);
    let vcs = config
        .vcs
        .as_ref()
        .map(|vcs| VcsConfiguration::from_config(vcs, &new_mapping));

    Ok(ReleasePlan {
        current_version,
        new_version,
        current_version_string,
        new_version_string,
        global_changes,
        files,
        version_file: args.version_file.clone(),
        workdir,
        vcs,
        current_mapping,
        new_mapping,
    })
}

/// Previews the changes of every target file.
///
/// A file that cannot be read gives a warning instead of a report.
pub fn file_summaries(plan: &ReleasePlan) -> (Vec<FileReport>, Vec<UpdateWarning>) {
    let mut reports = Vec::new();
    let mut warnings = Vec::new();

    for file in &plan.files {
        let updater = FileUpdater::new(file);
        match updater.get_summary(&plan.current_mapping, &plan.new_mapping) {
            Ok(changes) => reports.push(FileReport {
                path: file.path.clone(),
                changes,
            }),
            Err(e) => warnings.push(UpdateWarning::from_error(&file.path, &e)),
        }
    }

    (reports, warnings)
}

/// Updates the target files and the version file inside the release workflow.
///
/// Files whose patterns are missing are skipped with a warning; every other
/// file is still updated. A failing repository step stops the run, and the
/// error names the last state the release reached.
pub fn execute_release<R: Repository>(plan: &ReleasePlan, repository: R) -> Result<ExecutionReport> {
    let mut workflow = ReleaseWorkflow::new(repository);

    run_step(&mut workflow, ReleaseWorkflow::pre_start_release)?;
    run_step(&mut workflow, ReleaseWorkflow::start_release)?;

    let mut updated = Vec::new();
    let mut warnings = Vec::new();
    for file in &plan.files {
        let updater = FileUpdater::new(file);
        let path = updater.path();
        match updater.update(&plan.current_mapping, &plan.new_mapping) {
            Ok(changes) if changes.is_empty() => {
                debug!(path = %path.display(), "nothing to change");
            }
            Ok(changes) => updated.push(FileReport {
                path: path.to_path_buf(),
                changes,
            }),
            Err(e) => {
                if e.is_recoverable() {
                    warn!(path = %path.display(), error = %e, "file skipped");
                } else {
                    error!(path = %path.display(), error = %e, "file skipped");
                }
                warnings.push(UpdateWarning::from_error(path, &e));
            }
        }
    }

    plan.new_version.to_store(&plan.version_file)?;
    run_step(&mut workflow, ReleaseWorkflow::files_updated)?;
    run_step(&mut workflow, ReleaseWorkflow::finish_release)?;
    run_step(&mut workflow, ReleaseWorkflow::post_finish_release)?;

    Ok(ExecutionReport {
        updated,
        warnings,
        release_state: workflow.state(),
    })
}

/// Builds the action configuration requested by the arguments.
///
/// `--set-part` wins over `--part`, which wins over `--action`.
fn select_action(args: &PunchWorkflowArgs, config: &Config) -> Result<ActionConfig> {
    if let Some(set_part) = &args.set_part {
        let values = parse_option_string(set_part)?;
        if args.reset_on_set && values.len() > 1 {
            return Err(PunchError::validation(
                "if you specify --reset-on-set you may set only one value",
            ));
        }
        return Ok(ActionConfig::new(actions::SET)
            .with_options(values)
            .with_reset_on_set(args.reset_on_set));
    }

    if let Some(part) = &args.part {
        return Ok(ActionConfig::new(actions::INCREASE).with_option("part", part.as_str()));
    }

    if let Some(name) = &args.action {
        let mut action = config.action(name)?.clone();
        if let Some(options) = &args.action_options {
            action = action.with_options(parse_option_string(options)?);
        }
        if args.reset_on_set {
            action = action.with_reset_on_set(true);
        }
        return Ok(action);
    }

    Err(PunchError::validation(
        "you must specify one of --part, --set-part or --action",
    ))
}

fn with_special_variables(mapping: VersionMapping, current: &str, new: &str) -> VersionMapping {
    mapping
        .with_extra("current_version", current)
        .with_extra("new_version", new)
}

fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Runs one release step, adding the reached state to repository errors.
fn run_step<R, F>(workflow: &mut ReleaseWorkflow<R>, step: F) -> Result<()>
where
    R: Repository,
    F: FnOnce(&mut ReleaseWorkflow<R>) -> Result<()>,
{
    step(workflow).map_err(|e| match e {
        PunchError::Repository(msg) => PunchError::repository(format!(
            "{} (release {})",
            msg,
            workflow.state()
        )),
        other => other,
    })
}
