//! Version control abstraction layer
//!
//! The release workflow drives a [Repository] through four lifecycle steps:
//! pre-start (checks), start (e.g. create a release branch), finish (commit,
//! merge, tag) and post-finish (cleanup). Implementations:
//!
//! - [git::GitRepo]: plain git through the `git2` crate
//! - [git_flow::GitFlowRepo]: the `git flow` extension, driven through the git CLI
//! - [NoVcs]: used when no version control is configured
//! - [mock::MockRepository]: records calls, for tests
//!
//! Most code should depend on the [Repository] trait rather than concrete
//! implementations.

pub mod git;
pub mod git_flow;
pub mod mock;

pub use git::GitRepo;
pub use git_flow::GitFlowRepo;
pub use mock::MockRepository;

use std::path::Path;

use tracing::info;

use crate::config::{VcsConfig, VcsOptions};
use crate::domain::VersionMapping;
use crate::error::Result;
use crate::replacer::render;

/// Version control settings with every template already rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct VcsConfiguration {
    /// `git` or `git-flow`
    pub name: String,
    /// Rendered commit message
    pub commit_message: String,
    /// Name of the release (branch suffix and tag), the new version string
    pub release_name: String,
    /// Rendered tag annotation
    pub annotation_message: String,
    pub options: VcsOptions,
}

impl VcsConfiguration {
    /// Renders the VCS templates.
    ///
    /// `variables` holds the new version parts plus the `current_version` and
    /// `new_version` special variables.
    pub fn from_config(config: &VcsConfig, variables: &VersionMapping) -> Self {
        VcsConfiguration {
            name: config.name.clone(),
            commit_message: render(&config.commit_message, variables),
            release_name: variables.get("new_version").unwrap_or_default().to_string(),
            annotation_message: render(&config.options.annotation_message, variables),
            options: config.options.clone(),
        }
    }
}

/// Version control collaborator of the release workflow.
///
/// Each lifecycle step either succeeds or returns a
/// [crate::error::PunchError::Repository]; the workflow stops at the first
/// failure.
pub trait Repository {
    /// Name of the version control system
    fn name(&self) -> &str;

    /// Rendered message used for the release commit
    fn commit_message(&self) -> &str;

    /// Checks the working tree and moves to the branch the release starts from
    fn pre_start_release(&mut self) -> Result<()>;

    /// Opens the release
    fn start_release(&mut self) -> Result<()>;

    /// Records the updated files and closes the release
    fn finish_release(&mut self) -> Result<()>;

    /// Cleanup after the release is closed
    fn post_finish_release(&mut self) -> Result<()>;
}

impl<R: Repository + ?Sized> Repository for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn commit_message(&self) -> &str {
        (**self).commit_message()
    }

    fn pre_start_release(&mut self) -> Result<()> {
        (**self).pre_start_release()
    }

    fn start_release(&mut self) -> Result<()> {
        (**self).start_release()
    }

    fn finish_release(&mut self) -> Result<()> {
        (**self).finish_release()
    }

    fn post_finish_release(&mut self) -> Result<()> {
        (**self).post_finish_release()
    }
}

/// Repository used when no version control is configured; every step is a no-op.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoVcs;

impl Repository for NoVcs {
    fn name(&self) -> &str {
        "none"
    }

    fn commit_message(&self) -> &str {
        ""
    }

    fn pre_start_release(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_release(&mut self) -> Result<()> {
        Ok(())
    }

    fn finish_release(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_finish_release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens the repository adapter selected by `configuration`.
///
/// `None` gives [NoVcs].
pub fn open_repository(
    workdir: &Path,
    configuration: Option<&VcsConfiguration>,
) -> Result<Box<dyn Repository>> {
    let Some(configuration) = configuration else {
        return Ok(Box::new(NoVcs));
    };

    info!(vcs = %configuration.name, path = %workdir.display(), "opening repository");
    match configuration.name.as_str() {
        "git" => Ok(Box::new(GitRepo::open(workdir, configuration.clone())?)),
        "git-flow" => Ok(Box::new(GitFlowRepo::open(workdir, configuration.clone())?)),
        other => Err(crate::error::PunchError::configuration(format!(
            "the requested version control system '{}' is not supported",
            other
        ))),
    }
}
