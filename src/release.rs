//! Release workflow
//!
//! Wraps the file updates in the version control lifecycle. Steps must run in
//! this exact order:
//!
//! ```text
//! NotStarted -> PreStarted -> Started -> FilesUpdated -> Finished -> PostFinished
//! ```
//!
//! A step called out of order fails without touching the repository. A step
//! whose repository call fails leaves the state where it was, so the caller can
//! report how far the release got.

use std::fmt;

use tracing::{error, info};

use crate::error::{PunchError, Result};
use crate::vcs::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseState {
    NotStarted,
    PreStarted,
    Started,
    FilesUpdated,
    Finished,
    PostFinished,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseState::NotStarted => "not started",
            ReleaseState::PreStarted => "pre-started",
            ReleaseState::Started => "started",
            ReleaseState::FilesUpdated => "files updated",
            ReleaseState::Finished => "finished",
            ReleaseState::PostFinished => "post-finished",
        };
        f.write_str(name)
    }
}

/// Drives an injected [Repository] through the release lifecycle.
pub struct ReleaseWorkflow<R: Repository> {
    repository: R,
    state: ReleaseState,
}

impl<R: Repository> ReleaseWorkflow<R> {
    pub fn new(repository: R) -> Self {
        ReleaseWorkflow {
            repository,
            state: ReleaseState::NotStarted,
        }
    }

    pub fn state(&self) -> ReleaseState {
        self.state
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn pre_start_release(&mut self) -> Result<()> {
        self.transition(
            ReleaseState::NotStarted,
            ReleaseState::PreStarted,
            "pre_start_release",
            R::pre_start_release,
        )
    }

    pub fn start_release(&mut self) -> Result<()> {
        self.transition(
            ReleaseState::PreStarted,
            ReleaseState::Started,
            "start_release",
            R::start_release,
        )
    }

    /// Marks the file updates as done; does not call the repository.
    pub fn files_updated(&mut self) -> Result<()> {
        self.transition(
            ReleaseState::Started,
            ReleaseState::FilesUpdated,
            "files_updated",
            |_| Ok(()),
        )
    }

    pub fn finish_release(&mut self) -> Result<()> {
        self.transition(
            ReleaseState::FilesUpdated,
            ReleaseState::Finished,
            "finish_release",
            R::finish_release,
        )
    }

    pub fn post_finish_release(&mut self) -> Result<()> {
        self.transition(
            ReleaseState::Finished,
            ReleaseState::PostFinished,
            "post_finish_release",
            R::post_finish_release,
        )
    }

    fn transition<F>(
        &mut self,
        from: ReleaseState,
        to: ReleaseState,
        step: &str,
        action: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut R) -> Result<()>,
    {
        if self.state != from {
            return Err(PunchError::workflow(format!(
                "cannot run {} while the release is {} (expected {})",
                step, self.state, from
            )));
        }

        if let Err(e) = action(&mut self.repository) {
            error!(step, vcs = self.repository.name(), state = %self.state, "release step failed");
            return Err(e);
        }

        info!(step, vcs = self.repository.name(), "release step done");
        self.state = to;
        Ok(())
    }
}
