use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{PunchError, Result};
use crate::vcs::{Repository, VcsConfiguration};

const DEVELOP_BRANCH: &str = "develop";

/// Release flow through the `git flow` extension.
///
/// - pre-start: the working tree must be clean, then `develop` is checked out
/// - start: `git flow release start <version>`
/// - finish: commit every change, `git flow release finish -m <message> <version>`
/// - post-finish: back to `develop`
pub struct GitFlowRepo {
    workdir: PathBuf,
    configuration: VcsConfiguration,
}

impl GitFlowRepo {
    /// Opens the repository containing `path`; fails outside a git work tree.
    pub fn open<P: AsRef<Path>>(path: P, configuration: VcsConfiguration) -> Result<Self> {
        let workdir = path.as_ref().to_path_buf();
        let repo = GitFlowRepo {
            workdir,
            configuration,
        };
        let inside = repo.git(&["rev-parse", "--is-inside-work-tree"])?;
        if inside.trim() != "true" {
            return Err(PunchError::repository(format!(
                "{} is not inside a git work tree",
                repo.workdir.display()
            )));
        }
        Ok(repo)
    }

    /// Runs a git command in the work tree and returns its stdout.
    fn git(&self, args: &[&str]) -> Result<String> {
        debug!(args = ?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_MERGE_AUTOEDIT", "no")
            .output()
            .map_err(|e| PunchError::repository(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PunchError::repository(format!(
                "git {} failed with exit code {}: {}",
                args.join(" "),
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Tracked files listed by `git status --porcelain`; untracked (`??`) lines are skipped.
fn dirty_files(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with("??"))
        .map(|line| line.get(3..).unwrap_or(line).to_string())
        .collect()
}

impl Repository for GitFlowRepo {
    fn name(&self) -> &str {
        &self.configuration.name
    }

    fn commit_message(&self) -> &str {
        &self.configuration.commit_message
    }

    fn pre_start_release(&mut self) -> Result<()> {
        let status = self.git(&["status", "--porcelain"])?;
        let dirty = dirty_files(&status);
        if !dirty.is_empty() {
            return Err(PunchError::repository(format!(
                "the working tree is not clean: {}",
                dirty.join(", ")
            )));
        }
        self.git(&["checkout", DEVELOP_BRANCH])?;
        Ok(())
    }

    fn start_release(&mut self) -> Result<()> {
        let release = self.configuration.release_name.clone();
        self.git(&["flow", "release", "start", &release])?;
        info!(release = %release, "git flow release started");
        Ok(())
    }

    fn finish_release(&mut self) -> Result<()> {
        let release = self.configuration.release_name.clone();
        let message = self.configuration.commit_message.clone();
        self.git(&["add", "-A"])?;
        self.git(&["commit", "-m", &message])?;
        self.git(&["flow", "release", "finish", "-m", &message, &release])?;
        info!(release = %release, "git flow release finished");
        Ok(())
    }

    fn post_finish_release(&mut self) -> Result<()> {
        self.git(&["checkout", DEVELOP_BRANCH])?;
        Ok(())
    }
}
