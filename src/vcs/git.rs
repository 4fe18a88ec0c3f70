use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{BranchType, IndexAddOption, Repository as Git2Repo, Signature, StatusOptions};
use tracing::{debug, info};

use crate::error::{PunchError, Result};
use crate::vcs::{Repository, VcsConfiguration};

/// Plain git release flow through `git2`.
///
/// - pre-start: the working tree must be clean, then `target_branch` is checked out
/// - start: with `make_release_branch`, `release/<version>` is created and checked out
/// - finish: every change is committed; the release branch (if any) is merged
///   into `target_branch` with a merge commit and deleted; the version is tagged
/// - post-finish: nothing
pub struct GitRepo {
    repo: Git2Repo,
    configuration: VcsConfiguration,
}

impl GitRepo {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P, configuration: VcsConfiguration) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|e| {
            PunchError::repository(format!(
                "not in a git repository ({}): {}",
                path.display(),
                e
            ))
        })?;
        Ok(GitRepo {
            repo,
            configuration,
        })
    }

    fn release_branch(&self) -> String {
        format!("release/{}", self.configuration.release_name)
    }

    fn target_branch(&self) -> &str {
        &self.configuration.options.target_branch
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Ok(Signature::now("punch", "punch@localhost")?),
        }
    }

    /// Changed or staged tracked files; untracked files are ignored.
    fn dirty_files(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_empty())
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        let target = self
            .repo
            .revparse_single(&refname)
            .map_err(|e| PunchError::repository(format!("cannot find branch '{}': {}", name, e)))?;
        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        debug!(branch = name, "checked out");
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<git2::Oid> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let signature = self.signature()?;
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
        info!(commit = %oid, "release commit created");
        Ok(oid)
    }

    /// Merge commit of `release` into `target`, then back to `target`.
    fn merge_release_branch(&self, release: &str, target: &str) -> Result<()> {
        let release_commit = self
            .repo
            .find_branch(release, BranchType::Local)?
            .get()
            .peel_to_commit()?;
        let target_commit = self
            .repo
            .find_branch(target, BranchType::Local)?
            .get()
            .peel_to_commit()?;

        let signature = self.signature()?;
        let message = format!("Merge branch '{}'", release);
        self.repo.commit(
            Some(&format!("refs/heads/{}", target)),
            &signature,
            &signature,
            &message,
            &release_commit.tree()?,
            &[&target_commit, &release_commit],
        )?;

        self.checkout_branch(target)?;
        self.repo.find_branch(release, BranchType::Local)?.delete()?;
        info!(branch = release, into = target, "release branch merged");
        Ok(())
    }

    fn tag_release(&self) -> Result<()> {
        let name = &self.configuration.release_name;
        let head = self.repo.head()?.peel_to_commit()?;

        if self.configuration.options.annotate_tags {
            let signature = self.signature()?;
            self.repo.tag(
                name,
                head.as_object(),
                &signature,
                &self.configuration.annotation_message,
                false,
            )?;
        } else {
            self.repo.tag_lightweight(name, head.as_object(), false)?;
        }

        info!(tag = %name, "release tagged");
        Ok(())
    }
}

fn repository_error(step: &str, err: PunchError) -> PunchError {
    match err {
        PunchError::Repository(_) => err,
        other => PunchError::repository(format!("{}: {}", step, other)),
    }
}

impl Repository for GitRepo {
    fn name(&self) -> &str {
        &self.configuration.name
    }

    fn commit_message(&self) -> &str {
        &self.configuration.commit_message
    }

    fn pre_start_release(&mut self) -> Result<()> {
        let dirty = self
            .dirty_files()
            .map_err(|e| repository_error("cannot read status", e))?;
        if !dirty.is_empty() {
            return Err(PunchError::repository(format!(
                "the working tree is not clean: {}",
                dirty.join(", ")
            )));
        }

        let target = self.target_branch().to_string();
        self.checkout_branch(&target)
            .map_err(|e| repository_error("cannot check out the target branch", e))
    }

    fn start_release(&mut self) -> Result<()> {
        if !self.configuration.options.make_release_branch {
            return Ok(());
        }

        let release = self.release_branch();
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| PunchError::repository(format!("cannot read HEAD: {}", e)))?;
        self.repo
            .branch(&release, &head, false)
            .map_err(|e| PunchError::repository(format!("cannot create '{}': {}", release, e)))?;
        self.checkout_branch(&release)
            .map_err(|e| repository_error("cannot check out the release branch", e))
    }

    fn finish_release(&mut self) -> Result<()> {
        let message = self.configuration.commit_message.clone();
        self.commit_all(&message)
            .map_err(|e| repository_error("cannot commit the release", e))?;

        if self.configuration.options.make_release_branch {
            let release = self.release_branch();
            let target = self.target_branch().to_string();
            self.merge_release_branch(&release, &target)
                .map_err(|e| repository_error("cannot merge the release branch", e))?;
        }

        self.tag_release()
            .map_err(|e| repository_error("cannot tag the release", e))
    }

    fn post_finish_release(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VcsOptions;
    use std::fs;
    use tempfile::TempDir;

    fn configuration(target_branch: &str, make_release_branch: bool) -> VcsConfiguration {
        VcsConfiguration {
            name: "git".to_string(),
            commit_message: "Version updated 1.0.0 -> 1.1.0".to_string(),
            release_name: "1.1.0".to_string(),
            annotation_message: "Version 1.1.0".to_string(),
            options: VcsOptions {
                make_release_branch,
                target_branch: target_branch.to_string(),
                ..VcsOptions::default()
            },
        }
    }

    /// Repository with one commit of VERSION; returns the initial branch name.
    fn setup_repo() -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        fs::write(dir.path().join("VERSION"), "1.0.0\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("VERSION")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();

        let branch = repo.head().unwrap().shorthand().unwrap().to_string();
        (dir, branch)
    }

    #[test]
    fn test_open_outside_repository() {
        let dir = TempDir::new().unwrap();
        let result = GitRepo::open(dir.path(), configuration("master", false));
        assert!(matches!(result, Err(PunchError::Repository(_))));
    }

    #[test]
    fn test_release_with_branch() {
        let (dir, branch) = setup_repo();
        let mut repo = GitRepo::open(dir.path(), configuration(&branch, true)).unwrap();

        repo.pre_start_release().unwrap();
        repo.start_release().unwrap();
        assert_eq!(
            repo.repo.head().unwrap().shorthand().unwrap(),
            "release/1.1.0"
        );

        fs::write(dir.path().join("VERSION"), "1.1.0\n").unwrap();
        repo.finish_release().unwrap();
        repo.post_finish_release().unwrap();

        let head = repo.repo.head().unwrap();
        assert_eq!(head.shorthand().unwrap(), branch);
        let commit = head.peel_to_commit().unwrap();
        assert_eq!(commit.parent_count(), 2);
        assert!(repo
            .repo
            .find_branch("release/1.1.0", BranchType::Local)
            .is_err());
        assert!(repo.repo.find_reference("refs/tags/1.1.0").is_ok());
        assert!(repo.dirty_files().unwrap().is_empty());
    }

    #[test]
    fn test_release_without_branch_annotated_tag() {
        let (dir, branch) = setup_repo();
        let mut config = configuration(&branch, false);
        config.options.annotate_tags = true;
        let mut repo = GitRepo::open(dir.path(), config).unwrap();

        repo.pre_start_release().unwrap();
        repo.start_release().unwrap();
        fs::write(dir.path().join("VERSION"), "1.1.0\n").unwrap();
        repo.finish_release().unwrap();

        let head = repo.repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message().unwrap(), "Version updated 1.0.0 -> 1.1.0");
        let tag = repo
            .repo
            .find_reference("refs/tags/1.1.0")
            .unwrap()
            .peel_to_tag()
            .unwrap();
        assert_eq!(tag.message().unwrap(), "Version 1.1.0");
    }

    #[test]
    fn test_dirty_working_tree_is_rejected() {
        let (dir, branch) = setup_repo();
        fs::write(dir.path().join("VERSION"), "uncommitted\n").unwrap();
        let mut repo = GitRepo::open(dir.path(), configuration(&branch, true)).unwrap();

        let err = repo.pre_start_release().unwrap_err();
        assert!(err.to_string().contains("not clean"));
    }

    #[test]
    fn test_untracked_files_are_ignored() {
        let (dir, branch) = setup_repo();
        fs::write(dir.path().join("notes.txt"), "scratch\n").unwrap();
        let mut repo = GitRepo::open(dir.path(), configuration(&branch, true)).unwrap();

        assert!(repo.pre_start_release().is_ok());
    }

    #[test]
    fn test_missing_target_branch() {
        let (dir, _) = setup_repo();
        let mut repo = GitRepo::open(dir.path(), configuration("no-such-branch", true)).unwrap();
        assert!(matches!(
            repo.pre_start_release(),
            Err(PunchError::Repository(_))
        ));
    }
}
