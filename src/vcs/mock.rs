use crate::error::{PunchError, Result};
use crate::vcs::Repository;

/// Mock repository for testing without actual version control
///
/// Records every lifecycle call in order and can be told to fail on one of
/// them.
#[derive(Debug, Clone, Default)]
pub struct MockRepository {
    commit_message: String,
    calls: Vec<&'static str>,
    fail_on: Option<&'static str>,
}

impl MockRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Make the named step (e.g. `"start_release"`) return a repository error
    pub fn failing_on(mut self, step: &'static str) -> Self {
        self.fail_on = Some(step);
        self
    }

    /// Steps called so far, in order (including a failed one)
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    fn record(&mut self, step: &'static str) -> Result<()> {
        self.calls.push(step);
        if self.fail_on == Some(step) {
            return Err(PunchError::repository(format!("{} failed", step)));
        }
        Ok(())
    }
}

impl Repository for MockRepository {
    fn name(&self) -> &str {
        "mock"
    }

    fn commit_message(&self) -> &str {
        &self.commit_message
    }

    fn pre_start_release(&mut self) -> Result<()> {
        self.record("pre_start_release")
    }

    fn start_release(&mut self) -> Result<()> {
        self.record("start_release")
    }

    fn finish_release(&mut self) -> Result<()> {
        self.record("finish_release")
    }

    fn post_finish_release(&mut self) -> Result<()> {
        self.record("post_finish_release")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_records_calls() {
        let mut repo = MockRepository::new().with_commit_message("Bump");
        repo.pre_start_release().unwrap();
        repo.start_release().unwrap();

        assert_eq!(repo.calls(), &["pre_start_release", "start_release"]);
        assert_eq!(repo.commit_message(), "Bump");
    }

    #[test]
    fn test_mock_repository_failure() {
        let mut repo = MockRepository::new().failing_on("finish_release");
        assert!(repo.finish_release().is_err());
        assert_eq!(repo.calls(), &["finish_release"]);
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.calls().is_empty());
    }
}
