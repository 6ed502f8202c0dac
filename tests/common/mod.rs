//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use lazycommit::{ProcessOutput, ProcessRunner, SubprocessError, SystemRunner};

/// A scratch git repository for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write test file");
    }

    /// Add a file to the index.
    pub fn stage(&self, relative: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(relative)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write and stage a file in one go.
    pub fn write_staged(&self, relative: &str, content: &str) {
        self.write(relative, content);
        self.stage(relative);
    }

    /// Commit whatever is in the index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Short name of the checked-out branch.
    pub fn branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(|s| s.to_string()))
            .unwrap_or_default()
    }

    /// Raw `git diff --cached` output, for comparison.
    pub fn staged_diff(&self) -> String {
        let output = std::process::Command::new("git")
            .args(["diff", "--cached"])
            .current_dir(self.path())
            .output()
            .expect("Failed to run git diff");
        assert!(output.status.success(), "git diff --cached failed");
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

/// One recorded `pipe_through` call.
#[derive(Debug, Clone)]
pub struct PipedCall {
    pub program: String,
    pub args: Vec<String>,
    pub input: String,
}

/// Runner that executes real VCS commands but records the LLM call
/// instead of running it.
pub struct RecordingRunner {
    inner: SystemRunner,
    piped: Mutex<Vec<PipedCall>>,
}

impl RecordingRunner {
    pub fn new(workdir: &Path) -> Self {
        Self {
            inner: SystemRunner::new(workdir),
            piped: Mutex::new(Vec::new()),
        }
    }

    pub fn piped_calls(&self) -> Vec<PipedCall> {
        self.piped.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn output(&self, program: &str, args: &[String]) -> Result<ProcessOutput, SubprocessError> {
        self.inner.output(program, args).await
    }

    async fn pipe_through(
        &self,
        program: &str,
        args: &[String],
        input: &str,
        _limit: Duration,
    ) -> Result<(), SubprocessError> {
        self.piped.lock().unwrap().push(PipedCall {
            program: program.to_string(),
            args: args.to_vec(),
            input: input.to_string(),
        });
        Ok(())
    }
}
