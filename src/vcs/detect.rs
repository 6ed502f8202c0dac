//! Repository detection.

use std::path::Path;

use tracing::debug;

use crate::error::CollectionError;
use crate::process::ProcessRunner;

use super::VcsKind;

/// Detect which VCS manages `root`.
///
/// Git counts as usable when `root/.git` exists or `git rev-parse` succeeds,
/// Jujutsu when `jj status` succeeds. Jujutsu wins when both are usable
/// (colocated repositories).
pub async fn detect_vcs<R: ProcessRunner + ?Sized>(
    runner: &R,
    root: &Path,
) -> Result<VcsKind, CollectionError> {
    let is_git = is_git_repo(runner, root).await;
    let is_jj = is_jj_repo(runner).await;
    debug!("Repository detection: git={}, jj={}", is_git, is_jj);

    match (is_git, is_jj) {
        (_, true) => Ok(VcsKind::Jujutsu),
        (true, false) => Ok(VcsKind::Git),
        (false, false) => Err(CollectionError::NoRepository),
    }
}

async fn is_git_repo<R: ProcessRunner + ?Sized>(runner: &R, root: &Path) -> bool {
    if root.join(".git").exists() {
        return true;
    }

    let args = ["rev-parse", "--is-inside-work-tree"].map(String::from);
    succeeds(runner, "git", &args).await
}

async fn is_jj_repo<R: ProcessRunner + ?Sized>(runner: &R) -> bool {
    let args = ["status", "--quiet"].map(String::from);
    succeeds(runner, "jj", &args).await
}

/// A missing binary counts as "not a repository".
async fn succeeds<R: ProcessRunner + ?Sized>(runner: &R, program: &str, args: &[String]) -> bool {
    match runner.output(program, args).await {
        Ok(output) => output.success(),
        Err(e) => {
            debug!("{} probe failed: {}", program, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubprocessError;
    use crate::process::{MockProcessRunner, ProcessOutput};

    fn mock_probes(git_ok: bool, jj: Option<bool>) -> MockProcessRunner {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_output()
            .withf(|program, _| program == "git")
            .returning(move |_, _| {
                Ok(ProcessOutput::new(Some(if git_ok { 0 } else { 128 }), "", ""))
            });
        runner
            .expect_output()
            .withf(|program, _| program == "jj")
            .returning(move |program, _| match jj {
                Some(ok) => Ok(ProcessOutput::new(Some(if ok { 0 } else { 1 }), "", "")),
                None => Err(SubprocessError::NotInstalled {
                    program: program.to_string(),
                }),
            });
        runner
    }

    #[tokio::test]
    async fn test_prefers_jujutsu_when_both_detected() {
        let dir = tempfile::tempdir().unwrap();
        let runner = mock_probes(true, Some(true));

        let vcs = detect_vcs(&runner, dir.path()).await.unwrap();
        assert_eq!(vcs, VcsKind::Jujutsu);
    }

    #[tokio::test]
    async fn test_git_only() {
        let dir = tempfile::tempdir().unwrap();
        let runner = mock_probes(true, Some(false));

        let vcs = detect_vcs(&runner, dir.path()).await.unwrap();
        assert_eq!(vcs, VcsKind::Git);
    }

    #[tokio::test]
    async fn test_git_dir_detected_without_running_git() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        let mut runner = MockProcessRunner::new();
        runner
            .expect_output()
            .withf(|program, _| program == "jj")
            .times(1)
            .returning(|program, _| {
                Err(SubprocessError::NotInstalled {
                    program: program.to_string(),
                })
            });
        runner
            .expect_output()
            .withf(|program, _| program == "git")
            .never();

        let vcs = detect_vcs(&runner, dir.path()).await.unwrap();
        assert_eq!(vcs, VcsKind::Git);
    }

    #[tokio::test]
    async fn test_jj_only() {
        let dir = tempfile::tempdir().unwrap();
        let runner = mock_probes(false, Some(true));

        let vcs = detect_vcs(&runner, dir.path()).await.unwrap();
        assert_eq!(vcs, VcsKind::Jujutsu);
    }

    #[tokio::test]
    async fn test_no_repository() {
        let dir = tempfile::tempdir().unwrap();
        let runner = mock_probes(false, None);

        let result = detect_vcs(&runner, dir.path()).await;
        assert!(matches!(result, Err(CollectionError::NoRepository)));
    }
}
