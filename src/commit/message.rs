//! Commit message generation: diff collection, truncation and the LLM call.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::GenerateError;
use crate::llm::LlmCommand;
use crate::process::ProcessRunner;
use crate::tokens::DiffTruncator;
use crate::vcs::{DiffRequest, branch_name, collect_diff, detect_vcs};

use super::prompt::{PromptData, render_prompt};

/// Bound `diff` to `max_tokens`, falling back to the raw diff if the
/// tokenizer fails.
pub fn bound_diff(diff: String, max_tokens: usize) -> String {
    let result = DiffTruncator::new().and_then(|truncator| truncator.truncate(&diff, max_tokens));
    match result {
        Ok(result) if result.was_truncated => {
            info!(
                "Diff truncated from {} to {} tokens",
                result.original_tokens, result.kept_tokens
            );
            result.text
        }
        Ok(result) => {
            debug!("Diff is {} tokens (budget {})", result.original_tokens, max_tokens);
            diff
        }
        Err(e) => {
            warn!("Failed to tokenize diff: {}. Using raw diff.", e);
            diff
        }
    }
}

/// Generate a commit message for the pending changes in `root`.
///
/// The message streams from the `llm` command straight to stdout; nothing is
/// printed if any step before the LLM call fails.
pub async fn generate_commit_message<R: ProcessRunner + ?Sized>(
    runner: &R,
    root: &Path,
    settings: &Settings,
    user_context: &str,
) -> Result<(), GenerateError> {
    let vcs = detect_vcs(runner, root).await?;
    info!("Using {} for version control", vcs);

    let branch = branch_name(runner, vcs).await;
    debug!("Branch: {:?}", branch);

    let prompt = render_prompt(
        settings.template_path.as_deref(),
        &PromptData {
            branch: &branch,
            user_context,
        },
    )?;

    let request = DiffRequest::for_repository(vcs, root)?;
    let diff = collect_diff(runner, &request).await?;
    if diff.trim().is_empty() {
        return Err(GenerateError::NoChanges);
    }

    let diff = bound_diff(diff, settings.max_diff_tokens);

    LlmCommand::new(prompt, settings.model.clone())
        .run(runner, &diff)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::error::{CollectionError, SubprocessError, TemplateError};
    use crate::process::{MockProcessRunner, ProcessOutput};

    /// A mock for a Git repository at `root` (which must contain `.git`)
    /// with jj absent and the given staged diff.
    fn git_runner(diff: impl Into<String>) -> MockProcessRunner {
        let diff = diff.into();
        let mut runner = MockProcessRunner::new();
        runner.expect_output().returning(move |program, args| {
            match (program, args.first().map(String::as_str)) {
                ("jj", _) => Err(SubprocessError::NotInstalled {
                    program: "jj".to_string(),
                }),
                ("git", Some("rev-parse")) => Ok(ProcessOutput::new(Some(0), "main\n", "")),
                ("git", Some("diff")) => Ok(ProcessOutput::new(Some(0), diff.clone(), "")),
                other => panic!("unexpected command {other:?}"),
            }
        });
        runner
    }

    fn git_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_generate_passes_diff_and_prompt_to_llm() {
        let root = git_root();
        let mut runner = git_runner("+fn main() {}\n");

        let captured = Arc::new(Mutex::new(None));
        let sink = captured.clone();
        runner
            .expect_pipe_through()
            .times(1)
            .returning(move |program, args, input, _| {
                *sink.lock().unwrap() = Some((program.to_string(), args.to_vec(), input.to_string()));
                Ok(())
            });

        generate_commit_message(&runner, root.path(), &Settings::default(), "fix startup")
            .await
            .unwrap();

        let (program, args, input) = captured.lock().unwrap().take().unwrap();
        assert_eq!(program, "llm");
        assert_eq!(input, "+fn main() {}\n");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "-s");
        assert!(args[1].contains("Current branch: main"));
        assert!(args[1].contains("User context: fix startup"));
    }

    #[tokio::test]
    async fn test_generate_passes_model_flag() {
        let root = git_root();
        let mut runner = git_runner("+x\n");
        runner
            .expect_pipe_through()
            .withf(|_, args, _, _| args.len() == 4 && args[0] == "-m" && args[1] == "claude-3-haiku")
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let settings = Settings {
            model: Some("claude-3-haiku".to_string()),
            ..Settings::default()
        };
        generate_commit_message(&runner, root.path(), &settings, "")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_generate_truncates_large_diff() {
        let root = git_root();
        let big = "+    let x = some_function(argument, another);\n".repeat(500);
        let mut runner = git_runner(big.clone());

        let captured = Arc::new(Mutex::new(String::new()));
        let sink = captured.clone();
        runner
            .expect_pipe_through()
            .times(1)
            .returning(move |_, _, input, _| {
                *sink.lock().unwrap() = input.to_string();
                Ok(())
            });

        let settings = Settings {
            max_diff_tokens: 200,
            ..Settings::default()
        };
        generate_commit_message(&runner, root.path(), &settings, "")
            .await
            .unwrap();

        let sent = captured.lock().unwrap().clone();
        assert!(sent.len() < big.len());
        assert!(sent.contains("[Diff truncated due to size - showing first "));
        assert!(DiffTruncator::new().unwrap().count(&sent) <= 200);
    }

    #[tokio::test]
    async fn test_generate_empty_diff_is_no_changes() {
        let root = git_root();
        let mut runner = git_runner("");
        runner.expect_pipe_through().never();

        let result = generate_commit_message(&runner, root.path(), &Settings::default(), "").await;
        assert!(matches!(result, Err(GenerateError::NoChanges)));
    }

    #[tokio::test]
    async fn test_generate_without_repository() {
        let root = tempfile::tempdir().unwrap();
        let mut runner = MockProcessRunner::new();
        runner.expect_output().returning(|program, _| {
            Err(SubprocessError::NotInstalled {
                program: program.to_string(),
            })
        });
        runner.expect_pipe_through().never();

        let result = generate_commit_message(&runner, root.path(), &Settings::default(), "").await;
        assert!(matches!(
            result,
            Err(GenerateError::Collection(CollectionError::NoRepository))
        ));
    }

    #[tokio::test]
    async fn test_generate_bad_template_aborts_before_llm() {
        let root = git_root();
        let template = root.path().join("prompt.tmpl");
        std::fs::write(&template, "{{.Nope}}").unwrap();

        let mut runner = git_runner("+x\n");
        runner.expect_pipe_through().never();

        let settings = Settings {
            template_path: Some(template),
            ..Settings::default()
        };
        let result = generate_commit_message(&runner, root.path(), &settings, "").await;
        assert!(matches!(
            result,
            Err(GenerateError::Template(TemplateError::UnknownField(_)))
        ));
    }

    #[tokio::test]
    async fn test_generate_llm_failure_is_error() {
        let root = git_root();
        let mut runner = git_runner("+x\n");
        runner.expect_pipe_through().returning(|program, _, _, _| {
            Err(SubprocessError::NonZeroExit {
                program: program.to_string(),
                code: Some(1),
                stderr: String::new(),
            })
        });

        let result = generate_commit_message(&runner, root.path(), &Settings::default(), "").await;
        assert!(matches!(result, Err(GenerateError::Llm(_))));
    }

    #[test]
    fn test_bound_diff_keeps_small_diff() {
        let diff = "+one line\n".to_string();
        assert_eq!(bound_diff(diff.clone(), 12_500), diff);
    }
}
