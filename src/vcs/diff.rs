//! Diff retrieval through the `git` or `jj` binary.

use std::path::Path;

use tracing::debug;

use crate::error::CollectionError;
use crate::process::ProcessRunner;

use super::VcsKind;
use super::exclude::ExcludePatterns;

/// A single diff invocation: which VCS to ask and what to leave out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    vcs: VcsKind,
    excludes: ExcludePatterns,
}

impl DiffRequest {
    pub fn new(vcs: VcsKind, excludes: ExcludePatterns) -> Self {
        Self { vcs, excludes }
    }

    /// Build the request for the repository at `root`, with the default
    /// lock-file excludes and any generated files from `.gitattributes`.
    pub fn for_repository(vcs: VcsKind, root: &Path) -> Result<Self, CollectionError> {
        Ok(Self::new(vcs, ExcludePatterns::for_repository(vcs, root)?))
    }

    pub fn vcs(&self) -> VcsKind {
        self.vcs
    }

    /// Arguments for the VCS binary.
    ///
    /// Git: staged changes for the whole tree, one exclude pathspec per
    /// pattern. Jujutsu: the working-copy diff restricted by a single fileset
    /// that removes every pattern.
    pub fn args(&self) -> Vec<String> {
        match self.vcs {
            VcsKind::Git => {
                let mut args: Vec<String> = ["diff", "--cached", "--", "."]
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                args.extend(self.excludes.iter().map(git_exclude_pathspec));
                args
            }
            VcsKind::Jujutsu => {
                let mut args = vec!["diff".to_string(), "--git".to_string()];
                if let Some(fileset) = jj_exclusion_fileset(&self.excludes) {
                    args.push(fileset);
                }
                args
            }
        }
    }
}

/// Pathspec excluding `pattern`.
///
/// A leading `/` anchors a `.gitattributes` pattern at the repository root;
/// git would otherwise read it as an absolute filesystem path.
fn git_exclude_pathspec(pattern: &str) -> String {
    match pattern.strip_prefix('/') {
        Some(anchored) => format!(":(top,exclude){anchored}"),
        None => format!(":(exclude){pattern}"),
    }
}

/// `~(glob:"a" | glob:"b")`: everything except the listed patterns.
///
/// The patterns go into one expression because separate `~x` arguments are
/// unioned by jj, which would cancel each other out.
fn jj_exclusion_fileset(excludes: &ExcludePatterns) -> Option<String> {
    if excludes.is_empty() {
        return None;
    }

    let globs: Vec<String> = excludes
        .iter()
        .map(|p| p.strip_prefix('/').unwrap_or(p))
        .map(|p| format!("glob:\"{}\"", escape_fileset_string(p)))
        .collect();
    Some(format!("~({})", globs.join(" | ")))
}

fn escape_fileset_string(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        if ch == '"' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Run the diff described by `request` and return its output verbatim.
pub async fn collect_diff<R: ProcessRunner + ?Sized>(
    runner: &R,
    request: &DiffRequest,
) -> Result<String, CollectionError> {
    let vcs = request.vcs();
    let args = request.args();
    debug!("Collecting diff: {} {}", vcs.program(), args.join(" "));

    let output = runner
        .output(vcs.program(), &args)
        .await
        .and_then(|output| output.into_result(vcs.program()))
        .map_err(|source| CollectionError::Command { vcs, source })?;

    debug!("Collected {} bytes of diff", output.stdout.len());
    Ok(output.stdout)
}
