//! Current branch lookup.

use tracing::debug;

use crate::process::ProcessRunner;

use super::VcsKind;

fn branch_args(vcs: VcsKind) -> Vec<String> {
    let args: &[&str] = match vcs {
        VcsKind::Git => &["rev-parse", "--abbrev-ref", "HEAD"],
        VcsKind::Jujutsu => &["log", "--no-graph", "-T", "local_bookmarks", "--limit", "1"],
    };
    args.iter().map(|s| s.to_string()).collect()
}

/// Get the current branch (Git) or bookmark (Jujutsu) name.
///
/// Best-effort: any failure yields an empty string.
pub async fn branch_name<R: ProcessRunner + ?Sized>(runner: &R, vcs: VcsKind) -> String {
    match runner.output(vcs.program(), &branch_args(vcs)).await {
        Ok(output) if output.success() => output.stdout.trim().to_string(),
        Ok(output) => {
            debug!("Branch lookup exited with {:?}: {}", output.code, output.stderr.trim());
            String::new()
        }
        Err(e) => {
            debug!("Branch lookup failed: {}", e);
            String::new()
        }
    }
}
