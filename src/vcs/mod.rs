//! Version-control detection and diff collection for Git and Jujutsu.

pub mod branch;
pub mod detect;
pub mod diff;
pub mod exclude;

use std::fmt;

pub use branch::branch_name;
pub use detect::detect_vcs;
pub use diff::{DiffRequest, collect_diff};
pub use exclude::{ExcludePatterns, LOCK_FILES, parse_generated_patterns};

/// Supported version-control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Jujutsu,
}

impl VcsKind {
    /// Name of the binary that drives this VCS.
    pub fn program(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Jujutsu => "jj",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VcsKind::Git => "Git",
            VcsKind::Jujutsu => "Jujutsu",
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
