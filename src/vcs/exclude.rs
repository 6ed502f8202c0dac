//! Exclude-pattern assembly: lock files plus generated files from `.gitattributes`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::error::CollectionError;

use super::VcsKind;

/// Lock files that are always left out of the diff.
pub const LOCK_FILES: &[&str] = &[
    "pnpm-lock.yaml",
    "yarn.lock",
    "package-lock.json",
    "Cargo.lock",
    "poetry.lock",
    "Gemfile.lock",
    "composer.lock",
    "go.sum",
];

/// File name of the Git attributes file read from the repository root.
pub const GITATTRIBUTES: &str = ".gitattributes";

/// Matches `linguist-generated=true` as a whole attribute.
static GENERATED_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)linguist-generated\s*=\s*true(?:\s|$)")
        .expect("linguist-generated regex is valid")
});

/// Ordered set of path patterns excluded from the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludePatterns {
    patterns: Vec<String>,
}

impl ExcludePatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the exclude list for a repository.
    ///
    /// Generated-file patterns come first (Git only, when `.gitattributes`
    /// exists at `root`), followed by [`LOCK_FILES`].
    pub fn for_repository(vcs: VcsKind, root: &Path) -> Result<Self, CollectionError> {
        let mut excludes = Self::new();

        let attributes = root.join(GITATTRIBUTES);
        if vcs == VcsKind::Git && attributes.is_file() {
            let file = File::open(&attributes).map_err(|source| CollectionError::Attributes {
                path: attributes.clone(),
                source,
            })?;
            let generated = parse_generated_patterns(BufReader::new(file)).map_err(|source| {
                CollectionError::Attributes {
                    path: attributes.clone(),
                    source,
                }
            })?;
            debug!("Found {} generated patterns in {}", generated.len(), attributes.display());
            excludes.extend(generated);
        }

        excludes.extend(LOCK_FILES.iter().copied());
        Ok(excludes)
    }

    /// Add a pattern. Returns `false` if it was already present.
    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        if self.patterns.contains(&pattern) {
            return false;
        }
        self.patterns.push(pattern);
        true
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

impl<S: Into<String>> Extend<S> for ExcludePatterns {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for pattern in iter {
            self.insert(pattern);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludePatterns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut excludes = Self::new();
        excludes.extend(iter);
        excludes
    }
}

/// Parse `.gitattributes` content for files marked `linguist-generated=true`.
///
/// Each non-blank, non-comment line is `<pattern> <attr>...`; lines whose
/// attributes include `linguist-generated=true` contribute their pattern.
/// Lines that are not valid UTF-8 or have no attributes are skipped. Only
/// read errors are returned.
pub fn parse_generated_patterns<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut patterns = Vec::new();

    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let Ok(line) = std::str::from_utf8(&line) else {
            debug!("Skipping non-UTF-8 line {} in {}", idx + 1, GITATTRIBUTES);
            continue;
        };

        if let Some(pattern) = generated_pattern(line) {
            patterns.push(pattern.to_string());
        }
    }

    Ok(patterns)
}

fn generated_pattern(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (pattern, attributes) = line.split_once(char::is_whitespace)?;
    // A bare `/` names the repository root itself, not a file.
    if pattern == "/" {
        return None;
    }
    if GENERATED_ATTR.is_match(attributes.trim()) {
        Some(pattern)
    } else {
        None
    }
}
