//! Diff truncation to a token budget using tiktoken's cl100k_base encoding.

use tiktoken_rs::{CoreBPE, cl100k_base};
use tracing::debug;

use crate::error::TokenizationError;

/// How many trailing tokens may be dropped to reach a prefix that decodes
/// to valid UTF-8.
const MAX_BOUNDARY_SNAP: usize = 8;

/// Notice appended to a truncated diff.
pub fn truncation_notice(kept_tokens: usize) -> String {
    format!("\n\n[Diff truncated due to size - showing first {kept_tokens} tokens]")
}

/// Outcome of [`DiffTruncator::truncate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationResult {
    pub text: String,
    pub was_truncated: bool,
    /// Token count of the input.
    pub original_tokens: usize,
    /// Diff tokens kept (excluding the notice).
    pub kept_tokens: usize,
}

/// Bounds diff text to a token budget without splitting characters.
pub struct DiffTruncator {
    bpe: CoreBPE,
}

impl std::fmt::Debug for DiffTruncator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffTruncator")
            .field("bpe", &"<cl100k_base>")
            .finish()
    }
}

impl DiffTruncator {
    /// Load the cl100k_base encoding.
    pub fn new() -> Result<Self, TokenizationError> {
        let bpe = cl100k_base().map_err(|e| TokenizationError::Init(e.to_string()))?;
        Ok(Self { bpe })
    }

    /// Number of tokens `text` encodes to.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Truncate `diff` so that the result encodes to at most `max_tokens`.
    ///
    /// Text that already fits is returned unchanged. Otherwise a token prefix
    /// is decoded and [`truncation_notice`] appended; the notice's tokens are
    /// taken out of the budget. When the budget cannot even hold the notice
    /// the bare prefix is returned.
    pub fn truncate(&self, diff: &str, max_tokens: usize) -> Result<TruncationResult, TokenizationError> {
        let tokens = self.bpe.encode_ordinary(diff);
        let original_tokens = tokens.len();

        if original_tokens <= max_tokens {
            return Ok(TruncationResult {
                text: diff.to_string(),
                was_truncated: false,
                original_tokens,
                kept_tokens: original_tokens,
            });
        }

        let notice_tokens = self.count(&truncation_notice(max_tokens));
        if notice_tokens < max_tokens
            && let Some((text, kept_tokens)) =
                self.fit_prefix(&tokens, max_tokens - notice_tokens, max_tokens, true)?
        {
            return Ok(TruncationResult {
                text,
                was_truncated: true,
                original_tokens,
                kept_tokens,
            });
        }

        let (text, kept_tokens) = self
            .fit_prefix(&tokens, max_tokens, max_tokens, false)?
            .unwrap_or_default();
        Ok(TruncationResult {
            text,
            was_truncated: true,
            original_tokens,
            kept_tokens,
        })
    }

    /// Find the longest prefix (starting from `keep` tokens) whose rendering
    /// re-encodes within `max_tokens`.
    ///
    /// Re-encoding a decoded prefix can differ from the prefix length at the
    /// cut, so each candidate is counted again and the prefix shrinks by the
    /// overshoot until it fits. Returns `None` when only an empty prefix fits
    /// and `with_notice` is set.
    fn fit_prefix(
        &self,
        tokens: &[u32],
        mut keep: usize,
        max_tokens: usize,
        with_notice: bool,
    ) -> Result<Option<(String, usize)>, TokenizationError> {
        loop {
            let (prefix, kept) = self.decode_prefix(tokens, keep)?;
            let candidate = if with_notice {
                prefix + &truncation_notice(kept)
            } else {
                prefix
            };

            let count = self.count(&candidate);
            if count <= max_tokens {
                if with_notice && kept == 0 {
                    return Ok(None);
                }
                return Ok(Some((candidate, kept)));
            }

            if kept == 0 {
                return Ok(if with_notice { None } else { Some((String::new(), 0)) });
            }
            debug!("Truncated candidate has {} tokens, budget {}; shrinking", count, max_tokens);
            keep = kept.saturating_sub(count - max_tokens).min(kept - 1);
        }
    }

    /// Decode the first `keep` tokens, dropping trailing tokens that split a
    /// multi-byte character.
    fn decode_prefix(&self, tokens: &[u32], keep: usize) -> Result<(String, usize), TokenizationError> {
        let mut end = keep.min(tokens.len());
        let floor = end.saturating_sub(MAX_BOUNDARY_SNAP);

        loop {
            match self.bpe.decode(tokens[..end].to_vec()) {
                Ok(text) => {
                    if end < keep {
                        debug!("Snapped truncation boundary back {} tokens", keep - end);
                    }
                    return Ok((text, end));
                }
                Err(e) if end > floor => {
                    debug!("Prefix of {} tokens does not decode: {}", end, e);
                    end -= 1;
                }
                Err(e) => return Err(TokenizationError::Decode(e.to_string())),
            }
        }
    }
}

/// Truncate `diff` to `max_tokens` with a freshly loaded tokenizer.
pub fn truncate_diff(diff: &str, max_tokens: usize) -> Result<TruncationResult, TokenizationError> {
    DiffTruncator::new()?.truncate(diff, max_tokens)
}
