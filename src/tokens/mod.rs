//! Token budgeting for diff text.

pub mod truncate;

pub use truncate::{DiffTruncator, TruncationResult, truncate_diff, truncation_notice};
