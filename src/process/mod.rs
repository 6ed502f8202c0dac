//! External command execution.

pub mod runner;

pub use runner::{ProcessOutput, ProcessRunner, SystemRunner};

#[cfg(test)]
pub use runner::MockProcessRunner;
