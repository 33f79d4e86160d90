//! Exit codes and output format selection for the CLI.

pub mod exit_code;
pub mod format;

pub use exit_code::ExitCode;
pub use format::OutputFormat;
