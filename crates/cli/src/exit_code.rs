//! Process exit codes
//!
//! Scripts rely on these values; do not renumber.

/// Exit status of an `ostore` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Bad arguments or input
    UsageError = 2,
    /// Configuration could not be loaded or is incomplete
    ConfigError = 3,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
