//! Process exit codes for the marginalia binary.
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | success |
//! | 1    | runtime failure (backend, I/O, internal) |
//! | 2    | configuration or argument error |
//! | 130  | aborted by the user (`/quit`, Ctrl-C, end of input) |

use marginalia_utils::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Runtime failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid configuration or arguments; clap uses the same code
    pub const CONFIG: ExitCode = ExitCode(2);

    /// The user ended the interview before it completed
    pub const USER_ABORT: ExitCode = ExitCode(130);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl From<&LlmError> for ExitCode {
    fn from(err: &LlmError) -> Self {
        match err {
            LlmError::Misconfiguration(_) | LlmError::Unsupported(_) | LlmError::ProviderAuth(_) => {
                Self::CONFIG
            }
            _ => Self::INTERNAL,
        }
    }
}
