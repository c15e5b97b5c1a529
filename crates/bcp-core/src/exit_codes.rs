//! Exit codes for the bcp CLI.
//!
//! Exit codes communicate outcome without requiring output parsing.
//!
//! Ranges:
//! - 0-9: operational outcomes
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors (bugs, should be reported)

/// Exit codes for bcp operations.
///
/// These codes are a stable contract for automation. Changes require
/// a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// Training failed; predictions unavailable for this session
    PredictionUnavailable = 1,

    /// Run interrupted before completing
    Interrupted = 2,

    /// Invalid arguments
    ArgsError = 10,

    /// Configuration invalid or unreadable
    ConfigError = 11,

    /// Export or other file I/O failed
    IoError = 12,

    /// Internal error (bug - please report)
    InternalError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Operational outcomes (0-9) communicate workflow state, not errors.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// User/environment errors (10-19) can be resolved by user action.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Internal errors (20-29) indicate bugs and should be reported.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PredictionUnavailable => "ERR_PREDICTION_UNAVAILABLE",
            ExitCode::Interrupted => "ERR_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::IoError => "ERR_IO",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_partition_the_codes() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::PredictionUnavailable.is_operational());
        assert!(!ExitCode::PredictionUnavailable.is_success());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::InternalError.is_internal_error());
        assert!(!ExitCode::InternalError.is_user_error());
    }

    #[test]
    fn numeric_values_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::PredictionUnavailable.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.as_i32(), 2);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::IoError.as_i32(), 12);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
    }

    #[test]
    fn display_includes_name_and_number() {
        assert_eq!(ExitCode::ConfigError.to_string(), "ERR_CONFIG (11)");
    }
}
