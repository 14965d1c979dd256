//! PING CLI - command-line client for the agent-to-agent messenger
//!
//! This crate provides a command-line interface for:
//! - Generating and inspecting agent identities
//! - Registering agents and browsing the directory
//! - Managing contacts
//! - Sending, signing, verifying and reading messages

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod output;

#[cfg(test)]
mod proptests;

use ping_client::{ClientError, SignerError};

pub use cli::Cli;
pub use config::{CliOverrides, Config, ConfigError};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

/// Exit codes for CLI operations
///
/// Exit codes provide machine-readable status for scripting and automation:
/// - 0: Success - operation completed successfully
/// - 1: General error - unspecified error occurred
/// - 2: API error - the server rejected the request
/// - 3: Connection failed - server unreachable or timed out
/// - 4: Invalid input - bad arguments, keys or data provided
/// - 5: Not registered - agent id or signing key missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Server answered with an error status (exit code 2)
    ApiError = 2,
    /// Server unreachable or timed out (exit code 3)
    ConnectionFailed = 3,
    /// Invalid input provided (exit code 4)
    InvalidInput = 4,
    /// Agent id or signing key missing (exit code 5)
    NotRegistered = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::ApiError => "API_ERROR",
            ExitCode::ConnectionFailed => "CONNECTION_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::NotRegistered => "NOT_REGISTERED",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::ApiError => "The server rejected the request",
            ExitCode::ConnectionFailed => "Could not reach the server in time",
            ExitCode::InvalidInput => "Invalid arguments or data provided",
            ExitCode::NotRegistered => "Agent registration or signing key required",
        }
    }

    /// Pick the exit code for an error returned by a command.
    ///
    /// Walks the error chain so context added with `anyhow` does not hide
    /// the underlying client, signer or config error.
    pub fn from_error(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(e) = cause.downcast_ref::<ClientError>() {
                return Self::from_client_error(e);
            }
            if let Some(e) = cause.downcast_ref::<SignerError>() {
                return Self::from_signer_error(e);
            }
            if cause.downcast_ref::<ConfigError>().is_some()
                || cause.downcast_ref::<serde_json::Error>().is_some()
            {
                return ExitCode::InvalidInput;
            }
        }
        ExitCode::GeneralError
    }

    fn from_client_error(error: &ClientError) -> Self {
        match error {
            ClientError::Api { .. } => ExitCode::ApiError,
            ClientError::Http(_) if error.is_connection() => ExitCode::ConnectionFailed,
            ClientError::Http(_) | ClientError::Decode(_) => ExitCode::GeneralError,
            ClientError::NotRegistered | ClientError::KeysRequired => ExitCode::NotRegistered,
            ClientError::Signer(e) => Self::from_signer_error(e),
            ClientError::InvalidUrl(_) | ClientError::Config(_) => ExitCode::InvalidInput,
        }
    }

    fn from_signer_error(error: &SignerError) -> Self {
        match error {
            SignerError::KeyNotConfigured => ExitCode::NotRegistered,
            SignerError::BadSignature => ExitCode::GeneralError,
            SignerError::InvalidKeyFormat(_)
            | SignerError::Serialization(_)
            | SignerError::EmptyMessageType
            | SignerError::InvalidPublicKey
            | SignerError::InvalidSignature(_) => ExitCode::InvalidInput,
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::ApiError as i32, 2);
        assert_eq!(ExitCode::ConnectionFailed as i32, 3);
        assert_eq!(ExitCode::InvalidInput as i32, 4);
        assert_eq!(ExitCode::NotRegistered as i32, 5);
    }

    #[test]
    fn test_exit_code_from_i32() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::NotRegistered), 5);
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::Success.name(), "SUCCESS");
        assert_eq!(ExitCode::GeneralError.name(), "GENERAL_ERROR");
        assert_eq!(ExitCode::ApiError.name(), "API_ERROR");
        assert_eq!(ExitCode::ConnectionFailed.name(), "CONNECTION_FAILED");
        assert_eq!(ExitCode::InvalidInput.name(), "INVALID_INPUT");
        assert_eq!(ExitCode::NotRegistered.name(), "NOT_REGISTERED");
    }

    #[test]
    fn test_exit_code_descriptions() {
        for code in [
            ExitCode::Success,
            ExitCode::GeneralError,
            ExitCode::ApiError,
            ExitCode::ConnectionFailed,
            ExitCode::InvalidInput,
            ExitCode::NotRegistered,
        ] {
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn test_exit_code_from_client_errors() {
        let api = anyhow::Error::new(ClientError::Api {
            status: 404,
            message: "Agent not found".into(),
        });
        assert_eq!(ExitCode::from_error(&api), ExitCode::ApiError);

        let not_registered = anyhow::Error::new(ClientError::NotRegistered);
        assert_eq!(ExitCode::from_error(&not_registered), ExitCode::NotRegistered);

        let keys = anyhow::Error::new(ClientError::KeysRequired);
        assert_eq!(ExitCode::from_error(&keys), ExitCode::NotRegistered);

        let bad_key = anyhow::Error::new(ClientError::Signer(SignerError::InvalidKeyFormat(
            "odd length".into(),
        )));
        assert_eq!(ExitCode::from_error(&bad_key), ExitCode::InvalidInput);
    }

    #[test]
    fn test_exit_code_through_context() {
        let result: Result<(), SignerError> = Err(SignerError::KeyNotConfigured);
        let err = result.context("signing message").unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotRegistered);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = anyhow::Error::new(json_err).context("parsing --payload");
        assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
    }

    #[test]
    fn test_exit_code_fallback() {
        let err = anyhow::anyhow!("something odd");
        assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);

        let err = anyhow::Error::new(SignerError::BadSignature);
        assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    }

    #[test]
    fn test_exit_code_to_process_exit_code() {
        let _ = ExitCode::Success.to_exit_code();
        let _ = ExitCode::NotRegistered.to_exit_code();
    }
}
