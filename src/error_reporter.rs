use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::{FailureReason, ValidationError};

/// Error reporter with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    /// Create a new error reporter with specified verbosity
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    /// Create a new error reporter with additional options
    pub fn with_options(verbosity: VerbosityLevel, show_timestamps: bool) -> Self {
        Self {
            verbosity,
            show_timestamps,
        }
    }

    /// Report a validation failure with appropriate verbosity
    pub fn report_validation_error(&self, error: &ValidationError) {
        eprintln!("{}", self.format_validation_error(error));
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    pub fn format_validation_error(&self, error: &ValidationError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet | VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
            VerbosityLevel::Debug => self.format_error_debug(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        let timestamp = self.timestamp_prefix();
        match self.verbosity {
            VerbosityLevel::Quiet => format!("{}Config error: {}", timestamp, error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!(
                    "{}Configuration Error: {}\n{}",
                    timestamp,
                    error,
                    config_help(error)
                )
            }
            VerbosityLevel::Debug => {
                format!(
                    "{}Configuration Error: {}\nDebug: {:?}\n{}",
                    timestamp,
                    error,
                    error,
                    config_help(error)
                )
            }
        }
    }

    fn timestamp_prefix(&self) -> String {
        if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }

    /// The diagnostic text verbatim, optionally timestamped
    fn format_error_normal(&self, error: &ValidationError) -> String {
        format!("{}{}", self.timestamp_prefix(), error)
    }

    fn format_error_verbose(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_normal(error);
        output.push_str(&format!("\nReason: {}", error.reason()));
        if let Some(suggestion) = suggestion(error.reason()) {
            output.push_str(&format!("\nSuggestion: {}", suggestion));
        }
        output
    }

    fn format_error_debug(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }
}

fn suggestion(reason: FailureReason) -> Option<&'static str> {
    match reason {
        FailureReason::FileNotFound => Some("Check --jenkinsfile and --basedir"),
        FailureReason::FileUnreadable => Some("Check the file permissions"),
        FailureReason::InvalidServerUrl => {
            Some("Use the Jenkins base URL, e.g. http://localhost:8080/jenkins")
        }
        FailureReason::EndpointNotFound => {
            Some("Check the server URL includes the Jenkins context path")
        }
        FailureReason::Forbidden => Some("Check --username and --password (or API token)"),
        FailureReason::CommunicationError => {
            Some("Check network connectivity; use --insecure-ssl for self-signed certificates")
        }
        FailureReason::MissingPreemptiveCredentials => {
            Some("Supply credentials for the configured server host")
        }
        FailureReason::TlsConfiguration => Some("Check the TLS backend of this build"),
        FailureReason::UnexpectedStatus | FailureReason::RemoteRejected => None,
    }
}

/// Get helpful suggestions for configuration errors
fn config_help(error: &ConfigError) -> String {
    match error {
        ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
        ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
            "Check the configuration file syntax (TOML/JSON format expected)".to_string()
        }
        ConfigError::UnsupportedFormat(_) => {
            "Use a .toml or .json configuration file".to_string()
        }
        ConfigError::Environment(_) => {
            "Fix the VALIDATE_JENKINSFILE_* environment variable".to_string()
        }
        ConfigError::Validation(_) => {
            "Resolve conflicting configuration values between file, environment, and CLI"
                .to_string()
        }
    }
}
