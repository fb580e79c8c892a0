use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::tls::TrustPolicy;

/// Boxed error produced by an [`HttpTransport`](crate::http_client::HttpTransport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way a validation run can fail.
///
/// The `Display` text of each variant is the diagnostic handed to the user,
/// so variants carry the context needed to act on them.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Jenkinsfile not found at {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Error reading Jenkinsfile {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid Jenkins server URL {url}: {details}")]
    InvalidServerUrl { url: String, details: String },

    #[error(
        "Jenkinsfile validation REST endpoint not found on Jenkins server ({server}).\n\
         Please confirm that the pipeline-model-definition plugin is installed."
    )]
    EndpointNotFound { server: String },

    #[error(
        "Invalid HTTP response code: 403.\n\
         Please note that Jenkins may return a 403 even if your credentials are incorrect, \
         which would normally result in a 401."
    )]
    Forbidden,

    #[error("Invalid HTTP response code: {status}.")]
    UnexpectedStatus { status: u16 },

    /// The server answered 200 but did not accept the file; `body` is its report.
    #[error("{body}")]
    RemoteRejected { body: String },

    #[error("Error communicating with Jenkins server ({method} {url}): {source}")]
    Communication {
        method: String,
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("No credentials for preemptive authentication against {host}")]
    MissingPreemptiveCredentials { host: String },

    #[error("Error setting {policy} SSL configuration: {details}")]
    TlsConfiguration { policy: TrustPolicy, details: String },
}

/// Classification of a failed run, independent of the diagnostic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    FileNotFound,
    FileUnreadable,
    InvalidServerUrl,
    EndpointNotFound,
    Forbidden,
    UnexpectedStatus,
    RemoteRejected,
    CommunicationError,
    MissingPreemptiveCredentials,
    TlsConfiguration,
}

impl ValidationError {
    pub fn reason(&self) -> FailureReason {
        match self {
            ValidationError::FileNotFound { .. } => FailureReason::FileNotFound,
            ValidationError::FileUnreadable { .. } => FailureReason::FileUnreadable,
            ValidationError::InvalidServerUrl { .. } => FailureReason::InvalidServerUrl,
            ValidationError::EndpointNotFound { .. } => FailureReason::EndpointNotFound,
            ValidationError::Forbidden => FailureReason::Forbidden,
            ValidationError::UnexpectedStatus { .. } => FailureReason::UnexpectedStatus,
            ValidationError::RemoteRejected { .. } => FailureReason::RemoteRejected,
            ValidationError::Communication { .. } => FailureReason::CommunicationError,
            ValidationError::MissingPreemptiveCredentials { .. } => {
                FailureReason::MissingPreemptiveCredentials
            }
            ValidationError::TlsConfiguration { .. } => FailureReason::TlsConfiguration,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::FileNotFound => "file not found",
            FailureReason::FileUnreadable => "file unreadable",
            FailureReason::InvalidServerUrl => "invalid server URL",
            FailureReason::EndpointNotFound => "endpoint not found",
            FailureReason::Forbidden => "forbidden",
            FailureReason::UnexpectedStatus => "unexpected status",
            FailureReason::RemoteRejected => "rejected by server",
            FailureReason::CommunicationError => "communication error",
            FailureReason::MissingPreemptiveCredentials => "missing preemptive credentials",
            FailureReason::TlsConfiguration => "TLS configuration error",
        };
        f.write_str(name)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;
