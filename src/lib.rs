//! # validate-jenkinsfile Library
//!
//! Validates a declarative Jenkinsfile by submitting it to a Jenkins server's
//! `pipeline-model-converter` endpoint, handling the CSRF crumb, preemptive
//! Basic authentication and optional relaxed TLS along the way.

pub mod auth;
pub mod cli;
pub mod config;
pub mod crumb;
pub mod error;
pub mod error_reporter;
pub mod http_client;
pub mod logging;
pub mod output;
pub mod tls;
pub mod validator;

pub use auth::{
    AuthScheme, AuthScope, AuthState, Credentials, CredentialsProvider, ExchangeContext,
    PreemptiveAuth, TargetHost,
};
pub use cli::{Cli, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use crumb::{Crumb, CrumbUnavailable, crumb_issuer_url, fetch_crumb};
pub use error::{FailureReason, TransportError, ValidationError};
pub use error_reporter::ErrorReporter;
pub use http_client::{
    AsyncHttpClient, Exchange, FormField, HttpClientConfig, HttpResponse, HttpTransport,
    OutgoingRequest, RequestBody, endpoint_url,
};
pub use logging::init_logging;
pub use output::Output;
pub use tls::{TrustPolicy, configure_transport};
pub use validator::{
    JenkinsfileValidator, ValidationOutcome, ValidationRequest, ValidationSettings,
    classify_response, try_validate, validate,
};
