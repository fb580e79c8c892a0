//! Jenkinsfile validation against a remote Jenkins server.
//!
//! A run is strictly sequential:
//! - **Load**: the Jenkinsfile must exist before any network traffic happens
//! - **Crumb**: a CSRF crumb is requested; its absence is tolerated
//! - **Submit**: the file is POSTed as the `jenkinsfile` multipart text field
//! - **Classify**: the response becomes a [`ValidationOutcome`]
//!
//! Both requests go through one [`Exchange`], so TLS policy, session cookies
//! and preemptive credentials are shared between them. Nothing is retried.

use std::path::{Path, PathBuf};

use crate::auth::{Credentials, ExchangeContext};
use crate::crumb::fetch_crumb;
use crate::error::{FailureReason, Result, ValidationError};
use crate::http_client::{
    AsyncHttpClient, Exchange, HttpResponse, HttpTransport, OutgoingRequest, endpoint_url,
};
use crate::tls::configure_transport;

pub const VALIDATION_ENDPOINT: &str = "/pipeline-model-converter/validate";

/// Phrase the converter plugin includes in a positive verdict
pub const SUCCESSFUL_VALIDATION: &str = "Jenkinsfile successfully validated.";

/// Multipart field carrying the file content
pub const JENKINSFILE_FIELD: &str = "jenkinsfile";

pub const DEFAULT_JENKINSFILE: &str = "Jenkinsfile";
pub const DEFAULT_SERVER: &str = "http://localhost:8080/jenkins";

/// Everything needed for one validation run
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSettings {
    /// Directory the Jenkinsfile path is resolved against
    pub basedir: PathBuf,
    pub jenkinsfile: PathBuf,
    /// Jenkins base URL, including any context path
    pub server: String,
    pub credentials: Option<Credentials>,
    /// Accept any certificate and hostname
    pub insecure_ssl: bool,
    pub timeout_seconds: u64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from("."),
            jenkinsfile: PathBuf::from(DEFAULT_JENKINSFILE),
            server: DEFAULT_SERVER.to_string(),
            credentials: None,
            insecure_ssl: false,
            timeout_seconds: 30,
        }
    }
}

/// A loaded Jenkinsfile and the server it is to be validated by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    path: PathBuf,
    name: String,
    content: Vec<u8>,
    server: String,
}

impl ValidationRequest {
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        server: &str,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content: content.into(),
            server: server.trim_end_matches('/').to_string(),
        }
    }

    /// Read `basedir/jenkinsfile` from disk.
    pub async fn load(basedir: &Path, jenkinsfile: &Path, server: &str) -> Result<Self> {
        let path = basedir.join(jenkinsfile);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ValidationError::FileNotFound {
                path: std::path::absolute(&path).unwrap_or(path),
            });
        }

        let content = tokio::fs::read(&path)
            .await
            .map_err(|source| ValidationError::FileUnreadable {
                path: path.clone(),
                source,
            })?;

        Ok(Self::new(
            path,
            jenkinsfile.display().to_string(),
            content,
            server,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as configured, used in the success message
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Success { file: String },
    Failure { reason: FailureReason, detail: String },
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            ValidationOutcome::Success { .. } => None,
            ValidationOutcome::Failure { reason, .. } => Some(*reason),
        }
    }
}

impl From<&ValidationError> for ValidationOutcome {
    fn from(error: &ValidationError) -> Self {
        ValidationOutcome::Failure {
            reason: error.reason(),
            detail: error.to_string(),
        }
    }
}

/// Map the validate endpoint's response onto success or a diagnostic error.
pub fn classify_response(response: &HttpResponse, server: &str) -> Result<()> {
    match response.status {
        200 if response.body.contains(SUCCESSFUL_VALIDATION) => Ok(()),
        200 => Err(ValidationError::RemoteRejected {
            body: response.body.clone(),
        }),
        404 => Err(ValidationError::EndpointNotFound {
            server: server.to_string(),
        }),
        403 => Err(ValidationError::Forbidden),
        status => Err(ValidationError::UnexpectedStatus { status }),
    }
}

/// Drives one validation over any [`HttpTransport`].
pub struct JenkinsfileValidator<T> {
    transport: T,
}

impl<T: HttpTransport> JenkinsfileValidator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate `request`, authenticating preemptively when credentials are given.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        let context = match credentials {
            Some(credentials) => ExchangeContext::with_preemptive_basic(credentials.clone()),
            None => ExchangeContext::default(),
        };
        self.validate_in(request, context).await
    }

    /// Validate `request` using an explicit exchange context.
    pub async fn validate_in(
        &self,
        request: &ValidationRequest,
        context: ExchangeContext,
    ) -> Result<()> {
        let mut exchange = Exchange::new(&self.transport, context);

        let crumb = fetch_crumb(&mut exchange, request.server()).await?;

        let mut post = OutgoingRequest::post(endpoint_url(request.server(), VALIDATION_ENDPOINT)?);
        if let Some(crumb) = &crumb {
            post.set_header(crumb.request_field(), crumb.value());
        }
        post.add_text_field(JENKINSFILE_FIELD, request.content());

        let response = exchange.send(post).await?;
        classify_response(&response, request.server())
    }
}

/// Validate the configured Jenkinsfile and report the outcome.
pub async fn validate(settings: &ValidationSettings) -> ValidationOutcome {
    match try_validate(settings).await {
        Ok(file) => ValidationOutcome::Success { file },
        Err(error) => ValidationOutcome::from(&error),
    }
}

/// Like [`validate`], but keeps the full error for reporting.
///
/// Returns the configured file name on success.
pub async fn try_validate(settings: &ValidationSettings) -> Result<String> {
    let request =
        ValidationRequest::load(&settings.basedir, &settings.jenkinsfile, &settings.server).await?;

    let mut config = configure_transport(settings.insecure_ssl);
    config.timeout_seconds = settings.timeout_seconds;
    let validator = JenkinsfileValidator::new(AsyncHttpClient::new(config)?);

    if let Err(error) = validator
        .validate(&request, settings.credentials.as_ref())
        .await
    {
        tracing::debug!(reason = %error.reason(), "validation failed");
        return Err(error);
    }

    tracing::debug!(file = request.name(), "validation succeeded");
    Ok(request.name().to_string())
}
