//! Preemptive HTTP authentication.
//!
//! Jenkins answers an unauthenticated request with 403 rather than a 401
//! challenge in many setups, so credentials are sent on the first request
//! instead of waiting to be asked. The state involved lives in an
//! [`ExchangeContext`] owned by a single validation run.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;

use crate::error::{Result, ValidationError};
use crate::http_client::OutgoingRequest;

/// Username and password, held in memory for one run only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Host and port a request is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHost {
    pub host: String,
    pub port: Option<u16>,
}

impl TargetHost {
    pub fn from_url(url: &Url) -> Option<Self> {
        Some(Self {
            host: url.host_str()?.to_ascii_lowercase(),
            port: url.port_or_known_default(),
        })
    }
}

impl fmt::Display for TargetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// Which hosts a set of credentials applies to. `None` matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthScope {
    host: Option<String>,
    port: Option<u16>,
}

impl AuthScope {
    pub const ANY: AuthScope = AuthScope {
        host: None,
        port: None,
    };

    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: Some(host.into().to_ascii_lowercase()),
            port,
        }
    }

    pub fn matches(&self, target: &TargetHost) -> bool {
        let host_matches = self.host.as_ref().is_none_or(|host| *host == target.host);
        let port_matches = self.port.is_none_or(|port| Some(port) == target.port);
        host_matches && port_matches
    }

    fn specificity(&self) -> u8 {
        u8::from(self.host.is_some()) * 2 + u8::from(self.port.is_some())
    }
}

/// Credentials store keyed by scope
#[derive(Debug, Clone, Default)]
pub struct CredentialsProvider {
    entries: Vec<(AuthScope, Credentials)>,
}

impl CredentialsProvider {
    pub fn set_credentials(&mut self, scope: AuthScope, credentials: Credentials) {
        self.entries.retain(|(existing, _)| *existing != scope);
        self.entries.push((scope, credentials));
    }

    /// Best match for a target: the most specific scope wins.
    pub fn credentials_for(&self, target: &TargetHost) -> Option<&Credentials> {
        self.entries
            .iter()
            .filter(|(scope, _)| scope.matches(target))
            .max_by_key(|(scope, _)| scope.specificity())
            .map(|(_, credentials)| credentials)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
}

impl AuthScheme {
    /// `Authorization` header value for these credentials
    pub fn authorization(self, credentials: &Credentials) -> String {
        match self {
            AuthScheme::Basic => {
                let token = STANDARD.encode(format!(
                    "{}:{}",
                    credentials.username, credentials.password
                ));
                format!("Basic {token}")
            }
        }
    }
}

/// Scheme and credentials selected for the current target host.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    scheme: Option<AuthScheme>,
    credentials: Option<Credentials>,
    host: Option<TargetHost>,
}

impl AuthState {
    pub fn scheme(&self) -> Option<AuthScheme> {
        self.scheme
    }

    pub fn update(&mut self, scheme: AuthScheme, credentials: Credentials, host: TargetHost) {
        self.scheme = Some(scheme);
        self.credentials = Some(credentials);
        self.host = Some(host);
    }

    fn scheme_for(&self, target: &TargetHost) -> Option<AuthScheme> {
        self.scheme.filter(|_| self.host.as_ref() == Some(target))
    }

    fn authorization_for(&self, target: &TargetHost) -> Option<String> {
        let scheme = self.scheme_for(target)?;
        let credentials = self.credentials.as_ref()?;
        Some(scheme.authorization(credentials))
    }
}

/// Per-run request context consulted by [`PreemptiveAuth`].
#[derive(Debug, Clone, Default)]
pub struct ExchangeContext {
    pub credentials: CredentialsProvider,
    /// Scheme to use before the server has challenged for one
    pub preemptive_scheme: Option<AuthScheme>,
    pub target_auth: AuthState,
}

impl ExchangeContext {
    /// Context that sends `credentials` with Basic auth to any host.
    pub fn with_preemptive_basic(credentials: Credentials) -> Self {
        let mut provider = CredentialsProvider::default();
        provider.set_credentials(AuthScope::ANY, credentials);
        Self {
            credentials: provider,
            preemptive_scheme: Some(AuthScheme::Basic),
            target_auth: AuthState::default(),
        }
    }
}

/// Pre-send hook attaching credentials before the server asks for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreemptiveAuth;

impl PreemptiveAuth {
    /// Runs immediately before `request` is handed to the transport.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingPreemptiveCredentials`] when a preemptive
    /// scheme is set but no credentials match the target host; the request
    /// must then not be sent.
    pub fn process(
        &self,
        request: &mut OutgoingRequest,
        context: &mut ExchangeContext,
    ) -> Result<()> {
        let Some(target) = TargetHost::from_url(&request.url) else {
            return Ok(());
        };

        if context.target_auth.scheme_for(&target).is_none()
            && let Some(scheme) = context.preemptive_scheme
        {
            let credentials = context
                .credentials
                .credentials_for(&target)
                .cloned()
                .ok_or_else(|| ValidationError::MissingPreemptiveCredentials {
                    host: target.to_string(),
                })?;
            tracing::debug!(host = %target, ?scheme, "selected preemptive authentication");
            context.target_auth.update(scheme, credentials, target.clone());
        }

        if let Some(value) = context.target_auth.authorization_for(&target) {
            request.set_header(AUTHORIZATION.as_str(), value);
        }

        Ok(())
    }
}
