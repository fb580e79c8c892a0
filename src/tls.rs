//! Certificate and hostname verification policy for the Jenkins connection.

use std::fmt;

use reqwest::ClientBuilder;

use crate::http_client::HttpClientConfig;

/// How server certificates are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Platform certificate validation and hostname verification
    #[default]
    Strict,
    /// Accept every certificate chain and every hostname.
    ///
    /// Disables transport security entirely; only selected through the
    /// explicit insecure-SSL setting.
    AcceptAll,
}

impl TrustPolicy {
    pub fn from_insecure_flag(insecure: bool) -> Self {
        if insecure {
            TrustPolicy::AcceptAll
        } else {
            TrustPolicy::Strict
        }
    }

    pub fn is_insecure(self) -> bool {
        self == TrustPolicy::AcceptAll
    }

    /// Install this policy on a client builder
    pub fn apply(self, builder: ClientBuilder) -> ClientBuilder {
        match self {
            TrustPolicy::Strict => builder,
            TrustPolicy::AcceptAll => {
                tracing::warn!("TLS certificate and hostname verification disabled");
                builder
                    .danger_accept_invalid_certs(true)
                    .danger_accept_invalid_hostnames(true)
            }
        }
    }
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustPolicy::Strict => f.write_str("strict"),
            TrustPolicy::AcceptAll => f.write_str("insecure"),
        }
    }
}

/// Transport configuration for one validation run.
pub fn configure_transport(insecure: bool) -> HttpClientConfig {
    HttpClientConfig {
        trust_policy: TrustPolicy::from_insecure_flag(insecure),
        ..Default::default()
    }
}
