//! CSRF crumb retrieval.
//!
//! Jenkins issues a crumb (a header name plus a token) that must accompany
//! state-changing requests when CSRF protection is on. Failing to get one is
//! not fatal: many servers do not require it, so the run continues without.

use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::error::Result;
use crate::http_client::{Exchange, HttpTransport, OutgoingRequest, endpoint_url};

pub const CRUMB_ISSUER_PATH: &str = "/crumbIssuer/api/xml";

/// Asks the issuer for `<field>:<crumb>` as plain text
const CRUMB_XPATH: &str = r#"concat(//crumbRequestField,":",//crumb)"#;

/// Longest slice of an unexpected issuer response quoted in the warning
const MAX_QUOTED_RESPONSE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    request_field: String,
    value: String,
}

impl Crumb {
    pub fn new(request_field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            request_field: request_field.into(),
            value: value.into(),
        }
    }

    /// Header name the crumb must be sent under (e.g. `Jenkins-Crumb`)
    pub fn request_field(&self) -> &str {
        &self.request_field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parse an issuer response of the form `<field>:<crumb>`.
    ///
    /// Trailing line breaks are ignored. Anything but exactly two non-empty
    /// parts is rejected, including a crumb that itself contains a colon.
    pub fn parse(raw: &str) -> std::result::Result<Self, CrumbUnavailable> {
        let malformed = || CrumbUnavailable::Malformed {
            response: raw.chars().take(MAX_QUOTED_RESPONSE).collect(),
        };

        let parts: Vec<&str> = raw.trim_end_matches(['\r', '\n']).split(':').collect();
        let [field, value] = parts.as_slice() else {
            return Err(malformed());
        };
        if field.is_empty() || value.is_empty() {
            return Err(malformed());
        }
        if HeaderName::from_bytes(field.as_bytes()).is_err() || HeaderValue::from_str(value).is_err()
        {
            return Err(malformed());
        }

        Ok(Self::new(*field, *value))
    }
}

/// Why no crumb was obtained. Logged, never returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrumbUnavailable {
    #[error("Could not obtain CSRF crumb. Response code: {status}")]
    Status { status: u16 },

    #[error("Unexpected CSRF crumb response: {response}")]
    Malformed { response: String },
}

/// URL of the crumb issuer with the XPath query encoded.
pub fn crumb_issuer_url(server: &str) -> Result<Url> {
    let mut url = endpoint_url(server, CRUMB_ISSUER_PATH)?;
    url.query_pairs_mut().append_pair("xpath", CRUMB_XPATH);
    Ok(url)
}

/// Fetch a crumb through `exchange`, so any session cookie it sets is reused
/// by later requests on the same exchange.
///
/// Returns `Ok(None)` when the issuer answers with a non-200 status or an
/// unparsable body. Only transport failures are errors.
pub async fn fetch_crumb<T: HttpTransport>(
    exchange: &mut Exchange<'_, T>,
    server: &str,
) -> Result<Option<Crumb>> {
    let url = crumb_issuer_url(server)?;
    let response = exchange.send(OutgoingRequest::get(url)).await?;

    let crumb = if response.status == 200 {
        Crumb::parse(&response.body)
    } else {
        Err(CrumbUnavailable::Status {
            status: response.status,
        })
    };

    match crumb {
        Ok(crumb) => {
            tracing::debug!(field = crumb.request_field(), "obtained CSRF crumb");
            Ok(Some(crumb))
        }
        Err(unavailable) => {
            tracing::warn!("{unavailable}");
            Ok(None)
        }
    }
}
