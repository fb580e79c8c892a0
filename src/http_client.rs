use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Url};

use crate::auth::{ExchangeContext, PreemptiveAuth};
use crate::error::{Result, TransportError, ValidationError};
use crate::tls::TrustPolicy;

/// Configuration for the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Certificate and hostname verification
    pub trust_policy: TrustPolicy,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("validate-jenkinsfile/{}", env!("CARGO_PKG_VERSION")),
            trust_policy: TrustPolicy::Strict,
        }
    }
}

/// Join a server base URL and an endpoint path.
///
/// The base may carry a context path (`http://host/jenkins`), so the path is
/// appended textually rather than resolved.
pub fn endpoint_url(server: &str, path: &str) -> Result<Url> {
    let joined = format!("{}{}", server.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| ValidationError::InvalidServerUrl {
        url: server.to_string(),
        details: e.to_string(),
    })
}

/// A named text field of a multipart/form-data body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Multipart(Vec<FormField>),
}

/// A request as assembled by the validator, before it is handed to a transport.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set a header, replacing any existing value with the same name
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Append a text field to the multipart body, switching the body to multipart
    pub fn add_text_field(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        let field = FormField {
            name: name.into(),
            value: value.into(),
        };
        match &mut self.body {
            RequestBody::Multipart(fields) => fields.push(field),
            RequestBody::Empty => self.body = RequestBody::Multipart(vec![field]),
        }
    }

    /// Value of a multipart text field, if present
    pub fn text_field(&self, name: &str) -> Option<&[u8]> {
        match &self.body {
            RequestBody::Multipart(fields) => fields
                .iter()
                .find(|field| field.name == name)
                .map(|field| field.value.as_slice()),
            RequestBody::Empty => None,
        }
    }
}

/// Status and fully-read body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one request and reads the whole response.
///
/// Implementations must not retry; every failure is reported once.
pub trait HttpTransport {
    fn execute(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = std::result::Result<HttpResponse, TransportError>> + Send;
}

/// reqwest-backed transport shared by the crumb fetch and the validation POST
///
/// Redirects are returned as-is rather than followed.
pub struct AsyncHttpClient {
    client: Client,
}

impl AsyncHttpClient {
    /// Create a new async HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .redirect(Policy::none());

        let client = config.trust_policy.apply(builder).build().map_err(|e| {
            ValidationError::TlsConfiguration {
                policy: config.trust_policy,
                details: e.to_string(),
            }
        })?;

        Ok(Self { client })
    }
}

impl HttpTransport for AsyncHttpClient {
    async fn execute(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let OutgoingRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let RequestBody::Multipart(fields) = body {
            let form = fields.into_iter().fold(Form::new(), |form, field| {
                form.part(field.name, Part::bytes(field.value))
            });
            builder = builder.multipart(form);
        }

        // The body is drained here so the connection goes back to the pool
        // before the caller sees the response.
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// One validation run's view of the server: a transport plus the
/// per-run auth context, with the preemptive auth hook run before every send.
pub struct Exchange<'a, T> {
    transport: &'a T,
    context: ExchangeContext,
    interceptor: PreemptiveAuth,
}

impl<'a, T: HttpTransport> Exchange<'a, T> {
    pub fn new(transport: &'a T, context: ExchangeContext) -> Self {
        Self {
            transport,
            context,
            interceptor: PreemptiveAuth,
        }
    }

    pub async fn send(&mut self, mut request: OutgoingRequest) -> Result<HttpResponse> {
        self.interceptor.process(&mut request, &mut self.context)?;

        let method = request.method.to_string();
        let url = request.url.to_string();
        tracing::debug!(%method, %url, "sending request");

        let response = self.transport.execute(request).await.map_err(|source| {
            ValidationError::Communication {
                method: method.clone(),
                url: url.clone(),
                source,
            }
        })?;

        tracing::debug!(%method, %url, status = response.status, "received response");
        Ok(response)
    }
}
