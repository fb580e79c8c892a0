//! In-process stand-in for the two Jenkins endpoints the validator talks to.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum_server::tls_rustls::RustlsConfig;
use rcgen::CertifiedKey;
use tokio::task::JoinHandle;

pub const SESSION_COOKIE: &str = "JSESSIONID=mock-session";
pub const DEFAULT_CRUMB_FIELD: &str = "Jenkins-Crumb";
pub const DEFAULT_CRUMB_VALUE: &str = "0f1e2d3c4b5a";

/// How the mock server answers
#[derive(Debug, Clone)]
pub struct MockJenkinsBehavior {
    pub crumb_status: u16,
    pub crumb_body: String,
    pub validate_status: u16,
    pub validate_body: String,
    /// Requests without exactly this `Authorization` header get a 401
    pub required_authorization: Option<String>,
    /// The validate endpoint rejects requests lacking the crumb issuer's session cookie
    pub require_session: bool,
    /// The validate endpoint answers `302 Found` to this location instead
    pub validate_redirect: Option<String>,
}

impl Default for MockJenkinsBehavior {
    fn default() -> Self {
        Self {
            crumb_status: 200,
            crumb_body: format!("{DEFAULT_CRUMB_FIELD}:{DEFAULT_CRUMB_VALUE}"),
            validate_status: 200,
            validate_body: "Jenkinsfile successfully validated.\n".to_string(),
            required_authorization: None,
            require_session: false,
            validate_redirect: None,
        }
    }
}

/// What the mock server saw
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub jenkinsfile: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

struct MockState {
    behavior: MockJenkinsBehavior,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn record(&self, uri: &Uri, headers: &HeaderMap, jenkinsfile: Option<Vec<u8>>) {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        self.requests.lock().unwrap().push(RecordedRequest {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            jenkinsfile,
        });
    }

    fn unauthorized(&self, headers: &HeaderMap) -> Option<Response> {
        let expected = self.behavior.required_authorization.as_deref()?;
        let actual = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        (actual != Some(expected))
            .then(|| (StatusCode::UNAUTHORIZED, "Authentication required").into_response())
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn crumb_issuer(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.record(&uri, &headers, None);
    if let Some(response) = state.unauthorized(&headers) {
        return response;
    }

    (
        status(state.behavior.crumb_status),
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
        state.behavior.crumb_body.clone(),
    )
        .into_response()
}

async fn validate(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut jenkinsfile = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        if name.as_deref() == Some("jenkinsfile") {
            jenkinsfile = Some(bytes.to_vec());
        }
    }
    state.record(&uri, &headers, jenkinsfile);

    if let Some(response) = state.unauthorized(&headers) {
        return response;
    }

    if let Some(location) = &state.behavior.validate_redirect {
        return (StatusCode::FOUND, [(header::LOCATION, location.clone())]).into_response();
    }

    if state.behavior.require_session {
        let has_session = headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookies| cookies.contains(SESSION_COOKIE));
        if !has_session {
            return (
                StatusCode::FORBIDDEN,
                "No valid crumb was included in the request",
            )
                .into_response();
        }
    }

    (
        status(state.behavior.validate_status),
        state.behavior.validate_body.clone(),
    )
        .into_response()
}

async fn login(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap) -> Response {
    state.record(&uri, &headers, None);
    (StatusCode::OK, "<html>Sign in to Jenkins</html>").into_response()
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/jenkins/crumbIssuer/api/xml", get(crumb_issuer))
        .route("/jenkins/pipeline-model-converter/validate", post(validate))
        .route("/jenkins/login", get(login).post(login))
        .with_state(state)
}

/// Mock Jenkins mounted under the `/jenkins` context path
pub struct MockJenkins {
    /// Base URL including the context path, e.g. `http://127.0.0.1:41234/jenkins`
    pub base_url: String,
    /// Scheme, host and port only
    pub root_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockJenkins {
    pub async fn start(behavior: MockJenkinsBehavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self::at("http", addr, state, handle)
    }

    /// Same endpoints over HTTPS with a freshly generated self-signed
    /// certificate issued for `localhost` only.
    pub async fn start_tls(behavior: MockJenkinsBehavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });
        let app = router(Arc::clone(&state));

        let CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let tls = RustlsConfig::from_pem(
            cert.pem().into_bytes(),
            key_pair.serialize_pem().into_bytes(),
        )
        .await
        .unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum_server::from_tcp_rustls(listener, tls);
        let handle = tokio::spawn(async move {
            server.serve(app.into_make_service()).await.unwrap();
        });

        Self::at("https", addr, state, handle)
    }

    fn at(scheme: &str, addr: SocketAddr, state: Arc<MockState>, handle: JoinHandle<()>) -> Self {
        Self {
            base_url: format!("{scheme}://{addr}/jenkins"),
            root_url: format!("{scheme}://{addr}"),
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockJenkins {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
