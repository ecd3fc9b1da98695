#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::DefaultBodyLimit,
    http::{Method, Request, StatusCode, Uri},
    response::IntoResponse,
};
use ngo_dashboard::{AppState, ApiClient, app, constants::DEFAULT_UPLOAD_MAX_BYTES};
use serde_json::{Value, json};
use tower::util::ServiceExt;

pub const TEST_SESSION_SECRET: &str =
    "test_secret_key_at_least_64_chars_long_test_secret_key_at_least_64_";

/// One request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
    pub raw_body: String,
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    responses: HashMap<(String, String), (StatusCode, Value)>,
}

/// Stand-in for the NGO backend. Unknown GETs answer with an empty list and
/// every other method with an empty object, unless a response was set.
#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(MockState::default()));
        let handler_state = state.clone();
        let app = Router::new()
            .fallback(move |method: Method, uri: Uri, body: Bytes| {
                let state = handler_state.clone();
                async move { respond(state, method, uri, body) }
            })
            .layer(DefaultBodyLimit::disable());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
        })
    }

    pub fn respond(&self, method: &str, path: &str, body: Value) {
        self.respond_with(method, path, StatusCode::OK, body);
    }

    pub fn respond_with(&self, method: &str, path: &str, status: StatusCode, body: Value) {
        let mut state = self.state.lock().expect("mock state lock");
        state
            .responses
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("mock state lock").requests.clone()
    }

    /// Requests other than GETs, i.e. everything that changes data.
    pub fn writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != "GET")
            .collect()
    }
}

fn respond(
    state: Arc<Mutex<MockState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> axum::response::Response {
    let raw_body = String::from_utf8_lossy(&body).to_string();
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
        raw_body,
    };
    let mut state = state.lock().expect("mock state lock");
    let key = (recorded.method.clone(), recorded.path.clone());
    state.requests.push(recorded);

    let (status, value) = state.responses.get(&key).cloned().unwrap_or_else(|| {
        if method == Method::GET {
            (StatusCode::OK, json!([]))
        } else {
            (StatusCode::OK, json!({}))
        }
    });
    (status, axum::Json(value)).into_response()
}

pub struct TestApp {
    pub router: Router,
    pub backend: MockBackend,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    setup_test_app_with_upload_limit(DEFAULT_UPLOAD_MAX_BYTES).await
}

pub async fn setup_test_app_with_upload_limit(upload_max_bytes: usize) -> anyhow::Result<TestApp> {
    let backend = MockBackend::start().await?;
    let api = ApiClient::new(backend.base_url.clone(), Duration::from_secs(5))
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;
    let app_state = AppState {
        api,
        upload_max_bytes,
    };

    let router = app::with_session(app::router(app_state), TEST_SESSION_SECRET, false)
        .map_err(|e| anyhow::anyhow!("Failed to build session layer: {}", e))?;

    Ok(TestApp { router, backend })
}

/// Response as seen by a browser: status, Location header, new cookie, body.
pub struct PageResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: String,
}

impl PageResponse {
    /// Cookie to send on the next request, falling back to the current one.
    pub fn cookie_or(&self, current: &str) -> String {
        self.set_cookie
            .as_deref()
            .and_then(|c| c.split(';').next())
            .map(str::to_string)
            .unwrap_or_else(|| current.to_string())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<PageResponse> {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let status = response.status();
    let location = header("location");
    let set_cookie = header("set-cookie");
    let content_type = header("content-type");
    let content_disposition = header("content-disposition");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;

    Ok(PageResponse {
        status,
        location,
        set_cookie,
        content_type,
        content_disposition,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

pub async fn get(app: &Router, uri: &str, cookie: &str) -> anyhow::Result<PageResponse> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if !cookie.is_empty() {
        builder = builder.header("cookie", cookie);
    }
    let request = builder
        .body(Body::empty())
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;
    send(app, request).await
}

pub async fn post_form(
    app: &Router,
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
) -> anyhow::Result<PageResponse> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    if !cookie.is_empty() {
        builder = builder.header("cookie", cookie);
    }
    let request = builder
        .body(Body::from(body))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;
    send(app, request).await
}

/// Picks a role and returns the session cookie carrying it.
pub async fn sign_in(app: &Router, role: &str) -> anyhow::Result<String> {
    let response = get(app, &format!("/roles/{}", role), "").await?;
    response
        .set_cookie
        .as_deref()
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No session cookie in response"))
}

/// Multipart upload request for `/files/upload`.
pub fn upload_request(
    folder_id: &str,
    back: &str,
    file_name: &str,
    contents: &[u8],
) -> anyhow::Result<Request<Body>> {
    let boundary = "X-NGO-BOUNDARY";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{folder}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"back\"\r\n\r\n{back}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        b = boundary,
        folder = folder_id,
        back = back,
        name = file_name
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(format!("/files/upload?back={}", urlencoding::encode(back)))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))
}
