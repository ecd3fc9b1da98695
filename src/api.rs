use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, detail_from_body};
use crate::models::Collection;

/// One request to the backend, described up front so that actions can be
/// validated (and declined) before anything is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl UpstreamCall {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A downloaded file with the headers needed to pass it on.
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Typed client for the NGO REST backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn check(path: &str, resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let detail = detail_from_body(&text, status.as_u16());
        tracing::warn!(path, status = status.as_u16(), %detail, "backend request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn json_response<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T, ApiError> {
        let resp = Self::check(path, resp).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(path, error = %e, "unexpected response body");
            ApiError::Decode(e.to_string())
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let resp = self.http.get(self.url(path)).send().await?;
        Self::json_response(path, resp).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let resp = self.http.get(self.url(path)).query(query).send().await?;
        Self::json_response(path, resp).await
    }

    /// Fetches a list endpoint, accepting both bare and wrapped arrays.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let collection: Collection<T> = if query.is_empty() {
            self.get(path).await?
        } else {
            self.get_with_query(path, query).await?
        };
        Ok(collection.into_vec())
    }

    pub async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!(path, %method, "sending JSON");
        let resp = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        Self::json_response(path, resp).await
    }

    /// Runs a call, returning the JSON body when the backend sent one.
    pub async fn execute(&self, call: &UpstreamCall) -> Result<Option<Value>, ApiError> {
        tracing::debug!(path = %call.path, method = %call.method, "executing");
        let mut builder = self.http.request(call.method.clone(), self.url(&call.path));
        if let Some(body) = &call.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let resp = Self::check(&call.path, resp).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice::<Value>(&bytes).ok())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(&UpstreamCall::new(Method::DELETE, path))
            .await
            .map(|_| ())
    }

    pub async fn download(&self, path: &str) -> Result<Download, ApiError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let resp = Self::check(path, resp).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await?.to_vec();
        Ok(Download {
            content_type,
            bytes,
        })
    }

    pub async fn upload(
        &self,
        path: &str,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
        folder_id: Option<String>,
    ) -> Result<(), ApiError> {
        let mut part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        if let Some(ct) = content_type {
            part = part
                .mime_str(&ct)
                .map_err(|e| ApiError::Network(format!("invalid content type: {}", e)))?;
        }
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(folder_id) = folder_id {
            form = form.text("folder_id", folder_id);
        }
        let resp = self
            .http
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?;
        Self::check(path, resp).await?;
        Ok(())
    }
}
