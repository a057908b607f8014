//! Bearer-token JSON client shared by the MLflow and serving-endpoint clients.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::error::{ApiError, LifecycleError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub(crate) enum RestError {
    Api(ApiError),
    Transport(reqwest::Error),
    /// The request path could not be joined onto the base URL; nothing was sent.
    InvalidUrl(String),
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        RestError::Transport(e)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RestClient {
    /// `base` is the workspace or tracking server root, e.g. `https://host.cloud.databricks.com`.
    pub(crate) fn new(base: &str, token: Option<String>) -> Result<Self, LifecycleError> {
        let normalized = format!("{}/", base.trim().trim_end_matches('/'));
        let base = Url::parse(&normalized)
            .map_err(|e| LifecycleError::Config(format!("invalid base url {:?}: {}", base, e)))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(LifecycleError::Http)?;
        Ok(Self { http, base, token })
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RestError> {
        let mut request = self.request(Method::GET, path)?;
        if !query.is_empty() {
            request = request.query(query);
        }
        self.execute(request).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RestError> {
        let request = self.request(Method::POST, path)?.json(body);
        self.execute(request).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RestError> {
        let request = self.request(Method::PUT, path)?.json(body);
        self.execute(request).await
    }

    /// PUTs `bytes` as-is, e.g. a file upload.
    pub(crate) async fn put_bytes<T: DeserializeOwned>(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<T, RestError> {
        let request = self
            .request(Method::PUT, path)?
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        self.execute(request).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RestError> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| RestError::InvalidUrl(format!("{:?}: {}", path, e)))?;
        debug!(%method, url = %url, "rest request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RestError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), body = %text, "rest response");

        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = if parsed.message.is_empty() { text } else { parsed.message };
            return Err(RestError::Api(ApiError::new(
                status.as_u16(),
                parsed.error_code,
                message,
            )));
        }

        let body = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(body).map_err(|e| {
            RestError::Api(ApiError::new(
                status.as_u16(),
                "INVALID_RESPONSE",
                format!("unexpected response body: {}", e),
            ))
        })
    }
}
