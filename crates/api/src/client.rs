//! HTTP fetch client.
//!
//! A thin wrapper around a configured `reqwest::Client` that adds the JSON
//! content type and session authorization, waits out rate limits and turns
//! error responses into [`ApiError`] values.

use std::time::Duration;

use befall_types::models::{ApiErrorBody, CanonicalSettingsError, PermissionResult};
use befall_util::redact_sensitive;
use indexmap::IndexMap;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::context::SharedState;
use crate::error::ApiError;
use crate::formatters::{format_permission_result, format_settings_error};

/// Header carrying the structured error kind.
pub const ERROR_TYPE_HEADER: &str = "X-Error-Type";

/// Statuses that mean the server is down for maintenance.
const MAINTENANCE_STATUSES: [u16; 4] = [408, 502, 503, 504];

/// Wait applied when `Retry-After` cannot be parsed.
const DEFAULT_RETRY_AFTER_MS: u64 = 3000;

/// Whether a request must carry the current session's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Anonymous,
    Session,
}

/// One outbound request. The body is kept encoded so it can be re-sent
/// after a rate limit.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub auth: Auth,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url, auth: Auth) -> Self {
        Self {
            method,
            url,
            body: None,
            auth,
        }
    }

    pub fn json_body<T: serde::Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body).map_err(ApiError::Encode)?);
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    user_agent: String,
}

impl ApiClient {
    pub fn new() -> Result<Self, ApiError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            user_agent: format!("befall/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
        })
    }

    /// Sends `request`, retrying after rate limits.
    ///
    /// Non-2xx responses, and any response carrying an error kind header,
    /// are decoded into an error.
    pub async fn fetch(&self, state: &SharedState, request: FetchRequest) -> Result<ClientResponse, ApiError> {
        loop {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
            if request.auth == Auth::Session {
                let token = {
                    let mut state = state.lock().await;
                    state.session.current_session()?.token.clone()
                };
                let value = header::HeaderValue::from_str(&format!("User {token}"))
                    .map_err(|_| ApiError::Session(befall_types::SessionError::NoToken))?;
                headers.insert(header::AUTHORIZATION, value);
            }

            debug!(method = %request.method, url = %request.url, "Sending request");
            let mut builder = self
                .http
                .request(request.method.clone(), request.url.clone())
                .headers(headers)
                .header(header::USER_AGENT, &self.user_agent);
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }
            let response = builder.send().await?;

            if MAINTENANCE_STATUSES.contains(&response.status().as_u16()) {
                return Err(ApiError::ServerMaintenance);
            }

            if let Some(retry_after) = response.headers().get(header::RETRY_AFTER) {
                let retry_after_ms = retry_after
                    .to_str()
                    .ok()
                    .and_then(|value| value.trim().parse::<f64>().ok())
                    .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
                    .map(|seconds| (seconds * 1000.0) as u64)
                    .unwrap_or(DEFAULT_RETRY_AFTER_MS);
                info!(
                    method = %request.method,
                    url = %redact_sensitive(request.url.as_str()),
                    retry_after_ms,
                    authorized = request.auth == Auth::Session,
                    "Ratelimited"
                );
                tokio::time::sleep(Duration::from_millis(retry_after_ms)).await;
                continue;
            }

            let response = ClientResponse::new(response);
            if !response.is_ok() {
                return Err(response.into_error().await);
            }
            return Ok(response);
        }
    }
}

/// A received response whose body has not been read yet.
#[derive(Debug)]
pub struct ClientResponse {
    status: StatusCode,
    error_type: Option<String>,
    inner: reqwest::Response,
}

impl ClientResponse {
    fn new(inner: reqwest::Response) -> Self {
        let error_type = inner
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .filter(|value| !value.is_empty());
        Self {
            status: inner.status(),
            error_type,
            inner,
        }
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    /// A 2xx status without an error kind. A mistaken 2xx with an error kind
    /// is still an error.
    pub fn is_ok(&self) -> bool {
        self.error_type.is_none() && self.status.is_success()
    }

    pub fn headers(&self) -> IndexMap<String, Vec<String>> {
        let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, value) in self.inner.headers() {
            out.entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        out
    }

    /// Reads and decodes the body. Consumes the response.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let bytes = self
            .inner
            .bytes()
            .await
            .map_err(|err| ApiError::Unmarshal(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Unmarshal(err.to_string()))
    }

    pub async fn text(self) -> Result<String, ApiError> {
        Ok(self.inner.text().await?)
    }

    /// Decodes the body as an error, according to the error kind.
    pub async fn into_error(self) -> ApiError {
        let status = self.status();
        match self.error_type.clone().as_deref() {
            Some("permission_check") => match self.json::<PermissionResult>().await {
                Ok(result) => ApiError::Permission(format_permission_result(&result)),
                Err(err) => err,
            },
            Some("settings_error") => match self.json::<CanonicalSettingsError>().await {
                Ok(error) => ApiError::Settings(format_settings_error(&error)),
                Err(err) => err,
            },
            _ => match self.json::<ApiErrorBody>().await {
                Ok(body) => ApiError::Api {
                    status,
                    message: body.message,
                    context: body.context,
                },
                Err(err) => err,
            },
        }
    }
}
