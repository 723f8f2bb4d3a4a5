//! Execution context handed to every business operation.

use std::sync::Arc;

use befall_types::AppState;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

use crate::client::{ApiClient, Auth, ClientResponse, FetchRequest};
use crate::error::ApiError;

/// Process-wide application state.
///
/// Commands execute one at a time, but the OAuth callback listener and the
/// persistence layer touch the state from other tasks, so it sits behind an
/// async mutex. Never hold the guard across a network call.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn shared_state(state: AppState) -> SharedState {
    Arc::new(Mutex::new(state))
}

#[derive(Debug, Clone)]
pub struct ApiContext {
    pub client: ApiClient,
    pub state: SharedState,
}

impl ApiContext {
    pub fn new(client: ApiClient, state: SharedState) -> Self {
        Self { client, state }
    }

    /// Builds `<instance api url>/<segments...>`, percent-encoding each
    /// segment.
    pub async fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let base = self.state.lock().await.api_url().to_string();
        build_endpoint(&base, segments)
    }

    pub async fn fetch(&self, request: FetchRequest) -> Result<ClientResponse, ApiError> {
        self.client.fetch(&self.state, request).await
    }

    /// Sends a request without a body and decodes the JSON response.
    pub async fn get_json<T>(&self, url: Url, auth: Auth) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.fetch(FetchRequest::new(Method::GET, url, auth)).await?.json().await
    }

    /// Sends `body` as JSON and decodes the JSON response.
    pub async fn send_json<B, T>(&self, method: Method, url: Url, auth: Auth, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let request = FetchRequest::new(method, url, auth).json_body(body)?;
        self.fetch(request).await?.json().await
    }
}

pub(crate) fn build_endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
