//! Login flows and session management.

use befall_types::models::{AuthorizeRequest, CreateUserSession, RawHttpResponse, TestAuth, TestAuthResponse, UserSessionList};
use befall_types::{ApiRequest, FieldKind, FieldSpec, RequestShape, UserSession};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{Auth, FetchRequest};
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::params::append_query;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateIoAuthLoginData {
    pub path_rd: String,
    pub path_code: Option<String>,
}

impl ApiRequest for CreateIoAuthLoginData {
    const SHAPE: RequestShape = RequestShape::new(
        "CreateIoAuthLoginData",
        &[
            FieldSpec::query("path_rd", "path_rd", FieldKind::String).describe("redirect target after login"),
            FieldSpec::query("path_code", "path_code", FieldKind::String),
        ],
    );
}

/// Starts an IO-auth login. The endpoint answers with a redirect page rather
/// than JSON, so the raw response is returned.
pub async fn create_ioauth_login(ctx: ApiContext, data: CreateIoAuthLoginData) -> Result<RawHttpResponse, ApiError> {
    let mut url = ctx.endpoint(&["ioauth", "login"]).await?;
    append_query(&mut url, &data)?;
    let response = ctx.fetch(FetchRequest::new(Method::GET, url, Auth::Anonymous)).await?;
    let headers = response.headers();
    let status_code = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|err| format!("failed to read response body: {err}"));
    Ok(RawHttpResponse {
        headers,
        status_code,
        body,
    })
}

pub async fn test_auth(ctx: ApiContext, data: TestAuth) -> Result<TestAuthResponse, ApiError> {
    let url = ctx.endpoint(&["auth", "test"]).await?;
    ctx.send_json(Method::POST, url, Auth::Anonymous, &data).await
}

/// Exchanges an OAuth2 code for a new user session.
pub async fn create_oauth2_login(ctx: ApiContext, data: AuthorizeRequest) -> Result<UserSession, ApiError> {
    let url = ctx.endpoint(&["oauth2"]).await?;
    ctx.send_json(Method::POST, url, Auth::Anonymous, &data).await
}

pub async fn get_user_sessions(ctx: ApiContext) -> Result<UserSessionList, ApiError> {
    let url = ctx.endpoint(&["sessions"]).await?;
    ctx.get_json(url, Auth::Session).await
}

pub async fn create_user_session(ctx: ApiContext, data: CreateUserSession) -> Result<UserSession, ApiError> {
    let url = ctx.endpoint(&["sessions"]).await?;
    ctx.send_json(Method::POST, url, Auth::Session, &data).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevokeUserSessionData {
    pub session_id: String,
}

impl ApiRequest for RevokeUserSessionData {
    const SHAPE: RequestShape = RequestShape::new(
        "RevokeUserSessionData",
        &[FieldSpec::path("session_id", "session_id", FieldKind::String)],
    );
}

/// Revokes a session server-side and forgets it locally.
pub async fn revoke_user_session(ctx: ApiContext, data: RevokeUserSessionData) -> Result<(), ApiError> {
    let url = ctx.endpoint(&["sessions", &data.session_id]).await?;
    ctx.fetch(FetchRequest::new(Method::DELETE, url, Auth::Session)).await?;
    if ctx.state.lock().await.session.remove_session_if_exists(&data.session_id) {
        info!(session_id = %data.session_id, "Removed revoked session from state");
    }
    Ok(())
}
