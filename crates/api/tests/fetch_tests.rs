use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use befall_api::ops::{auth, instance, jobs, users};
use befall_api::{ApiClient, ApiContext, ApiError, shared_state};
use befall_types::{AppState, UserSession};
use chrono::{Duration, Utc};
use serde_json::json;

async fn config() -> Json<serde_json::Value> {
    Json(json!({"client_id": "1234", "main_server": "5678"}))
}

async fn maintenance() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn permission_denied() -> Response {
    (
        StatusCode::FORBIDDEN,
        [("X-Error-Type", "permission_check")],
        Json(json!({"var": "ModuleDisabled", "module_config": {"module": "moderation"}})),
    )
        .into_response()
}

async fn settings_failure() -> Response {
    (
        StatusCode::OK,
        [("X-Error-Type", "settings_error")],
        Json(json!({"RowDoesNotExist": {"column_id": "id"}})),
    )
        .into_response()
}

async fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"message": "invalid cluster", "context": {"cluster": "x"}})),
    )
        .into_response()
}

async fn guilds(State(hits): State<Arc<AtomicUsize>>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == "User secret-token");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized"}))).into_response();
    }
    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "0")], "").into_response();
    }
    Json(json!({"guilds": [{"id": "1", "name": "Guild"}], "bot_in_guilds": ["1"]})).into_response()
}

async fn revoke() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn spawn_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/config", get(config))
        .route("/clusters/health", get(maintenance))
        .route("/guilds/{guild_id}/jobs", get(permission_denied))
        .route("/guilds/{guild_id}/settings", axum::routing::post(settings_failure))
        .route("/clusters/{cluster_id}/modules", get(bad_request))
        .route("/users/@me/guilds", get(guilds))
        .route("/sessions/{session_id}", delete(revoke))
        .with_state(hits.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), hits)
}

fn context(base: &str, authorized: bool) -> ApiContext {
    let mut state = AppState::default();
    state.fetch_options.instance_api_url = base.to_string();
    if authorized {
        state.session.add_session(UserSession {
            user_id: "u1".into(),
            session_id: "s1".into(),
            token: "secret-token".into(),
            expiry: Utc::now() + Duration::hours(1),
        });
    }
    ApiContext::new(ApiClient::new().unwrap(), shared_state(state))
}

#[tokio::test]
async fn anonymous_json_request_decodes_body() {
    let (base, _) = spawn_server().await;
    let config = instance::get_api_config(context(&base, false)).await.unwrap();
    assert_eq!(config.client_id, "1234");
    assert_eq!(config.main_server.as_deref(), Some("5678"));
}

#[tokio::test]
async fn maintenance_statuses_map_to_maintenance_error() {
    let (base, _) = spawn_server().await;
    let err = instance::get_clusters_health(context(&base, false)).await.unwrap_err();
    assert!(matches!(err, ApiError::ServerMaintenance));
}

#[tokio::test]
async fn error_kinds_are_decoded() {
    let (base, _) = spawn_server().await;
    let ctx = context(&base, true);

    let err = jobs::get_job_list(ctx.clone(), jobs::GetJobListData {
        guild_id: "42".into(),
        ..Default::default()
    })
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "The module ``moderation`` is disabled on this server");

    let settings = befall_api::ops::guilds::SettingsExecuteData {
        guild_id: "42".into(),
        ..Default::default()
    };
    let err = befall_api::ops::guilds::settings_execute(ctx.clone(), settings)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Settings(ref text) if text.contains("does not exist")));

    let err = instance::get_cluster_modules(ctx, instance::GetClusterModulesData { cluster_id: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), "API error: invalid cluster [{cluster: x}]");
}

#[tokio::test]
async fn authorized_request_waits_out_rate_limit() {
    let (base, hits) = spawn_server().await;
    let data = users::get_user_guilds(context(&base, true), Default::default()).await.unwrap();
    assert_eq!(data.guilds.len(), 1);
    assert!(data.bot_in_guild("1"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn authorized_request_without_session_fails_before_sending() {
    let (base, hits) = spawn_server().await;
    let err = users::get_user_guilds(context(&base, false), Default::default())
        .await
        .unwrap_err();
    assert!(err.is_session_error());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn revoking_a_session_forgets_it_locally() {
    let (base, _) = spawn_server().await;
    let ctx = context(&base, true);
    auth::revoke_user_session(ctx.clone(), auth::RevokeUserSessionData { session_id: "s1".into() })
        .await
        .unwrap();
    assert!(ctx.state.lock().await.session.user_sessions.is_empty());
}

#[tokio::test]
async fn download_link_is_built_without_a_request() {
    let ctx = context("http://localhost:3010/", false);
    let link = jobs::get_ioauth_download_link(ctx, jobs::GetIOAuthDownloadLinkData {
        id: "job 1".into(),
        no_redirect: true,
    })
    .await
    .unwrap();
    assert_eq!(link, "http://localhost:3010/jobs/job%201/ioauth/download-link?no_redirect=true");
}
