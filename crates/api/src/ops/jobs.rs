//! Guild jobs.

use befall_types::models::{Job, JobCreateResponse, JobListResponse};
use befall_types::{ApiRequest, FieldKind, FieldSpec, RequestShape};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Auth;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::params::append_query;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGuildJobData {
    pub guild_id: String,
    pub job_id: String,
}

impl ApiRequest for GetGuildJobData {
    const SHAPE: RequestShape = RequestShape::new(
        "GetGuildJobData",
        &[
            FieldSpec::path("guild_id", "guildId", FieldKind::String),
            FieldSpec::path("job_id", "id", FieldKind::String),
        ],
    );
}

pub async fn get_guild_job(ctx: ApiContext, data: GetGuildJobData) -> Result<Job, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "jobs", &data.job_id]).await?;
    ctx.get_json(url, Auth::Session).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetJobListData {
    pub guild_id: String,
    pub error_if_no_permissions: bool,
    pub error_on_unknown_job: bool,
}

impl ApiRequest for GetJobListData {
    const SHAPE: RequestShape = RequestShape::new(
        "GetJobListData",
        &[
            FieldSpec::path("guild_id", "guildId", FieldKind::String),
            FieldSpec::query("error_if_no_permissions", "error_if_no_permissions", FieldKind::Bool),
            FieldSpec::query("error_on_unknown_job", "error_on_unknown_job", FieldKind::Bool),
        ],
    );
}

pub async fn get_job_list(ctx: ApiContext, data: GetJobListData) -> Result<JobListResponse, ApiError> {
    let mut url = ctx.endpoint(&["guilds", &data.guild_id, "jobs"]).await?;
    append_query(&mut url, &data)?;
    ctx.get_json(url, Auth::Session).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateGuildJobData {
    pub guild_id: String,
    pub name: String,
    pub data: Value,
}

impl ApiRequest for CreateGuildJobData {
    const SHAPE: RequestShape = RequestShape::new(
        "CreateGuildJobData",
        &[
            FieldSpec::path("guild_id", "guildId", FieldKind::String),
            FieldSpec::path("name", "name", FieldKind::String).describe("job name, e.g. guild_create_backup"),
            FieldSpec::body("data", "data", FieldKind::Json),
        ],
    );
}

pub async fn create_guild_job(ctx: ApiContext, data: CreateGuildJobData) -> Result<JobCreateResponse, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "jobs", &data.name]).await?;
    ctx.send_json(Method::POST, url, Auth::Session, &data.data).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetIOAuthDownloadLinkData {
    pub id: String,
    pub no_redirect: bool,
}

impl ApiRequest for GetIOAuthDownloadLinkData {
    const SHAPE: RequestShape = RequestShape::new(
        "GetIOAuthDownloadLinkData",
        &[
            FieldSpec::path("id", "id", FieldKind::String),
            FieldSpec::query("no_redirect", "no_redirect", FieldKind::Bool),
        ],
    );
}

/// Builds the download link of a job's output. No request is sent.
pub async fn get_ioauth_download_link(ctx: ApiContext, data: GetIOAuthDownloadLinkData) -> Result<String, ApiError> {
    let mut url = ctx.endpoint(&["jobs", &data.id, "ioauth", "download-link"]).await?;
    append_query(&mut url, &data)?;
    Ok(url.into())
}
