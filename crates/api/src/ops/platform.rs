//! Platform (Discord) user lookups.

use befall_types::models::PlatformUser;
use befall_types::{ApiRequest, FieldKind, FieldSpec, RequestShape};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, FetchRequest};
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::params::append_query;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformUserData {
    pub id: String,
    pub platform: String,
}

impl ApiRequest for PlatformUserData {
    const SHAPE: RequestShape = RequestShape::new(
        "PlatformUserData",
        &[
            FieldSpec::path("id", "id", FieldKind::String),
            FieldSpec::query("platform", "platform", FieldKind::String).describe("platform name, e.g. discord"),
        ],
    );
}

async fn platform_user_url(ctx: &ApiContext, data: &PlatformUserData) -> Result<url::Url, ApiError> {
    let mut url = ctx.endpoint(&["platform", "user", &data.id]).await?;
    append_query(&mut url, data)?;
    Ok(url)
}

pub async fn get_platform_user(ctx: ApiContext, data: PlatformUserData) -> Result<PlatformUser, ApiError> {
    let url = platform_user_url(&ctx, &data).await?;
    ctx.get_json(url, Auth::Anonymous).await
}

pub async fn clear_platform_user_cache(ctx: ApiContext, data: PlatformUserData) -> Result<(), ApiError> {
    let url = platform_user_url(&ctx, &data).await?;
    ctx.fetch(FetchRequest::new(Method::DELETE, url, Auth::Anonymous)).await?;
    Ok(())
}
