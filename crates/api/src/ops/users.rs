//! Users and the guilds visible to the logged-in user.

use befall_types::models::{DashboardGuild, DashboardGuildData, User};
use befall_types::{ApiRequest, FieldKind, FieldSpec, RequestShape};
use serde::{Deserialize, Serialize};

use crate::client::Auth;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::params::append_query;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserData {
    pub id: String,
}

impl ApiRequest for GetUserData {
    const SHAPE: RequestShape = RequestShape::new("GetUserData", &[FieldSpec::path("id", "id", FieldKind::String)]);
}

pub async fn get_user(ctx: ApiContext, data: GetUserData) -> Result<User, ApiError> {
    let url = ctx.endpoint(&["users", &data.id]).await?;
    ctx.get_json(url, Auth::Anonymous).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserGuildsData {
    pub refresh: bool,
}

impl ApiRequest for GetUserGuildsData {
    const SHAPE: RequestShape = RequestShape::new(
        "GetUserGuildsData",
        &[FieldSpec::query("refresh", "refresh", FieldKind::Bool).describe("bypass the server-side guild cache")],
    );
}

pub async fn get_user_guilds(ctx: ApiContext, data: GetUserGuildsData) -> Result<DashboardGuildData, ApiError> {
    let mut url = ctx.endpoint(&["users", "@me", "guilds"]).await?;
    append_query(&mut url, &data)?;
    ctx.get_json(url, Auth::Session).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserGuildBaseInfoData {
    pub guild_id: String,
}

impl ApiRequest for GetUserGuildBaseInfoData {
    const SHAPE: RequestShape = RequestShape::new(
        "GetUserGuildBaseInfoData",
        &[FieldSpec::path("guild_id", "guildId", FieldKind::String)],
    );
}

pub async fn get_user_guild_base_info(ctx: ApiContext, data: GetUserGuildBaseInfoData) -> Result<DashboardGuild, ApiError> {
    let url = ctx.endpoint(&["users", "@me", "guilds", &data.guild_id]).await?;
    ctx.get_json(url, Auth::Session).await
}
