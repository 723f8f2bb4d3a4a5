//! Guild staff, module and command configuration, and settings.

use befall_types::models::{
    FullGuildCommandConfiguration, GuildModuleConfiguration, GuildStaffTeam, PatchGuildCommandConfiguration,
    PatchGuildModuleConfiguration, SettingsExecute, SettingsExecuteResponse,
};
use befall_types::{ApiRequest, FieldKind, FieldSpec, RequestShape};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::Auth;
use crate::context::ApiContext;
use crate::error::ApiError;

const GUILD_ID: FieldSpec = FieldSpec::path("guild_id", "guildId", FieldKind::String);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildData {
    pub guild_id: String,
}

impl ApiRequest for GuildData {
    const SHAPE: RequestShape = RequestShape::new("GuildData", &[GUILD_ID]);
}

pub async fn get_staff_team(ctx: ApiContext, data: GuildData) -> Result<GuildStaffTeam, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "staff-team"]).await?;
    ctx.get_json(url, Auth::Anonymous).await
}

pub async fn get_module_configurations(
    ctx: ApiContext,
    data: GuildData,
) -> Result<Vec<GuildModuleConfiguration>, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "module-configurations"]).await?;
    ctx.get_json(url, Auth::Session).await
}

pub async fn get_all_command_configurations(
    ctx: ApiContext,
    data: GuildData,
) -> Result<Vec<FullGuildCommandConfiguration>, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "command-configurations"]).await?;
    ctx.get_json(url, Auth::Session).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchModuleConfigurationData {
    pub guild_id: String,
    pub patch: PatchGuildModuleConfiguration,
}

impl ApiRequest for PatchModuleConfigurationData {
    const SHAPE: RequestShape = RequestShape::new(
        "PatchModuleConfigurationData",
        &[
            GUILD_ID,
            FieldSpec::body("patch", "patch", FieldKind::Json)
                .required()
                .describe("module configuration patch, e.g. {\"module\":\"moderation\",\"disabled\":true}"),
        ],
    );
}

pub async fn patch_module_configuration(
    ctx: ApiContext,
    data: PatchModuleConfigurationData,
) -> Result<GuildModuleConfiguration, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "module-configurations"]).await?;
    ctx.send_json(Method::PATCH, url, Auth::Session, &data.patch).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchCommandConfigurationData {
    pub guild_id: String,
    pub patch: PatchGuildCommandConfiguration,
}

impl ApiRequest for PatchCommandConfigurationData {
    const SHAPE: RequestShape = RequestShape::new(
        "PatchCommandConfigurationData",
        &[
            GUILD_ID,
            FieldSpec::body("patch", "patch", FieldKind::Json)
                .required()
                .describe("command configuration patch, e.g. {\"command\":\"ban\",\"disabled\":true}"),
        ],
    );
}

pub async fn patch_command_configuration(
    ctx: ApiContext,
    data: PatchCommandConfigurationData,
) -> Result<FullGuildCommandConfiguration, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "command-configurations"]).await?;
    ctx.send_json(Method::PATCH, url, Auth::Session, &data.patch).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsExecuteData {
    pub guild_id: String,
    pub body: SettingsExecute,
}

impl ApiRequest for SettingsExecuteData {
    const SHAPE: RequestShape = RequestShape::new(
        "SettingsExecuteData",
        &[
            GUILD_ID,
            FieldSpec::body("body", "body", FieldKind::Json)
                .required()
                .describe("settings operation: {\"operation\",\"module\",\"setting\",\"fields\"}"),
        ],
    );
}

pub async fn settings_execute(ctx: ApiContext, data: SettingsExecuteData) -> Result<SettingsExecuteResponse, ApiError> {
    let url = ctx.endpoint(&["guilds", &data.guild_id, "settings"]).await?;
    ctx.send_json(Method::POST, url, Auth::Session, &data.body).await
}
