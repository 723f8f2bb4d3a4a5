//! Wire models for the moderation platform API.
//!
//! Models are deliberately lenient: unknown members are kept in `extra`
//! maps where the API is known to grow, and most members default when absent.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shape::{ApiRequest, FieldKind, FieldSpec, RequestShape};

/// Generic API error body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub context: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApiConfig {
    pub client_id: String,
    #[serde(default)]
    pub main_server: Option<String>,
    #[serde(default)]
    pub support_server_invite: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Cluster health mirrors the process manager's own (PascalCase) encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstanceList {
    pub last_cluster_started_at: Option<DateTime<Utc>>,
    pub map: Vec<ClusterMap>,
    pub instances: Vec<Instance>,
    pub shard_count: u64,
    #[serde(rename = "GetGatewayBot")]
    pub gateway_bot: Option<GatewayBot>,
    pub dir: String,
    pub roll_restarting: bool,
    pub fully_up: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClusterMap {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Shards")]
    pub shards: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GatewayBot {
    pub url: String,
    pub shards: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct Instance {
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "SessionID")]
    pub session_id: String,
    #[serde(rename = "ClusterID")]
    pub cluster_id: i64,
    pub shards: Vec<u64>,
    pub active: bool,
    pub cluster_health: Vec<ShardHealth>,
    pub launched_fully: bool,
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ShardHealth {
    pub shard_id: u64,
    pub up: bool,
    pub latency: f64,
    pub guilds: u64,
    pub users: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalModule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GuildStaffTeam {
    #[serde(default)]
    pub members: Vec<Value>,
    #[serde(default)]
    pub roles: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GuildModuleConfiguration {
    pub id: String,
    pub guild_id: String,
    pub module: String,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub default_perms: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PatchGuildModuleConfiguration {
    pub module: String,
    #[serde(default)]
    pub disabled: Option<Value>,
    #[serde(default)]
    pub default_perms: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FullGuildCommandConfiguration {
    pub id: String,
    pub guild_id: String,
    pub command: String,
    #[serde(default)]
    pub perms: Option<Value>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PatchGuildCommandConfiguration {
    pub command: String,
    #[serde(default)]
    pub disabled: Option<Value>,
    #[serde(default)]
    pub perms: Option<Value>,
}

/// A settings operation against one module setting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SettingsExecute {
    /// One of `View`, `Create`, `Update`, `Delete`.
    pub operation: String,
    pub module: String,
    pub setting: String,
    #[serde(default)]
    pub fields: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SettingsExecuteResponse {
    #[serde(default)]
    pub fields: Vec<IndexMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub fields: Value,
    #[serde(default)]
    pub statuses: Vec<Value>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub resumable: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobListResponse {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobCreateResponse {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlatformUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub user: PlatformUser,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub vote_banned: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DashboardGuild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DashboardGuildData {
    #[serde(default)]
    pub guilds: Vec<DashboardGuild>,
    #[serde(default)]
    pub bot_in_guilds: Vec<String>,
}

impl DashboardGuildData {
    pub fn bot_in_guild(&self, guild_id: &str) -> bool {
        self.bot_in_guilds.iter().any(|id| id == guild_id)
    }
}

/// Body of the OAuth2 code exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AuthorizeRequest {
    pub code: String,
    pub redirect_uri: String,
    pub protocol: String,
    pub scope: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TestAuth {
    pub auth_type: String,
    pub target_id: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TestAuthResponse {
    pub auth_type: String,
    pub target_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CreateUserSession {
    pub name: String,
    /// Session type, e.g. `api`.
    #[serde(rename = "type")]
    pub session_type: String,
    /// Lifetime in seconds.
    pub expiry: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserSessionSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub session_type: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserSessionList {
    #[serde(default)]
    pub sessions: Vec<UserSessionSummary>,
}

impl ApiRequest for AuthorizeRequest {
    const SHAPE: RequestShape = RequestShape::new(
        "AuthorizeRequest",
        &[
            FieldSpec::body("code", "code", FieldKind::String).required(),
            FieldSpec::body("redirect_uri", "redirect_uri", FieldKind::String).required(),
            FieldSpec::body("protocol", "protocol", FieldKind::String),
            FieldSpec::body("scope", "scope", FieldKind::String),
        ],
    );
}

impl ApiRequest for TestAuth {
    const SHAPE: RequestShape = RequestShape::new(
        "TestAuth",
        &[
            FieldSpec::body("auth_type", "auth_type", FieldKind::String).required(),
            FieldSpec::body("target_id", "target_id", FieldKind::String).required(),
            FieldSpec::body("token", "token", FieldKind::String).required(),
        ],
    );
}

impl ApiRequest for CreateUserSession {
    const SHAPE: RequestShape = RequestShape::new(
        "CreateUserSession",
        &[
            FieldSpec::body("name", "name", FieldKind::String).required(),
            FieldSpec::body("type", "type", FieldKind::String).required(),
            FieldSpec::body("expiry", "expiry", FieldKind::I64)
                .required()
                .describe("lifetime in seconds"),
        ],
    );
}

/// Raw outcome of the IO-auth login redirect, which is not JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawHttpResponse {
    pub headers: IndexMap<String, Vec<String>>,
    pub status_code: u16,
    pub body: String,
}

/// Permission check attached to permission errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PermissionCheck {
    /// Discord permission bitsets, as decimal strings.
    pub native_perms: Vec<String>,
    pub kittycat_perms: Vec<String>,
    pub inner_and: bool,
    pub outer_and: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CommandConfigRef {
    pub command: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ModuleConfigRef {
    pub module: String,
}

/// Body of a `permission_check` error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "var")]
pub enum PermissionResult {
    Ok,
    OkWithMessage { message: String },
    MissingKittycatPerms { check: PermissionCheck },
    MissingNativePerms { check: PermissionCheck },
    MissingAnyPerms { check: PermissionCheck },
    CommandDisabled { command_config: CommandConfigRef },
    UnknownModule { module_config: ModuleConfigRef },
    ModuleNotFound,
    ModuleDisabled { module_config: ModuleConfigRef },
    NoChecksSucceeded { check: PermissionCheck },
    DiscordError { error: String },
    SudoNotGranted,
    GenericError { error: String },
}

/// Body of a `settings_error` error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub enum CanonicalSettingsError {
    Generic { message: String, src: String, typ: String },
    OperationNotSupported { operation: String },
    SchemaTypeValidationError { column: String, expected_type: String, got_type: String },
    SchemaNullValueValidationError { column: String },
    SchemaCheckValidationError { column: String, check: String, accepted_range: String, error: String },
    MissingOrInvalidField { field: String, src: String },
    RowExists { column_id: String, count: i64 },
    RowDoesNotExist { column_id: String },
    MaximumCountReached { max: i64, current: i64 },
}
