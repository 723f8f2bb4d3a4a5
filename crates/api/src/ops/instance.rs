//! Instance-level endpoints (the `core` category): configuration and cluster health.

use befall_types::models::{ApiConfig, CanonicalModule, InstanceList};
use befall_types::{ApiRequest, FieldKind, FieldSpec, RequestShape};
use serde::{Deserialize, Serialize};

use crate::client::Auth;
use crate::context::ApiContext;
use crate::error::ApiError;

pub async fn get_api_config(ctx: ApiContext) -> Result<ApiConfig, ApiError> {
    let url = ctx.endpoint(&["config"]).await?;
    ctx.get_json(url, Auth::Anonymous).await
}

pub async fn get_clusters_health(ctx: ApiContext) -> Result<InstanceList, ApiError> {
    let url = ctx.endpoint(&["clusters", "health"]).await?;
    ctx.get_json(url, Auth::Anonymous).await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetClusterModulesData {
    pub cluster_id: String,
}

impl ApiRequest for GetClusterModulesData {
    const SHAPE: RequestShape = RequestShape::new(
        "GetClusterModulesData",
        &[FieldSpec::path("cluster_id", "clusterId", FieldKind::String)],
    );
}

pub async fn get_cluster_modules(ctx: ApiContext, data: GetClusterModulesData) -> Result<Vec<CanonicalModule>, ApiError> {
    let url = ctx.endpoint(&["clusters", &data.cluster_id, "modules"]).await?;
    ctx.get_json(url, Auth::Anonymous).await
}
