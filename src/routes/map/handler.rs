use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{AppState, utils::success_to_api_response};

use super::model::MapConfig;

/// 地图视口配置，纯常量加配置拼出来，没有错误分支
#[axum::debug_handler]
pub async fn map_config(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        success_to_api_response(MapConfig::new(&state.config.tile_api_key)),
    )
}
