use axum::{
    extract::{Extension, Json, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, legacy,
    storage::ImageStore,
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreatePlaceRequest, Place, UpdatePlaceRequest, VoteRequest};

#[axum::debug_handler]
pub async fn list_places(State(state): State<AppState>) -> impl IntoResponse {
    match Place::list(&state.pool).await {
        Ok(places) => (StatusCode::OK, success_to_api_response(places)),
        Err(e) => {
            tracing::error!("Failed to list places: {}", e);
            (e.status(), error_to_api_response(e.api_code(), e.to_string()))
        }
    }
}

#[axum::debug_handler]
pub async fn create_place(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePlaceRequest>,
) -> impl IntoResponse {
    tracing::debug!("User {} creating place {}", claims.sub, req.name);

    match Place::create(&state.pool, req).await {
        Ok(place) => (StatusCode::CREATED, success_to_api_response(place)),
        Err(e) => {
            tracing::error!("Failed to create place: {}", e);
            (e.status(), error_to_api_response(e.api_code(), e.to_string()))
        }
    }
}

#[axum::debug_handler]
pub async fn update_place(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePlaceRequest>,
) -> impl IntoResponse {
    tracing::debug!("User {} updating place {}", claims.sub, req.id);

    match Place::update(&state.pool, req).await {
        Ok(place) => (StatusCode::OK, success_to_api_response(place)),
        Err(e) => {
            tracing::error!("Failed to update place: {}", e);
            (e.status(), error_to_api_response(e.api_code(), e.to_string()))
        }
    }
}

#[axum::debug_handler]
pub async fn vote_place(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> impl IntoResponse {
    match Place::vote(&state.pool, &req.place_id, &claims.sub).await {
        Ok(place) => (StatusCode::OK, success_to_api_response(place)),
        Err(e) => {
            tracing::warn!(
                "Vote by {} on {} rejected: {}",
                claims.sub,
                req.place_id,
                e
            );
            (e.status(), error_to_api_response(e.api_code(), e.to_string()))
        }
    }
}

/// 接收 multipart 中的第一个文件分片并写入对象存储，
/// 返回的 key 由客户端在后续更新里挂到地点的 images 上
#[axum::debug_handler]
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read multipart field: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        "无法解析上传内容".to_string(),
                    ),
                );
            }
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to read upload body: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        "读取上传内容失败".to_string(),
                    ),
                );
            }
        };

        let store = ImageStore::new(&state.config.storage_root);
        return match store.put(&file_name, &bytes).await {
            Ok(object) => {
                tracing::info!("User {} uploaded image {}", claims.sub, object.key);
                (StatusCode::OK, success_to_api_response(object))
            }
            Err(e) => {
                tracing::error!("Failed to store image {}: {}", file_name, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::STORAGE_ERROR, e.to_string()),
                )
            }
        };
    }

    (
        StatusCode::BAD_REQUEST,
        error_to_api_response(
            error_codes::VALIDATION_ERROR,
            "请求中没有文件分片".to_string(),
        ),
    )
}

/// 旧版 API 的并行取数通路，返回体原样透传
#[axum::debug_handler]
pub async fn list_places_legacy(State(state): State<AppState>) -> impl IntoResponse {
    match legacy::fetch_places(&state.http, &state.config.legacy_api_url).await {
        Ok(body) => (StatusCode::OK, success_to_api_response(body)),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            error_to_api_response(error_codes::UPSTREAM_ERROR, e.to_string()),
        ),
    }
}
