use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use uuid::Uuid;

use crate::{
    AppState,
    cache::SessionCache,
    utils::{
        Claims, error_codes, error_to_api_response, generate_token, success_to_api_response,
        verify_token,
    },
};

use super::model::{
    CallbackQuery, CallbackResponse, SignInResponse, UserInfo, consent_url, exchange_code,
    fetch_provider_user,
};

/// 登录入口：返回提供方授权页地址，浏览器跳转后进入等待回调状态
#[axum::debug_handler]
pub async fn sign_in(State(state): State<AppState>) -> impl IntoResponse {
    match consent_url(&state.config) {
        Ok(url) => (StatusCode::OK, success_to_api_response(SignInResponse { url })),
        Err(e) => {
            tracing::error!("Failed to build consent url: {}", e);
            (e.status(), error_to_api_response(e.api_code(), e.to_string()))
        }
    }
}

/// OAuth 回调：换码、查用户、落库、建会话、签发令牌。
/// 任何一步失败都回到未登录状态并返回错误值，不会抛出
#[axum::debug_handler]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let token_response = match exchange_code(&state.http, &state.config, &query.code).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!("Code exchange failed: {}", e);
            return (
                StatusCode::UNAUTHORIZED,
                error_to_api_response(error_codes::AUTH_FAILED, "授权码交换失败".to_string()),
            );
        }
    };

    let provider_user =
        match fetch_provider_user(&state.http, &state.config, &token_response.access_token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("Userinfo lookup failed: {}", e);
                return (
                    StatusCode::UNAUTHORIZED,
                    error_to_api_response(error_codes::AUTH_FAILED, "获取用户信息失败".to_string()),
                );
            }
        };

    let user = match UserInfo::upsert(&state.pool, &provider_user).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to upsert user {}: {}", provider_user.sub, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "保存用户失败".to_string()),
            );
        }
    };

    let session_id = Uuid::new_v4().to_string();
    if let Err(e) = SessionCache::store(
        &state.redis,
        &session_id,
        &user.user_id,
        state.config.jwt_expiration_secs,
    )
    .await
    {
        tracing::error!("Failed to store session for {}: {}", user.user_id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, "创建会话失败".to_string()),
        );
    }

    match generate_token(&user.user_id, &session_id, &state.config) {
        Ok(token) => {
            tracing::info!("User {} signed in", user.user_id);
            (
                StatusCode::OK,
                success_to_api_response(CallbackResponse { token, user }),
            )
        }
        Err(e) => {
            tracing::error!("Failed to generate token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "生成令牌失败".to_string()),
            )
        }
    }
}

/// 当前用户查询：未登录、令牌无效、会话不在或查库失败一律返回空数据，
/// 失败只记日志，这个接口永远不返回错误包
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> impl IntoResponse {
    let anonymous = || (StatusCode::OK, success_to_api_response(None::<UserInfo>));

    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return anonymous();
    };

    let claims = match verify_token(bearer.token(), &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring invalid token on /auth/me: {}", e);
            return anonymous();
        }
    };

    match SessionCache::get(&state.redis, &claims.sid).await {
        Ok(Some(_)) => {}
        Ok(None) => return anonymous(),
        Err(e) => {
            tracing::error!("Session lookup failed on /auth/me: {}", e);
            return anonymous();
        }
    }

    match UserInfo::find_by_id(&state.pool, &claims.sub).await {
        Ok(Some(user)) => (StatusCode::OK, success_to_api_response(Some(user))),
        Ok(None) => anonymous(),
        Err(e) => {
            tracing::error!("User lookup failed on /auth/me: {}", e);
            anonymous()
        }
    }
}

/// 登出：删除 Redis 会话。删除失败只记日志仍然返回成功，
/// 客户端无论如何都会丢弃本地令牌
#[axum::debug_handler]
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    if let Err(e) = SessionCache::remove(&state.redis, &claims.sid).await {
        tracing::error!("Failed to remove session {}: {}", claims.sid, e);
    }

    tracing::info!("User {} signed out", claims.sub);
    (
        StatusCode::OK,
        success_to_api_response(serde_json::json!({
            "success": true
        })),
    )
}
