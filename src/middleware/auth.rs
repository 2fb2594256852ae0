use axum::{
    RequestExt,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState,
    cache::SessionCache,
    utils::{error_codes, error_to_api_response, verify_token},
};

fn unauthorized(msg: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        error_to_api_response::<()>(error_codes::AUTH_FAILED, msg.to_string()),
    )
        .into_response()
}

/// 认证中间件：校验 Bearer JWT 并确认对应会话仍在 Redis 中，
/// 通过后把 Claims 放进请求扩展，身份显式传递给后续 handler
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let TypedHeader(Authorization(bearer)) = match req
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
    {
        Ok(header) => header,
        Err(_) => return unauthorized("缺少或无法解析 Authorization 头"),
    };

    let claims = match verify_token(bearer.token(), &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            return unauthorized("令牌无效或已过期");
        }
    };

    // 登出会删除会话，拿着旧令牌的请求在这里被拦下
    match SessionCache::get(&state.redis, &claims.sid).await {
        Ok(Some(_)) => {}
        Ok(None) => return unauthorized("会话已失效，请重新登录"),
        Err(e) => {
            tracing::error!("Failed to look up session {}: {}", claims.sid, e);
            return unauthorized("会话校验失败");
        }
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}
