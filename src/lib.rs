use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use config::Config;
use redis::Client as RedisClient;
use sqlx::PgPool;

pub mod cache;
pub mod config;
pub mod error;
pub mod legacy;
pub mod middleware;
pub mod storage;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub http: reqwest::Client,
}

/// 组装全部路由，分为公开路由和受保护路由
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        // 地点公开路由
        .route("/places", get(routes::place::list_places))
        .route("/places/legacy", get(routes::place::list_places_legacy))
        // 地图配置
        .route("/map/config", get(routes::map::map_config))
        // 认证公开路由
        .route("/auth/sign-in", get(routes::auth::sign_in))
        .route("/auth/callback", get(routes::auth::callback))
        .route("/auth/me", get(routes::auth::me));

    let protected_routes = Router::new()
        // 需要认证的地点路由
        .route("/places/create", post(routes::place::create_place))
        .route("/places/update", post(routes::place::update_place))
        .route("/places/vote", post(routes::place::vote_place))
        .route("/places/upload-image", post(routes::place::upload_image))
        // 登出
        .route("/auth/sign-out", post(routes::auth::sign_out))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}
