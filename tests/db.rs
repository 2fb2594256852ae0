// 需要真实 Postgres 和 Redis 的端到端测试，默认忽略。
// 运行方式：
//   TEST_DATABASE_URL=postgres://... TEST_REDIS_URL=redis://... \
//     cargo test --test db -- --ignored

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use mapa_backend::{
    AppState, cache::SessionCache, config::Config, router, utils::generate_token,
};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

fn test_config(database_url: String, redis_url: String) -> Config {
    Config {
        database_url,
        redis_url,
        server_host: "127.0.0.1".into(),
        server_port: 3000,
        jwt_secret: "db-test-secret".into(),
        jwt_expiration_secs: 3600,
        oauth_client_id: "mapa-client".into(),
        oauth_client_secret: "mapa-secret".into(),
        oauth_auth_url: "https://accounts.example.com/o/oauth2/auth".into(),
        oauth_token_url: "https://accounts.example.com/o/oauth2/token".into(),
        oauth_userinfo_url: "https://accounts.example.com/userinfo".into(),
        oauth_redirect_origin: "http://localhost:8080".into(),
        storage_root: "/tmp/mapa-db-test-storage".into(),
        legacy_api_url: "http://localhost:3000".into(),
        tile_api_key: "tile-key".into(),
    }
}

async fn setup() -> (Router, AppState) {
    let database_url =
        std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must point at a test database");
    let redis_url =
        std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

    let config = test_config(database_url, redis_url);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .expect("connect to test database");

    // 直接套用仓库里的初始化脚本，语句都是 IF NOT EXISTS，可以重复执行
    sqlx::raw_sql(include_str!("../migrations/0001_init.sql"))
        .execute(&pool)
        .await
        .expect("apply schema");

    let redis = redis::Client::open(config.redis_url.clone()).expect("redis client");
    let state = AppState {
        pool,
        config,
        redis: Arc::new(redis),
        http: reqwest::Client::new(),
    };

    (router(state.clone()), state)
}

/// 造一个已登录身份：用户行、Redis 会话、配套的 JWT
async fn sign_in_as(state: &AppState, user_id: &str) -> String {
    sqlx::query(
        "INSERT INTO users (user_id, email, display_name) VALUES ($1, $2, $3)
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(format!("{user_id}@example.com"))
    .bind(user_id)
    .execute(&state.pool)
    .await
    .expect("insert test user");

    let session_id = Uuid::new_v4().to_string();
    SessionCache::store(&state.redis, &session_id, user_id, 3600)
        .await
        .expect("store session");

    generate_token(user_id, &session_id, &state.config).expect("generate token")
}

async fn send_json(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
#[ignore = "needs live Postgres/Redis, run with -- --ignored"]
async fn create_then_list_includes_place_with_defaults() {
    let (app, state) = setup().await;
    let token = sign_in_as(&state, "user-create").await;

    let name = format!("Park {}", Uuid::new_v4());
    let (status, body) = send_json(
        &app,
        "POST",
        "/places/create",
        Some(&token),
        Some(json!({"name": name, "lat": 14.29, "lng": 121.01, "description": "nice"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created = &body["resp_data"];
    let id = created["id"].as_str().expect("generated id").to_string();
    assert!(!id.is_empty());
    assert_eq!(created["latitude"], 14.29);
    assert_eq!(created["longitude"], 121.01);
    assert_eq!(created["votes"], 0);
    assert_eq!(created["images"], json!([]));
    assert_eq!(created["comments"], json!([]));
    assert_eq!(created["has_voted"], false);
    assert!(created["last_edited"].is_null());

    let (status, body) = send_json(&app, "GET", "/places", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let places = body["resp_data"].as_array().expect("place list");

    let listed = places
        .iter()
        .find(|p| p["id"] == id.as_str())
        .expect("created place shows up in the list");
    assert_eq!(listed["name"], name.as_str());
    assert_eq!(listed["description"], "nice");
    assert_eq!(listed["votes"], 0);

    // 列表按票数不升排序
    for pair in places.windows(2) {
        assert!(pair[0]["votes"].as_i64() >= pair[1]["votes"].as_i64());
    }
}

#[tokio::test]
#[ignore = "needs live Postgres/Redis, run with -- --ignored"]
async fn update_stamps_strictly_newer_last_edited() {
    let (app, state) = setup().await;
    let token = sign_in_as(&state, "user-update").await;

    let (_, body) = send_json(
        &app,
        "POST",
        "/places/create",
        Some(&token),
        Some(json!({"name": "Park", "lat": 14.29, "lng": 121.01, "description": "nice"})),
    )
    .await;
    let id = body["resp_data"]["id"].as_str().unwrap().to_string();

    let update = |name: &str| {
        json!({
            "id": id.as_str(), "name": name, "description": "nicer", "votes": 1,
            "images": [], "comments": [], "hasVoted": true
        })
    };

    let (status, body) =
        send_json(&app, "POST", "/places/update", Some(&token), Some(update("Park2"))).await;
    assert_eq!(status, StatusCode::OK);
    let updated = &body["resp_data"];
    assert_eq!(updated["name"], "Park2");
    assert_eq!(updated["votes"], 1);
    assert_eq!(updated["has_voted"], true);
    let first_edit = chrono::DateTime::parse_from_rfc3339(updated["last_edited"].as_str().unwrap())
        .expect("timestamp");

    let (status, body) =
        send_json(&app, "POST", "/places/update", Some(&token), Some(update("Park3"))).await;
    assert_eq!(status, StatusCode::OK);
    let second_edit = chrono::DateTime::parse_from_rfc3339(
        body["resp_data"]["last_edited"].as_str().unwrap(),
    )
    .expect("timestamp");

    assert!(second_edit > first_edit);
}

#[tokio::test]
#[ignore = "needs live Postgres/Redis, run with -- --ignored"]
async fn sign_out_then_me_returns_null() {
    let (app, state) = setup().await;
    let token = sign_in_as(&state, "user-signout").await;

    let (status, body) = send_json(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["user_id"], "user-signout");

    let (status, body) = send_json(&app, "POST", "/auth/sign-out", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);

    // 旧令牌还在客户端手里，但会话已删，查询回到未登录
    let (status, body) = send_json(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert!(body["resp_data"].is_null());
}

#[tokio::test]
#[ignore = "needs live Postgres/Redis, run with -- --ignored"]
async fn repeat_vote_conflicts_and_counter_rises_once() {
    let (app, state) = setup().await;
    let token = sign_in_as(&state, "user-vote").await;

    let (_, body) = send_json(
        &app,
        "POST",
        "/places/create",
        Some(&token),
        Some(json!({"name": "Plaza", "lat": 14.3, "lng": 121.0, "description": "busy"})),
    )
    .await;
    let id = body["resp_data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        "POST",
        "/places/vote",
        Some(&token),
        Some(json!({"place_id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["votes"], 1);

    let (status, body) = send_json(
        &app,
        "POST",
        "/places/vote",
        Some(&token),
        Some(json!({"place_id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1005);

    // 台账和计数一起提交：重复投票被拒后计数仍然是 1
    let (_, body) = send_json(&app, "GET", "/places", None, None).await;
    let listed = body["resp_data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == id.as_str())
        .expect("voted place in list")
        .clone();
    assert_eq!(listed["votes"], 1);
}

#[tokio::test]
#[ignore = "needs live Postgres/Redis, run with -- --ignored"]
async fn vote_on_unknown_place_is_not_found() {
    let (app, state) = setup().await;
    let token = sign_in_as(&state, "user-vote-missing").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/places/vote",
        Some(&token),
        Some(json!({"place_id": "no-such-place"})),
    )
    .await;

    // 外键违规映射成未找到，与更新接口对未知 id 的行为一致
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 1004);
}
