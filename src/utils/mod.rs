use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// 统一的 API 响应包装
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0表示成功，非0表示失败
    pub code: i32,
    /// 错误消息，成功时为"success"
    pub msg: String,
    /// 响应数据，错误时为None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID（身份提供方的 subject）
    pub sid: String, // 会话ID，对应 Redis 中的会话键
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
}

/// 为指定用户和会话签发 JWT，令牌随会话一起失效
pub fn generate_token(
    user_id: &str,
    session_id: &str,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(config.jwt_expiration().as_secs() as i64))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        exp: expiration,
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

// 所有 handler 的返回类型统一为 Json<ApiResponse<T>>
pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: 0,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const AUTH_FAILED: i32 = 1002;
    pub const NOT_FOUND: i32 = 1004;
    pub const ALREADY_VOTED: i32 = 1005;
    pub const STORAGE_ERROR: i32 = 1006;
    pub const UPSTREAM_ERROR: i32 = 1007;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/mapa".into(),
            redis_url: "redis://localhost".into(),
            server_host: "127.0.0.1".into(),
            server_port: 3000,
            jwt_secret: "test-secret".into(),
            jwt_expiration_secs: 24 * 3600,
            oauth_client_id: "client".into(),
            oauth_client_secret: "secret".into(),
            oauth_auth_url: "https://accounts.example.com/o/oauth2/auth".into(),
            oauth_token_url: "https://accounts.example.com/o/oauth2/token".into(),
            oauth_userinfo_url: "https://accounts.example.com/userinfo".into(),
            oauth_redirect_origin: "http://localhost:8080".into(),
            storage_root: "/tmp/mapa-storage".into(),
            legacy_api_url: "http://localhost:3000".into(),
            tile_api_key: "tile-key".into(),
        }
    }

    #[test]
    fn token_roundtrip_keeps_user_and_session() {
        let config = test_config();
        let token = generate_token("user-1", "session-1", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.sid, "session-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let config = test_config();
        let token = generate_token("user-1", "session-1", &config).unwrap();

        let mut other = test_config();
        other.jwt_secret = "another-secret".into();
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        // 过期时间放到足够久之前，避开默认的时钟容差
        let claims = Claims {
            sub: "user-1".into(),
            sid: "session-1".into(),
            exp: Utc::now().timestamp() - 600,
            iat: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&token, &config).is_err());
    }
}
