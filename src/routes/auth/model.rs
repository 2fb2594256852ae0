use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::config::Config;
use crate::error::ServiceError;

/// 本地用户记录，OAuth 回调成功后写入/刷新
#[derive(Debug, Serialize, FromRow)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// 身份提供方 userinfo 接口返回的字段
#[derive(Debug, Deserialize)]
pub struct ProviderUser {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// 令牌交换接口的响应，只取用到的字段
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    /// 客户端需要跳转到的提供方授权页地址
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub token: String,
    pub user: UserInfo,
}

/// 拼授权页地址：请求离线访问并强制选择账号
pub fn consent_url(config: &Config) -> Result<String, ServiceError> {
    let redirect_uri = config.oauth_redirect_uri();
    let url = reqwest::Url::parse_with_params(
        &config.oauth_auth_url,
        &[
            ("client_id", config.oauth_client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("access_type", "offline"),
            ("prompt", "select_account"),
        ],
    )
    .map_err(|e| ServiceError::Auth(format!("invalid auth url: {}", e)))?;

    Ok(url.into())
}

/// 用回调里的授权码到提供方换取访问令牌
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<TokenResponse, ServiceError> {
    let redirect_uri = config.oauth_redirect_uri();
    let response = http
        .post(&config.oauth_token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", config.oauth_client_id.as_str()),
            ("client_secret", config.oauth_client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    Ok(response.json().await?)
}

/// 拿访问令牌查提供方的用户信息
pub async fn fetch_provider_user(
    http: &reqwest::Client,
    config: &Config,
    access_token: &str,
) -> Result<ProviderUser, ServiceError> {
    let response = http
        .get(&config.oauth_userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?;

    Ok(response.json().await?)
}

impl UserInfo {
    /// 以提供方 subject 为主键写入或刷新用户
    pub async fn upsert(pool: &PgPool, provider: &ProviderUser) -> Result<Self, ServiceError> {
        let user = sqlx::query_as::<_, UserInfo>(
            r#"
            INSERT INTO users (user_id, email, display_name, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                avatar_url = EXCLUDED.avatar_url,
                last_login = NOW()
            RETURNING user_id, email, display_name, avatar_url, created_at, last_login
            "#,
        )
        .bind(&provider.sub)
        .bind(&provider.email)
        .bind(&provider.name)
        .bind(&provider.picture)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, user_id: &str) -> Result<Option<Self>, ServiceError> {
        let user = sqlx::query_as::<_, UserInfo>(
            r#"
            SELECT user_id, email, display_name, avatar_url, created_at, last_login
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}
