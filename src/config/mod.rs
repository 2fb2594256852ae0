use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_auth_url: String,
    pub oauth_token_url: String,
    pub oauth_userinfo_url: String,
    pub oauth_redirect_origin: String,
    pub storage_root: String,
    pub legacy_api_url: String,
    pub tile_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        // 过期时间和端口可以缺省，其余变量必须显式给出
        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24);
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            oauth_client_id: env::var("OAUTH_CLIENT_ID")?,
            oauth_client_secret: env::var("OAUTH_CLIENT_SECRET")?,
            oauth_auth_url: env::var("OAUTH_AUTH_URL")?,
            oauth_token_url: env::var("OAUTH_TOKEN_URL")?,
            oauth_userinfo_url: env::var("OAUTH_USERINFO_URL")?,
            oauth_redirect_origin: env::var("OAUTH_REDIRECT_ORIGIN")?,
            storage_root: env::var("STORAGE_ROOT")?,
            legacy_api_url: env::var("LEGACY_API_URL")?,
            // 瓦片服务的密钥只从环境读取，不允许硬编码
            tile_api_key: env::var("TILE_API_KEY")?,
        })
    }

    /// JWT 有效期，同时也是 Redis 会话的过期时间
    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    /// OAuth 授权完成后浏览器跳转回来的地址
    pub fn oauth_redirect_uri(&self) -> String {
        format!(
            "{}/auth/callback",
            self.oauth_redirect_origin.trim_end_matches('/')
        )
    }
}
