use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};

const SESSION_KEY_PREFIX: &str = "session:"; // 会话键前缀

#[derive(Debug, Serialize, Deserialize)]
pub struct CachedSession {
    pub session_id: String,
    pub user_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

/// 会话缓存操作
pub struct SessionCache;

impl SessionCache {
    fn key(session_id: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, session_id)
    }

    /// 写入会话，过期时间与JWT一致
    pub async fn store(
        redis: &Arc<RedisClient>,
        session_id: &str,
        user_id: &str,
        ttl: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let now = chrono::Utc::now().timestamp();
        let session = CachedSession {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + ttl as i64,
        };

        let json = serde_json::to_string(&session).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::IoError, "序列化错误", e.to_string()))
        })?;

        let _: () = conn.set_ex(Self::key(session_id), json, ttl).await?;

        Ok(())
    }

    /// 获取会话，不存在或已过期时返回 None
    pub async fn get(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<Option<CachedSession>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(Self::key(session_id)).await?;

        match result {
            Some(json) => {
                let session = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "反序列化错误",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// 删除会话（登出）
    pub async fn remove(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(Self::key(session_id)).await?;

        Ok(())
    }
}
