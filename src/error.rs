use std::fmt;

use axum::http::StatusCode;

use crate::utils::error_codes;

/// 服务层错误分类，所有数据操作统一返回这一种错误
#[derive(Debug)]
pub enum ServiceError {
    /// 数据库查询/写入被拒绝
    Persistence(sqlx::Error),
    /// 对象存储写入被拒绝
    Storage(std::io::Error),
    /// 身份操作失败
    Auth(String),
    /// 上游 HTTP 调用失败（OAuth 提供方或旧版 API）
    Upstream(reqwest::Error),
    /// 按 id 找不到记录
    NotFound,
    /// 同一用户对同一地点重复投票
    AlreadyVoted,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Persistence(e) => write!(f, "数据库操作失败: {}", e),
            ServiceError::Storage(e) => write!(f, "文件存储失败: {}", e),
            ServiceError::Auth(msg) => write!(f, "认证失败: {}", msg),
            ServiceError::Upstream(e) => write!(f, "上游服务请求失败: {}", e),
            ServiceError::NotFound => write!(f, "记录不存在"),
            ServiceError::AlreadyVoted => write!(f, "已经对该地点投过票"),
        }
    }
}

impl std::error::Error for ServiceError {}

// Postgres 的外键违规错误码
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ServiceError::NotFound,
            // 外键失败说明被引用的记录不存在，统一按未找到处理
            sqlx::Error::Database(db)
                if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
            {
                ServiceError::NotFound
            }
            other => ServiceError::Persistence(other),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Storage(e)
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Upstream(e)
    }
}

impl ServiceError {
    pub fn api_code(&self) -> i32 {
        match self {
            ServiceError::Persistence(_) => error_codes::INTERNAL_ERROR,
            ServiceError::Storage(_) => error_codes::STORAGE_ERROR,
            ServiceError::Auth(_) => error_codes::AUTH_FAILED,
            ServiceError::Upstream(_) => error_codes::UPSTREAM_ERROR,
            ServiceError::NotFound => error_codes::NOT_FOUND,
            ServiceError::AlreadyVoted => error_codes::ALREADY_VOTED,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::AlreadyVoted => StatusCode::CONFLICT,
        }
    }
}
