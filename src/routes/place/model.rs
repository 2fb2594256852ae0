use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use crate::error::ServiceError;

const PLACE_COLUMNS: &str =
    "id, name, latitude, longitude, description, votes, images, comments, has_voted, last_edited";

/// 地点记录，唯一的领域实体
#[derive(Debug, Serialize, FromRow)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub votes: i32,
    /// 存储键列表，指向 place-images 桶里的对象
    pub images: Vec<String>,
    pub comments: Json<Vec<Comment>>,
    pub has_voted: bool,
    /// 首次更新之前为空，之后每次更新由服务端盖章
    pub last_edited: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// 创建请求：客户端用 lat/lng，入库改名为 latitude/longitude
#[derive(Debug, Deserialize)]
pub struct CreatePlaceRequest {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub description: String,
}

/// 更新请求：整体覆盖全部可变字段，不支持部分更新
#[derive(Debug, Deserialize)]
pub struct UpdatePlaceRequest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub votes: i32,
    pub images: Vec<String>,
    pub comments: Vec<Comment>,
    #[serde(alias = "hasVoted")]
    pub has_voted: bool,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub place_id: String,
}

impl Place {
    /// 全量列表，按票数从高到低
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, ServiceError> {
        let places = sqlx::query_as::<_, Place>(&format!(
            "SELECT {PLACE_COLUMNS} FROM places ORDER BY votes DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(places)
    }

    pub async fn create(pool: &PgPool, req: CreatePlaceRequest) -> Result<Self, ServiceError> {
        let id = Uuid::new_v4().to_string();

        let place = sqlx::query_as::<_, Place>(&format!(
            r#"
            INSERT INTO places (id, name, latitude, longitude, description, votes, images, comments, has_voted)
            VALUES ($1, $2, $3, $4, $5, 0, '{{}}', '[]'::jsonb, false)
            RETURNING {PLACE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.lat)
        .bind(req.lng)
        .bind(req.description)
        .fetch_one(pool)
        .await?;

        Ok(place)
    }

    /// 整体覆盖可变字段并盖上 last_edited；并发更新时后到的请求获胜
    pub async fn update(pool: &PgPool, req: UpdatePlaceRequest) -> Result<Self, ServiceError> {
        let place = sqlx::query_as::<_, Place>(&format!(
            r#"
            UPDATE places
            SET name = $1, description = $2, votes = $3, images = $4,
                comments = $5, has_voted = $6, last_edited = NOW()
            WHERE id = $7
            RETURNING {PLACE_COLUMNS}
            "#
        ))
        .bind(req.name)
        .bind(req.description)
        .bind(req.votes)
        .bind(req.images)
        .bind(Json(req.comments))
        .bind(req.has_voted)
        .bind(req.id)
        .fetch_one(pool)
        .await?;

        Ok(place)
    }

    /// 投票走台账表强制每个身份一票，重复投票不改动计数。
    /// 台账写入和计数自增在同一个事务里，要么一起提交要么一起回滚
    pub async fn vote(
        pool: &PgPool,
        place_id: &str,
        user_id: &str,
    ) -> Result<Self, ServiceError> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO place_votes (place_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(place_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            // 提前返回时事务随 drop 回滚
            return Err(ServiceError::AlreadyVoted);
        }

        let place = sqlx::query_as::<_, Place>(&format!(
            "UPDATE places SET votes = votes + 1 WHERE id = $1 RETURNING {PLACE_COLUMNS}"
        ))
        .bind(place_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(place)
    }
}
