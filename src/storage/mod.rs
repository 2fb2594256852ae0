use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tokio::fs;

/// 地点图片所在的存储桶
pub const PLACE_IMAGES_BUCKET: &str = "place-images";

/// 上传成功后返回给调用方的对象描述，
/// 由调用方通过后续的地点更新把 key 挂到 images 上
#[derive(Debug, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub path: String,
}

/// 以磁盘目录为根的对象存储
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// 写入一个对象，键为"{毫秒时间戳}-{原始文件名}"，
    /// 同名文件在不同时刻上传会得到不同的键
    pub async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<StoredObject, io::Error> {
        let key = object_key(Utc::now().timestamp_millis(), file_name);

        let bucket_dir = self.root.join(PLACE_IMAGES_BUCKET);
        fs::create_dir_all(&bucket_dir).await?;

        let dest = bucket_dir.join(&key);
        if fs::try_exists(&dest).await? {
            // 同一毫秒内的同名上传视为键冲突，拒绝而不是覆盖
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("object already exists: {}", key),
            ));
        }
        fs::write(&dest, bytes).await?;

        Ok(StoredObject {
            path: format!("{}/{}", PLACE_IMAGES_BUCKET, key),
            key,
        })
    }
}

/// 生成存储键；文件名先做清洗，防止路径穿越
fn object_key(timestamp_millis: i64, file_name: &str) -> String {
    format!("{}-{}", timestamp_millis, sanitize_file_name(file_name))
}

fn sanitize_file_name(file_name: &str) -> String {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return "unnamed".to_string();
    }
    name.to_string()
}
