// 旧版应用 API 的取数封装
// 与 /places 是并行的两条数据通路，暂不做合并

use serde_json::Value;

/// 拼出旧版地点列表接口的完整地址
pub fn mapa_url(base_url: &str) -> String {
    format!("{}/mapa", base_url.trim_end_matches('/'))
}

/// 请求旧版 API 的地点列表，失败时记录日志并原样上抛
pub async fn fetch_places(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Value, reqwest::Error> {
    let url = mapa_url(base_url);

    let response = client.get(&url).send().await.map_err(|e| {
        tracing::error!("Error fetching places from {}: {}", url, e);
        e
    })?;

    let response = response.error_for_status().map_err(|e| {
        tracing::error!("Legacy API returned error status for {}: {}", url, e);
        e
    })?;

    response.json().await.map_err(|e| {
        tracing::error!("Failed to decode legacy places payload: {}", e);
        e
    })
}
