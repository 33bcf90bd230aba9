use crate::core::{AqiReading, AqiSource, ConfigProvider, Coordinate, Result};
use crate::domain::model::{ForecastPoint, ForecastResponse};
use crate::utils::error::MapError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_FORECAST_HOURS: u32 = 24;

/// AQI 後端的 HTTP 客戶端。不重試、不快取，失敗直接回報給呼叫端。
#[derive(Debug, Clone)]
pub struct AqiQueryClient {
    client: Client,
    base_url: Url,
}

impl AqiQueryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        // 確保結尾有 `/`，否則 join 會吃掉最後一段路徑
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::with_timeout(config.backend_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        tracing::debug!("{} {}", method, url);
        Ok(self.client.request(method, url))
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Backend response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MapError::BackendStatus {
                status: status.as_u16(),
                detail: error_detail(&body, status.canonical_reason()),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    fn aqi_request(&self, coord: Coordinate) -> Result<RequestBuilder> {
        Ok(self
            .request(Method::GET, "aqi")?
            .query(&[("lat", coord.lat.to_string()), ("lon", coord.lon.to_string())]))
    }

    pub async fn forecast(&self, coord: Coordinate, hours: u32) -> Result<Vec<ForecastPoint>> {
        if hours == 0 {
            return Err(MapError::ValidationError {
                message: "forecast hours must be at least 1".to_string(),
            });
        }

        let request = self.request(Method::GET, "forecast")?.query(&[
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("hours", hours.to_string()),
        ]);
        let body = self.send_json(request).await?;
        let response: ForecastResponse = serde_json::from_value(body)?;
        tracing::info!("📈 Received {} forecast points for {}", response.forecasts.len(), coord);
        Ok(response.forecasts)
    }

    pub async fn ingest_synthetic(&self) -> Result<Value> {
        let request = self.request(Method::POST, "ingest/synthetic")?;
        self.send_json(request).await
    }

    pub async fn train(&self) -> Result<Value> {
        let request = self.request(Method::POST, "train")?;
        self.send_json(request).await
    }
}

#[async_trait]
impl AqiSource for AqiQueryClient {
    async fn query(&self, coord: Coordinate) -> Result<AqiReading> {
        let body = self.send_json(self.aqi_request(coord)?).await?;
        AqiReading::from_json(&body)
    }

    /// 不看狀態碼，後端回什麼 JSON 就原樣交出去（例如 404 的 `{"detail": ...}`）
    async fn query_raw(&self, coord: Coordinate) -> Result<Value> {
        let response = self.aqi_request(coord)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("⚠️ Backend answered {} for {}, returning body as-is", status, coord);
        }
        Ok(response.json::<Value>().await?)
    }
}

/// FastAPI 風格的錯誤內容 `{"detail": "..."}`，取不到就用原始內容或狀態說明
fn error_detail(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("no response body").to_string()
    } else {
        trimmed.to_string()
    }
}
