use crate::domain::map::{CircleMarker, MapView, MarkerDefaults, MarkerId};
use crate::domain::model::{AqiReading, Coordinate, InfoStatus, SequencingPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 依座標取得空氣品質讀數的來源（通常是 HTTP 後端）
#[async_trait]
pub trait AqiSource: Send + Sync {
    async fn query(&self, coord: Coordinate) -> Result<AqiReading>;

    /// 同一個查詢，但回傳未解析的 JSON
    async fn query_raw(&self, coord: Coordinate) -> Result<serde_json::Value>;
}

/// 可點擊的地圖表面，提供標記與 popup 的基本操作
pub trait MapSurface: Send {
    fn show_view(&mut self, view: &MapView);
    fn add_marker(&mut self, marker: &CircleMarker) -> MarkerId;
    fn remove_marker(&mut self, id: MarkerId);
    fn open_popup(&mut self, id: MarkerId);
}

/// 兩個文字區塊：啟動查詢結果、最近一次點擊的狀態
pub trait StatusDisplay: Send + Sync {
    fn show_startup_result(&self, text: &str);
    fn show_status(&self, status: &InfoStatus);
}

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn startup_coordinate(&self) -> Coordinate;
    fn map_view(&self) -> MapView;
    fn marker_defaults(&self) -> MarkerDefaults;
    fn sequencing(&self) -> SequencingPolicy;
}

#[async_trait]
impl<T: AqiSource + ?Sized> AqiSource for std::sync::Arc<T> {
    async fn query(&self, coord: Coordinate) -> Result<AqiReading> {
        (**self).query(coord).await
    }

    async fn query_raw(&self, coord: Coordinate) -> Result<serde_json::Value> {
        (**self).query_raw(coord).await
    }
}
