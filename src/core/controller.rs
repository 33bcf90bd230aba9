use crate::core::presenter::{ActiveMarker, MarkerPresenter};
use crate::core::{AqiReading, AqiSource, Coordinate, MapSurface, Result, StatusDisplay};
use crate::domain::map::{MapView, MarkerId};
use crate::domain::model::{InfoStatus, SequencingPolicy};
use tokio::sync::Mutex;

/// 單一點擊的結算結果
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Rendered {
        seq: u64,
        marker: MarkerId,
        reading: AqiReading,
    },
    Failed {
        seq: u64,
        message: String,
    },
    /// 只會在 `SequencingPolicy::DiscardStale` 下出現
    Discarded { seq: u64 },
}

impl ClickOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            ClickOutcome::Rendered { seq, .. }
            | ClickOutcome::Failed { seq, .. }
            | ClickOutcome::Discarded { seq } => *seq,
        }
    }
}

struct ControllerState<M: MapSurface> {
    presenter: MarkerPresenter<M>,
    status: InfoStatus,
    issued: u64,
    settled: u64,
}

/// 把地圖點擊轉成 AQI 查詢，並擁有標記與狀態兩個欄位。
///
/// 前一個查詢還沒回來時不會拒絕新的點擊；呼叫後端期間不持有狀態鎖，
/// 所以重疊的點擊依後端回應的順序結算。[`SequencingPolicy::LastSettled`]
/// 下最後回來的結果勝出；[`SequencingPolicy::DiscardStale`] 下比已結算者更舊的回應會被丟棄。
pub struct MapInteractionController<S: AqiSource, M: MapSurface, D: StatusDisplay> {
    source: S,
    display: D,
    policy: SequencingPolicy,
    state: Mutex<ControllerState<M>>,
}

impl<S: AqiSource, M: MapSurface, D: StatusDisplay> MapInteractionController<S, M, D> {
    pub fn new(source: S, presenter: MarkerPresenter<M>, display: D, policy: SequencingPolicy) -> Self {
        Self {
            source,
            display,
            policy,
            state: Mutex::new(ControllerState {
                presenter,
                status: InfoStatus::Idle,
                issued: 0,
                settled: 0,
            }),
        }
    }

    /// 套用底圖視角並顯示初始狀態
    pub async fn initialize(&self, view: &MapView) {
        let mut state = self.state.lock().await;
        state.presenter.surface_mut().show_view(view);
        self.display.show_status(&state.status);
        tracing::info!(
            "🗺️  Map ready at {} (zoom {}, policy {:?})",
            view.center,
            view.zoom,
            self.policy
        );
    }

    /// 啟動時的固定座標查詢，結果以原始 JSON 顯示，不碰標記
    pub async fn run_startup_query(&self, coord: Coordinate) -> Result<()> {
        tracing::info!("Running startup query at {}", coord);
        let body = self.source.query_raw(coord).await.map_err(|e| {
            tracing::error!("❌ Startup query failed: {}", e);
            e
        })?;
        let text = serde_json::to_string_pretty(&body)?;
        self.display.show_startup_result(&text);
        Ok(())
    }

    pub async fn handle_click(&self, coord: Coordinate) -> ClickOutcome {
        let seq = {
            let mut state = self.state.lock().await;
            state.issued += 1;
            state.status = InfoStatus::Querying;
            self.display.show_status(&state.status);
            state.issued
        };
        tracing::info!("📍 Click #{} at {}, querying AQI", seq, coord);

        // 查詢期間不持有鎖，其他點擊可以同時進行
        let result = self.source.query(coord).await;

        let mut state = self.state.lock().await;
        if self.policy == SequencingPolicy::DiscardStale && seq < state.settled {
            tracing::debug!(
                "Discarding click #{}: #{} already settled",
                seq,
                state.settled
            );
            return ClickOutcome::Discarded { seq };
        }
        state.settled = state.settled.max(seq);

        match result {
            Ok(reading) => {
                let marker = state.presenter.present(&reading);
                state.status = InfoStatus::success_for(&reading);
                self.display.show_status(&state.status);
                tracing::info!("✅ Click #{}: {}", seq, state.status);
                ClickOutcome::Rendered {
                    seq,
                    marker,
                    reading,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "❌ Click #{} at {} failed: {} ({})",
                    seq,
                    coord,
                    e,
                    e.recovery_suggestion()
                );
                state.status = InfoStatus::query_failed();
                self.display.show_status(&state.status);
                ClickOutcome::Failed {
                    seq,
                    message: e.to_string(),
                }
            }
        }
    }

    pub async fn status(&self) -> InfoStatus {
        self.state.lock().await.status.clone()
    }

    pub async fn active_marker(&self) -> Option<ActiveMarker> {
        self.state.lock().await.presenter.active().cloned()
    }

    pub async fn inspect_surface<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        let state = self.state.lock().await;
        f(state.presenter.surface())
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn policy(&self) -> SequencingPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presenter::tests::{reading, RecordingSurface};
    use crate::domain::color::ColorName;
    use crate::domain::map::MarkerDefaults;
    use crate::domain::model::QUERY_ERROR_MESSAGE;
    use crate::utils::error::MapError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    type Reply = Result<AqiReading>;

    /// 每個座標的回應由測試決定何時送出
    #[derive(Default)]
    struct GatedSource {
        gates: std::sync::Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
        calls: AtomicUsize,
    }

    impl GatedSource {
        fn gate(&self, coord: Coordinate) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(coord.to_string(), rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AqiSource for GatedSource {
        async fn query(&self, coord: Coordinate) -> Result<AqiReading> {
            let rx = self.gates.lock().unwrap().remove(&coord.to_string());
            self.calls.fetch_add(1, Ordering::SeqCst);
            match rx {
                Some(rx) => rx.await.unwrap_or_else(|_| {
                    Err(MapError::BackendStatus {
                        status: 503,
                        detail: "gate dropped".to_string(),
                    })
                }),
                None => Err(MapError::BackendStatus {
                    status: 404,
                    detail: format!("no gate for {}", coord),
                }),
            }
        }

        async fn query_raw(&self, coord: Coordinate) -> Result<serde_json::Value> {
            let reading = self.query(coord).await?;
            Ok(serde_json::to_value(reading)?)
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        statuses: std::sync::Mutex<Vec<InfoStatus>>,
        startup: std::sync::Mutex<Option<String>>,
    }

    impl RecordingDisplay {
        fn statuses(&self) -> Vec<InfoStatus> {
            self.statuses.lock().unwrap().clone()
        }
    }

    impl StatusDisplay for RecordingDisplay {
        fn show_startup_result(&self, text: &str) {
            *self.startup.lock().unwrap() = Some(text.to_string());
        }

        fn show_status(&self, status: &InfoStatus) {
            self.statuses.lock().unwrap().push(status.clone());
        }
    }

    type TestController = MapInteractionController<Arc<GatedSource>, RecordingSurface, RecordingDisplay>;

    fn controller(policy: SequencingPolicy) -> (Arc<GatedSource>, Arc<TestController>) {
        let source = Arc::new(GatedSource::default());
        let presenter = MarkerPresenter::new(RecordingSurface::default(), MarkerDefaults::default());
        let controller = Arc::new(MapInteractionController::new(
            source.clone(),
            presenter,
            RecordingDisplay::default(),
            policy,
        ));
        (source, controller)
    }

    async fn wait_for_calls(source: &GatedSource, n: usize) {
        while source.calls() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_click_success_places_marker_at_reading_position() {
        let (source, controller) = controller(SequencingPolicy::LastSettled);
        let click = Coordinate::new(28.60, 77.20);
        source
            .gate(click)
            .send(Ok(reading(28.6448, 77.2167, 87.346, Some("Moderate"))))
            .unwrap();

        let outcome = controller.handle_click(click).await;

        assert!(matches!(outcome, ClickOutcome::Rendered { seq: 1, .. }));
        let active = controller.active_marker().await.unwrap();
        assert_eq!(active.marker.position, Coordinate::new(28.6448, 77.2167));
        assert_eq!(active.marker.style.color, ColorName::Orange);
        assert_eq!(controller.inspect_surface(|s| s.markers.len()).await, 1);
        assert_eq!(
            controller.status().await,
            InfoStatus::Success("Nearest station: 28.6448,77.2167 — PM2.5 87.3 µg/m³".to_string())
        );
        assert_eq!(
            controller.display().statuses(),
            vec![
                InfoStatus::Querying,
                InfoStatus::Success("Nearest station: 28.6448,77.2167 — PM2.5 87.3 µg/m³".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_existing_marker() {
        let (source, controller) = controller(SequencingPolicy::LastSettled);
        let first = Coordinate::new(28.6, 77.2);
        let second = Coordinate::new(12.9, 77.5);
        source.gate(first).send(Ok(reading(28.61, 77.23, 40.0, Some("Good")))).unwrap();
        source
            .gate(second)
            .send(Err(MapError::BackendStatus {
                status: 500,
                detail: "Internal Server Error".to_string(),
            }))
            .unwrap();

        controller.handle_click(first).await;
        let before = controller.active_marker().await.unwrap();
        let outcome = controller.handle_click(second).await;

        assert!(matches!(outcome, ClickOutcome::Failed { seq: 2, .. }));
        assert_eq!(controller.active_marker().await.unwrap(), before);
        assert_eq!(controller.inspect_surface(|s| s.markers.len()).await, 1);
        assert_eq!(controller.status().await, InfoStatus::Error(QUERY_ERROR_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_controller_recovers_after_failure() {
        let (source, controller) = controller(SequencingPolicy::LastSettled);
        let bad = Coordinate::new(0.0, 0.0);
        let good = Coordinate::new(1.0, 1.0);
        source
            .gate(bad)
            .send(Err(MapError::MalformedReading {
                field: "pm25".to_string(),
                reason: "field is missing".to_string(),
            }))
            .unwrap();
        source.gate(good).send(Ok(reading(1.0, 1.0, 5.0, Some("Good")))).unwrap();

        assert!(matches!(controller.handle_click(bad).await, ClickOutcome::Failed { .. }));
        assert!(controller.active_marker().await.is_none());
        assert!(matches!(controller.handle_click(good).await, ClickOutcome::Rendered { .. }));
        assert!(controller.status().await.is_settled());
    }

    #[tokio::test]
    async fn test_last_settled_wins_race() {
        let (source, controller) = controller(SequencingPolicy::LastSettled);
        let a = Coordinate::new(28.6, 77.2);
        let b = Coordinate::new(12.9, 77.5);
        let gate_a = source.gate(a);
        let gate_b = source.gate(b);

        let click_a = tokio::spawn({
            let c = controller.clone();
            async move { c.handle_click(a).await }
        });
        wait_for_calls(&source, 1).await;
        let click_b = tokio::spawn({
            let c = controller.clone();
            async move { c.handle_click(b).await }
        });
        wait_for_calls(&source, 2).await;

        gate_b.send(Ok(reading(12.97, 77.59, 30.0, Some("Good")))).unwrap();
        let outcome_b = click_b.await.unwrap();
        gate_a.send(Ok(reading(28.64, 77.21, 300.0, Some("Very Unhealthy")))).unwrap();
        let outcome_a = click_a.await.unwrap();

        assert_eq!(outcome_a.seq(), 1);
        assert_eq!(outcome_b.seq(), 2);
        assert!(matches!(outcome_a, ClickOutcome::Rendered { .. }));

        // A 較早送出但較晚回來，最後畫面是 A
        let active = controller.active_marker().await.unwrap();
        assert_eq!(active.marker.position, Coordinate::new(28.64, 77.21));
        assert_eq!(active.marker.style.color, ColorName::Purple);
        assert_eq!(controller.inspect_surface(|s| s.markers.len()).await, 1);
        assert!(controller.status().await.message().contains("28.6400,77.2100"));
    }

    #[tokio::test]
    async fn test_discard_stale_keeps_newer_result() {
        let (source, controller) = controller(SequencingPolicy::DiscardStale);
        let a = Coordinate::new(28.6, 77.2);
        let b = Coordinate::new(12.9, 77.5);
        let gate_a = source.gate(a);
        let gate_b = source.gate(b);

        let click_a = tokio::spawn({
            let c = controller.clone();
            async move { c.handle_click(a).await }
        });
        wait_for_calls(&source, 1).await;
        let click_b = tokio::spawn({
            let c = controller.clone();
            async move { c.handle_click(b).await }
        });
        wait_for_calls(&source, 2).await;

        gate_b.send(Ok(reading(12.97, 77.59, 30.0, Some("Good")))).unwrap();
        assert!(matches!(click_b.await.unwrap(), ClickOutcome::Rendered { seq: 2, .. }));
        gate_a.send(Err(MapError::BackendStatus {
            status: 500,
            detail: "late failure".to_string(),
        }))
        .unwrap();
        assert_eq!(click_a.await.unwrap(), ClickOutcome::Discarded { seq: 1 });

        let active = controller.active_marker().await.unwrap();
        assert_eq!(active.marker.position, Coordinate::new(12.97, 77.59));
        assert!(controller.status().await.message().contains("12.9700,77.5900"));
    }

    #[tokio::test]
    async fn test_hung_query_does_not_block_other_clicks() {
        let (source, controller) = controller(SequencingPolicy::LastSettled);
        let hung = Coordinate::new(10.0, 10.0);
        let ok = Coordinate::new(20.0, 20.0);
        let _hung_gate = source.gate(hung);
        source.gate(ok).send(Ok(reading(20.0, 20.0, 60.0, Some("Moderate")))).unwrap();

        let hung_click = tokio::spawn({
            let c = controller.clone();
            async move { c.handle_click(hung).await }
        });
        wait_for_calls(&source, 1).await;

        let outcome = controller.handle_click(ok).await;

        assert!(matches!(outcome, ClickOutcome::Rendered { seq: 2, .. }));
        assert!(!hung_click.is_finished());
        assert_eq!(controller.active_marker().await.unwrap().marker.position, Coordinate::new(20.0, 20.0));
        hung_click.abort();
    }

    #[tokio::test]
    async fn test_startup_query_shows_raw_json_without_marker() {
        let (source, controller) = controller(SequencingPolicy::LastSettled);
        let startup = Coordinate::new(12.97, 77.59);
        source.gate(startup).send(Ok(reading(12.97, 77.59, 42.0, Some("Good")))).unwrap();

        controller.run_startup_query(startup).await.unwrap();

        let text = controller.display().startup.lock().unwrap().clone().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["pm25"], 42.0);
        assert!(text.contains('\n'));
        assert!(controller.active_marker().await.is_none());
        assert!(controller.display().statuses().is_empty());
    }

    #[tokio::test]
    async fn test_startup_query_failure_is_reported() {
        let (_source, controller) = controller(SequencingPolicy::LastSettled);

        let result = controller.run_startup_query(Coordinate::new(12.97, 77.59)).await;

        assert!(result.unwrap_err().is_query_failure());
        assert!(controller.display().startup.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_applies_view_and_idle_status() {
        let (_source, controller) = controller(SequencingPolicy::LastSettled);

        controller.initialize(&MapView::default()).await;

        assert_eq!(
            controller.inspect_surface(|s| s.view.clone()).await,
            Some(MapView::default())
        );
        assert_eq!(controller.display().statuses(), vec![InfoStatus::Idle]);
    }
}
