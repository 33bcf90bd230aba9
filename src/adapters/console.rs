use crate::core::{MapSurface, StatusDisplay};
use crate::domain::map::{CircleMarker, MapView, MarkerId};
use crate::domain::model::InfoStatus;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// 輸出目的地，預設 stdout；測試時可換成記憶體 buffer
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

pub fn stdout_writer() -> SharedWriter {
    Arc::new(Mutex::new(std::io::stdout()))
}

fn emit(out: &SharedWriter, text: &str) {
    match out.lock() {
        Ok(mut w) => {
            if let Err(e) = writeln!(w, "{}", text).and_then(|_| w.flush()) {
                tracing::warn!("Failed to write to console: {}", e);
            }
        }
        Err(_) => tracing::warn!("Console writer lock poisoned, dropping output"),
    }
}

/// 終端機上的地圖：標記的新增、移除、popup 都以文字列出
pub struct ConsoleMapSurface {
    out: SharedWriter,
    next_id: u64,
}

impl ConsoleMapSurface {
    pub fn new(out: SharedWriter) -> Self {
        Self { out, next_id: 0 }
    }
}

impl MapSurface for ConsoleMapSurface {
    fn show_view(&mut self, view: &MapView) {
        emit(
            &self.out,
            &format!(
                "[map] center {} zoom {} (max {}) tiles {}",
                view.center, view.zoom, view.max_zoom, view.tile_url
            ),
        );
    }

    fn add_marker(&mut self, marker: &CircleMarker) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        emit(
            &self.out,
            &format!(
                "[map] + {} at {} color={} radius={} fill_opacity={}",
                id, marker.position, marker.style.color, marker.style.radius, marker.style.fill_opacity
            ),
        );
        let popup = marker
            .popup
            .lines()
            .into_iter()
            .map(|line| format!("[popup {}] {}", id, line))
            .collect::<Vec<_>>()
            .join("\n");
        emit(&self.out, &popup);
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        emit(&self.out, &format!("[map] - {}", id));
    }

    fn open_popup(&mut self, id: MarkerId) {
        emit(&self.out, &format!("[map] popup opened on {}", id));
    }
}

pub struct ConsoleDisplay {
    out: SharedWriter,
}

impl ConsoleDisplay {
    pub fn new(out: SharedWriter) -> Self {
        Self { out }
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn show_startup_result(&self, text: &str) {
        emit(&self.out, &format!("[result]\n{}", text));
    }

    fn show_status(&self, status: &InfoStatus) {
        emit(&self.out, &format!("[info] {}", status));
    }
}
