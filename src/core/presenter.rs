use crate::core::{AqiReading, MapSurface};
use crate::domain::map::{CircleMarker, MarkerDefaults, MarkerId, PopupView};

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMarker {
    pub id: MarkerId,
    pub marker: CircleMarker,
}

/// 地圖上唯一的標記由這裡擁有：新讀數進來時先移除舊標記，再放上新的
pub struct MarkerPresenter<M: MapSurface> {
    surface: M,
    defaults: MarkerDefaults,
    active: Option<ActiveMarker>,
}

impl<M: MapSurface> MarkerPresenter<M> {
    pub fn new(surface: M, defaults: MarkerDefaults) -> Self {
        Self {
            surface,
            defaults,
            active: None,
        }
    }

    pub fn present(&mut self, reading: &AqiReading) -> MarkerId {
        if let Some(previous) = self.active.take() {
            tracing::debug!("Removing previous {}", previous.id);
            self.surface.remove_marker(previous.id);
        }

        // 使用讀數本身的座標，不是點擊的座標
        let marker = CircleMarker {
            position: reading.position(),
            style: self.defaults.style_for(reading),
            popup: PopupView::from_reading(reading),
        };

        let id = self.surface.add_marker(&marker);
        self.surface.open_popup(id);
        tracing::debug!(
            "Placed {} at {} ({}, PM2.5 {})",
            id,
            marker.position,
            marker.style.color,
            marker.popup.pm25
        );

        self.active = Some(ActiveMarker { id, marker });
        id
    }

    pub fn active(&self) -> Option<&ActiveMarker> {
        self.active.as_ref()
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }
}
