use crate::domain::color::{color_for, ColorName};
use crate::domain::model::{AqiReading, Coordinate};
use std::fmt;

pub const DEFAULT_MARKER_RADIUS: f64 = 12.0;
pub const DEFAULT_FILL_OPACITY: f64 = 0.6;
pub const PM25_UNIT: &str = "µg/m³";

/// 地圖底圖視角，由 map surface 在啟動時套用
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
    pub tile_url: String,
    pub max_zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Coordinate::new(28.6448, 77.2167),
            zoom: 10,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_opacity: f64,
    pub color: ColorName,
}

/// 標記半徑與透明度，顏色由讀數類別決定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerDefaults {
    pub radius: f64,
    pub fill_opacity: f64,
}

impl Default for MarkerDefaults {
    fn default() -> Self {
        Self {
            radius: DEFAULT_MARKER_RADIUS,
            fill_opacity: DEFAULT_FILL_OPACITY,
        }
    }
}

impl MarkerDefaults {
    pub fn style_for(&self, reading: &AqiReading) -> MarkerStyle {
        MarkerStyle {
            radius: self.radius,
            fill_opacity: self.fill_opacity,
            color: color_for(reading.aqi_category.as_deref()),
        }
    }
}

/// Popup 的 view-model，數值在這裡先四捨五入，各種 surface 顯示的文字都一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub pm25: String,
    pub unit: &'static str,
    pub category: String,
    pub stubble_pct: String,
    pub traffic_pct: String,
    pub industry_pct: String,
    pub policies: Vec<String>,
}

impl PopupView {
    pub fn from_reading(reading: &AqiReading) -> Self {
        let sources = &reading.source_contribution;
        Self {
            pm25: to_fixed(reading.pm25, 1),
            unit: PM25_UNIT,
            category: reading.category_label().to_string(),
            stubble_pct: percent(sources.stubble_frac),
            traffic_pct: percent(sources.traffic_frac),
            industry_pct: percent(sources.industry_frac),
            policies: reading.policy_recommendations.clone(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("PM2.5: {} {}", self.pm25, self.unit),
            format!("Category: {}", self.category),
            "Sources:".to_string(),
            format!(
                "Stubble {}, Traffic {}, Industry {}",
                self.stubble_pct, self.traffic_pct, self.industry_pct
            ),
        ];
        if !self.policies.is_empty() {
            lines.push("Recommendations:".to_string());
            lines.extend(self.policies.iter().map(|p| format!("- {}", p)));
        }
        lines
    }
}

impl fmt::Display for PopupView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

fn percent(frac: f64) -> String {
    format!("{}%", to_fixed(frac * 100.0, 0))
}

/// 固定小數位數，剛好在中間時遠離零進位（`87.25` -> `87.3`），不是 `{:.N}` 的 ties-to-even
pub fn to_fixed(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    format!("{:.*}", decimals, rounded)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    pub position: Coordinate,
    pub style: MarkerStyle,
    pub popup: PopupView,
}
