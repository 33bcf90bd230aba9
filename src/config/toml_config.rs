use crate::adapters::http::DEFAULT_BACKEND_URL;
use crate::core::{ConfigProvider, Coordinate};
use crate::domain::map::{MapView, MarkerDefaults, DEFAULT_FILL_OPACITY, DEFAULT_MARKER_RADIUS};
use crate::domain::model::SequencingPolicy;
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub backend: BackendConfig,
    pub map: MapSection,
    pub startup: StartupConfig,
    pub marker: MarkerConfig,
    pub controller: ControllerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    /// 預設不設逾時，卡住的查詢會一直停在 querying
    pub timeout_seconds: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSection {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub tile_url: String,
    pub max_zoom: u8,
}

impl Default for MapSection {
    fn default() -> Self {
        let view = MapView::default();
        Self {
            center_lat: view.center.lat,
            center_lon: view.center.lon,
            zoom: view.zoom,
            tile_url: view.tile_url,
            max_zoom: view.max_zoom,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub lat: f64,
    pub lon: f64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self { lat: 12.97, lon: 77.59 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub radius: f64,
    pub fill_opacity: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_MARKER_RADIUS,
            fill_opacity: DEFAULT_FILL_OPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub sequencing: SequencingPolicy,
}

impl MapConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AQI_BACKEND_URL})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MapError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("backend.url", &self.backend.url)?;

        if let Some(timeout) = self.backend.timeout_seconds {
            validation::validate_positive_number("backend.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_coordinate("map.center", &self.map_view().center)?;
        validation::validate_range("map.max_zoom", self.map.max_zoom, 0, 22)?;
        validation::validate_range("map.zoom", self.map.zoom, 0, self.map.max_zoom)?;
        validation::validate_tile_template("map.tile_url", &self.map.tile_url)?;

        validation::validate_coordinate("startup", &self.startup_coordinate())?;

        validation::validate_range("marker.radius", self.marker.radius, 1.0, 100.0)?;
        validation::validate_range("marker.fill_opacity", self.marker.fill_opacity, 0.0, 1.0)?;

        Ok(())
    }
}

impl ConfigProvider for MapConfig {
    fn backend_url(&self) -> &str {
        &self.backend.url
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.backend.timeout_seconds.map(Duration::from_secs)
    }

    fn startup_coordinate(&self) -> Coordinate {
        Coordinate::new(self.startup.lat, self.startup.lon)
    }

    fn map_view(&self) -> MapView {
        MapView {
            center: Coordinate::new(self.map.center_lat, self.map.center_lon),
            zoom: self.map.zoom,
            tile_url: self.map.tile_url.clone(),
            max_zoom: self.map.max_zoom,
        }
    }

    fn marker_defaults(&self) -> MarkerDefaults {
        MarkerDefaults {
            radius: self.marker.radius,
            fill_opacity: self.marker.fill_opacity,
        }
    }

    fn sequencing(&self) -> SequencingPolicy {
        self.controller.sequencing
    }
}

impl Validate for MapConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
