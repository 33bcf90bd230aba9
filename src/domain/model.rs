use crate::domain::map::to_fixed;
use crate::utils::error::{MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// 接受 `lat,lon` 或 `lat lon`
impl FromStr for Coordinate {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(MapError::ValidationError {
                message: format!("expected `lat,lon`, got `{}`", s.trim()),
            });
        }

        let parse = |name: &str, raw: &str| -> Result<f64> {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MapError::ValidationError {
                    message: format!("{} `{}` is not a finite number", name, raw),
                })
        };

        Ok(Self::new(parse("lat", parts[0])?, parse("lon", parts[1])?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceContribution {
    #[serde(default)]
    pub stubble_frac: f64,
    #[serde(default)]
    pub traffic_frac: f64,
    #[serde(default)]
    pub industry_frac: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiReading {
    pub lat: f64,
    pub lon: f64,
    pub pm25: f64,
    #[serde(default)]
    pub aqi_category: Option<String>,
    #[serde(default)]
    pub source_contribution: SourceContribution,
    #[serde(default)]
    pub policy_recommendations: Vec<String>,
}

pub const UNKNOWN_CATEGORY: &str = "Unknown";

impl AqiReading {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn category_label(&self) -> &str {
        self.aqi_category.as_deref().unwrap_or(UNKNOWN_CATEGORY)
    }

    /// 從後端 JSON 解析讀數。
    ///
    /// `lat`、`lon`、`pm25` 缺少或不是數字時整筆查詢失敗；
    /// `aqi_category` 與來源比例則降級為 `None` / `0.0`。
    pub fn from_json(body: &Value) -> Result<Self> {
        let obj = body.as_object().ok_or_else(|| MapError::MalformedReading {
            field: "body".to_string(),
            reason: format!("expected a JSON object, got {}", json_kind(body)),
        })?;

        let required_number = |field: &str| -> Result<f64> {
            match obj.get(field) {
                Some(v) => v.as_f64().ok_or_else(|| MapError::MalformedReading {
                    field: field.to_string(),
                    reason: format!("expected a number, got {}", json_kind(v)),
                }),
                None => Err(MapError::MalformedReading {
                    field: field.to_string(),
                    reason: "field is missing".to_string(),
                }),
            }
        };

        let lat = required_number("lat")?;
        let lon = required_number("lon")?;
        let pm25 = required_number("pm25")?;

        let aqi_category = obj
            .get("aqi_category")
            .and_then(Value::as_str)
            .map(str::to_string);
        if aqi_category.is_none() {
            tracing::debug!("Reading at {:.4},{:.4} has no aqi_category", lat, lon);
        }

        let sources = obj.get("source_contribution");
        let fraction = |name: &str| -> f64 {
            match sources.and_then(|s| s.get(name)).and_then(Value::as_f64) {
                Some(v) => v,
                None => {
                    tracing::debug!("source_contribution.{} missing, defaulting to 0", name);
                    0.0
                }
            }
        };
        let source_contribution = SourceContribution {
            stubble_frac: fraction("stubble_frac"),
            traffic_frac: fraction("traffic_frac"),
            industry_frac: fraction("industry_frac"),
        };

        let policy_recommendations = obj
            .get("policy_recommendations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            lat,
            lon,
            pm25,
            aqi_category,
            source_contribution,
            policy_recommendations,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `/forecast` 回傳的單一小時預測
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: chrono::NaiveDateTime,
    pub pm25: f64,
    #[serde(default)]
    pub aqi_category: Option<String>,
    #[serde(default)]
    pub source_contribution: SourceContribution,
    #[serde(default)]
    pub policy_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ForecastResponse {
    pub forecasts: Vec<ForecastPoint>,
}

/// 多個點擊同時進行時，如何處理較早送出卻較晚回來的結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencingPolicy {
    /// 每個回應都套用，最後回來的贏
    #[default]
    LastSettled,
    /// 序號低於已結算最大序號的回應直接丟棄
    DiscardStale,
}

pub const QUERY_ERROR_MESSAGE: &str =
    "Error fetching AQI. Ensure the backend is running and reachable (CORS allowed).";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum InfoStatus {
    #[default]
    Idle,
    Querying,
    Success(String),
    Error(String),
}

impl InfoStatus {
    pub fn success_for(reading: &AqiReading) -> Self {
        InfoStatus::Success(format!(
            "Nearest station: {},{} — PM2.5 {} µg/m³",
            to_fixed(reading.lat, 4),
            to_fixed(reading.lon, 4),
            to_fixed(reading.pm25, 1)
        ))
    }

    pub fn query_failed() -> Self {
        InfoStatus::Error(QUERY_ERROR_MESSAGE.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            InfoStatus::Idle => "Click on the map to query air quality.",
            InfoStatus::Querying => "Querying AQI...",
            InfoStatus::Success(summary) => summary,
            InfoStatus::Error(message) => message,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, InfoStatus::Success(_) | InfoStatus::Error(_))
    }
}

impl fmt::Display for InfoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
