use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("AQI request failed: {0}")]
    Query(#[from] reqwest::Error),

    #[error("Backend responded with status {status}: {detail}")]
    BackendStatus { status: u16, detail: String },

    #[error("Malformed AQI reading, field `{field}`: {reason}")]
    MalformedReading { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for `{field}`: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value `{value}` for `{field}`: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::Query(_) | MapError::BackendStatus { .. } => ErrorCategory::Network,
            MapError::MalformedReading { .. }
            | MapError::Serialization(_)
            | MapError::ValidationError { .. } => ErrorCategory::Data,
            MapError::Url(_)
            | MapError::ConfigError { .. }
            | MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MapError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 查詢失敗（網路、後端狀態或資料格式錯誤），由 controller 在單次點擊內吸收
    pub fn is_query_failure(&self) -> bool {
        matches!(
            self,
            MapError::Query(_) | MapError::BackendStatus { .. } | MapError::MalformedReading { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MapError::Query(e) if e.is_connect() => {
                "Ensure the AQI backend is running and reachable (check --backend-url)".to_string()
            }
            MapError::Query(e) if e.is_timeout() => {
                "The backend did not answer in time; raise backend.timeout_seconds or retry".to_string()
            }
            MapError::Query(_) => "Check network connectivity to the AQI backend".to_string(),
            MapError::BackendStatus { status: 404, .. } => {
                "No observations on the backend yet; run `aqi-map ingest` first".to_string()
            }
            MapError::BackendStatus { status, .. } if *status >= 500 => {
                "The backend failed internally; check the backend logs".to_string()
            }
            MapError::BackendStatus { .. } => "Check the request parameters".to_string(),
            MapError::MalformedReading { .. } | MapError::Serialization(_) => {
                "The backend response does not match the expected AQI format".to_string()
            }
            MapError::Io(_) => "Check file permissions and paths".to_string(),
            MapError::Url(_) => "Use an absolute http(s) URL for the backend".to_string(),
            MapError::ConfigError { .. }
            | MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            MapError::ValidationError { .. } => {
                "Coordinates must be `lat,lon` with lat in [-90, 90] and lon in [-180, 180]"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch AQI data: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
