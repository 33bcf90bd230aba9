use crate::domain::model::Coordinate;
use crate::utils::error::{MapError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(MapError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MapError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(MapError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// 瓦片 URL 帶有 `{z}/{x}/{y}` 佔位符，不能直接交給 `Url::parse` 驗證
pub fn validate_tile_template(field_name: &str, template: &str) -> Result<()> {
    validate_non_empty_string(field_name, template)?;
    for placeholder in ["{z}", "{x}", "{y}"] {
        if !template.contains(placeholder) {
            return Err(MapError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: template.to_string(),
                reason: format!("Tile URL template is missing {}", placeholder),
            });
        }
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(MapError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MapError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(value >= min && value <= max) {
        return Err(MapError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_coordinate(field_name: &str, coord: &Coordinate) -> Result<()> {
    validate_range(&format!("{}.lat", field_name), coord.lat, -90.0, 90.0)?;
    validate_range(&format!("{}.lon", field_name), coord.lon, -180.0, 180.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("backend.url", "https://example.com").is_ok());
        assert!(validate_url("backend.url", "http://localhost:8000").is_ok());
        assert!(validate_url("backend.url", "").is_err());
        assert!(validate_url("backend.url", "invalid-url").is_err());
        assert!(validate_url("backend.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_tile_template() {
        assert!(validate_tile_template(
            "map.tile_url",
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"
        )
        .is_ok());
        assert!(validate_tile_template("map.tile_url", "https://tiles.example.com/{z}.png").is_err());
        assert!(validate_tile_template("map.tile_url", "  ").is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("marker.fill_opacity", 0.6, 0.0, 1.0).is_ok());
        assert!(validate_range("marker.fill_opacity", 1.5, 0.0, 1.0).is_err());
        assert!(validate_range("marker.fill_opacity", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_coordinate() {
        assert!(validate_coordinate("click", &Coordinate::new(28.6448, 77.2167)).is_ok());
        assert!(validate_coordinate("click", &Coordinate::new(91.0, 0.0)).is_err());
        assert!(validate_coordinate("click", &Coordinate::new(0.0, -180.5)).is_err());
    }
}
