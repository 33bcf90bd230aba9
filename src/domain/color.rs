use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorName {
    Green,
    Orange,
    Red,
    Purple,
    Maroon,
    Gray,
}

impl ColorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::Green => "green",
            ColorName::Orange => "orange",
            ColorName::Red => "red",
            ColorName::Purple => "purple",
            ColorName::Maroon => "maroon",
            ColorName::Gray => "gray",
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AQI 類別對應的標記顏色，大小寫敏感，未知類別一律灰色
pub fn color_for(category: Option<&str>) -> ColorName {
    match category {
        Some("Good") => ColorName::Green,
        Some("Moderate") => ColorName::Orange,
        Some("Unhealthy") => ColorName::Red,
        Some("Very Unhealthy") => ColorName::Purple,
        Some("Hazardous") => ColorName::Maroon,
        _ => ColorName::Gray,
    }
}
