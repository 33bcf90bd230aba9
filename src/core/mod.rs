pub mod controller;
pub mod presenter;

pub use crate::domain::model::{AqiReading, Coordinate};
pub use crate::domain::ports::{AqiSource, ConfigProvider, MapSurface, StatusDisplay};
pub use crate::utils::error::Result;
