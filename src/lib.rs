pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::console::{ConsoleDisplay, ConsoleMapSurface};
pub use adapters::http::AqiQueryClient;
pub use config::MapConfig;
pub use self::core::{
    controller::{ClickOutcome, MapInteractionController},
    presenter::MarkerPresenter,
};
pub use domain::color::{color_for, ColorName};
pub use domain::model::{AqiReading, Coordinate, InfoStatus, SequencingPolicy, SourceContribution};
pub use utils::error::{MapError, Result};
