pub mod adapters;
pub mod analysis;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use analysis::{analyze, AnalysisOptions, ShipmentReport};
pub use core::{
    etl::{ReportEngine, RunOutput},
    pipeline::ShipmentPipeline,
};
pub use utils::error::{InsightError, Result};
