/// Application settings loaded from config.toml and the environment
pub mod app;

/// Database connection and table creation
pub mod database;

pub use app::{AppConfig, ExportConfig, GateConfig, StoreConfig, load_app_configuration};
