pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::ServerConfig;
pub use config::TomlConfig;

pub use adapters::GeminiClient;
pub use api::{build_router, AppState, RouterOptions};
pub use crate::core::{AnalysisGateway, DirectoryStore, TipProvider};
pub use domain::model::{AnalysisResult, PractitionerRecord};
pub use utils::error::{AdvisorError, Result};
