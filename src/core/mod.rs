pub mod directory;
pub mod gateway;
pub mod tips;

pub use crate::domain::model::{AnalysisResult, PractitionerRecord};
pub use crate::domain::ports::{AnalysisProvider, ConfigProvider, ProviderRequest};
pub use crate::utils::error::Result;
pub use directory::DirectoryStore;
pub use gateway::AnalysisGateway;
pub use tips::TipProvider;
