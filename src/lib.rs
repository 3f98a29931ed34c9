pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::gemini::{GeminiClient, GeminiSettings};
pub use crate::config::AppConfig;
pub use crate::core::catalog::BottleSizeCatalog;
pub use crate::core::enrichment::{EnrichmentReport, WineEnricher};
pub use crate::core::estimator::KnowledgeEstimator;
pub use crate::core::label::{LabelReader, LabelScanner, ReadMode};
pub use crate::core::marketplace::{MarketplaceScraper, MarketplaceSettings};
pub use crate::core::pairing::PairingAdvisor;
pub use crate::core::resolver::{PriceResolution, PriceResolver};
pub use crate::domain::model::{PriceQuery, PriceResult, UpdateSet, WineRecord};
pub use crate::utils::error::{EnrichError, Result};
