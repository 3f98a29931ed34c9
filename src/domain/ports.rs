use crate::domain::model::{GenerationRequest, PriceQuery, PriceResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Text (optionally vision) model that answers a prompt with raw text.
///
/// Implementations report a rate-limit or quota refusal as
/// `EnrichError::QuotaExceeded` so callers can tell it apart from other failures.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

/// Live price lookup from a free-text search query.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn scrape(&self, search_query: &str) -> Result<PriceResult>;
}

/// Price estimate for a wine identity when no live source answered.
#[async_trait]
pub trait PriceEstimator: Send + Sync {
    async fn estimate(&self, query: &PriceQuery) -> Result<PriceResult>;
}
