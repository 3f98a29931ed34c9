use crate::core::catalog::BottleSizeCatalog;
use crate::core::query::search_query_for;
use crate::domain::model::{PriceQuery, PriceResult, DEFAULT_CURRENCY};
use crate::domain::ports::{PriceEstimator, PriceSource};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use serde::Serialize;
use std::sync::Arc;

/// Price plus whether the generative layer was refused for quota reasons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceResolution {
    pub result: PriceResult,
    pub quota_exceeded: bool,
}

/// Tries the live source first, then the generative estimate, each at most once.
pub struct PriceResolver {
    source: Arc<dyn PriceSource>,
    estimator: Arc<dyn PriceEstimator>,
    catalog: Arc<BottleSizeCatalog>,
    currency: String,
}

impl PriceResolver {
    pub fn new(
        source: Arc<dyn PriceSource>,
        estimator: Arc<dyn PriceEstimator>,
        catalog: Arc<BottleSizeCatalog>,
    ) -> Self {
        Self {
            source,
            estimator,
            catalog,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Never fails for "nothing found"; only an invalid query is an error.
    pub async fn resolve(&self, query: &PriceQuery) -> Result<PriceResult> {
        Ok(self.resolve_detailed(query).await?.result)
    }

    pub async fn resolve_detailed(&self, query: &PriceQuery) -> Result<PriceResolution> {
        query.validate()?;

        let search_query = search_query_for(&self.catalog, query);
        tracing::debug!("Resolving price for '{}'", search_query);

        match self.source.scrape(&search_query).await {
            Ok(result) if result.has_price() => {
                tracing::info!(
                    "Marketplace price for '{}': avg {:?}",
                    search_query,
                    result.price_avg
                );
                return Ok(PriceResolution {
                    result,
                    quota_exceeded: false,
                });
            }
            Ok(_) => tracing::info!("No marketplace price for '{}', trying estimate", search_query),
            Err(e) => tracing::warn!(
                "Marketplace scraping failed for '{}', trying estimate: {}",
                search_query,
                e
            ),
        }

        let mut quota_exceeded = false;
        match self.estimator.estimate(query).await {
            Ok(result) if result.has_price() => {
                tracing::info!(
                    "Estimated price for '{}': avg {:?} ({:?} confidence)",
                    search_query,
                    result.price_avg,
                    result.confidence
                );
                return Ok(PriceResolution {
                    result,
                    quota_exceeded,
                });
            }
            Ok(_) => tracing::info!("No usable estimate for '{}'", search_query),
            Err(e) => {
                quota_exceeded = e.is_quota_exceeded();
                tracing::warn!("Price estimation failed for '{}': {}", search_query, e);
            }
        }

        Ok(PriceResolution {
            result: PriceResult::empty(&self.currency),
            quota_exceeded,
        })
    }
}
