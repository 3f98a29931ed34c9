use crate::core::catalog::BottleSizeCatalog;
use crate::core::model_output::decode_model_json;
use crate::domain::model::{
    BottleSizeDescriptor, Confidence, GenerationRequest, PriceQuery, PriceResult, DEFAULT_CURRENCY,
};
use crate::domain::ports::{GenerativeModel, PriceEstimator};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Shape the model is asked to answer with. `confidence` is mandatory, so an
/// answer without a self-assessment never passes decoding.
#[derive(Debug, Deserialize)]
struct EstimateResponse {
    price_min: Option<f64>,
    price_max: Option<f64>,
    price_avg: Option<f64>,
    confidence: Confidence,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Asks a generative model for a price from its own knowledge.
pub struct KnowledgeEstimator {
    model: Arc<dyn GenerativeModel>,
    catalog: Arc<BottleSizeCatalog>,
    currency: String,
}

impl KnowledgeEstimator {
    pub fn new(model: Arc<dyn GenerativeModel>, catalog: Arc<BottleSizeCatalog>) -> Self {
        Self {
            model,
            catalog,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn build_prompt(&self, query: &PriceQuery) -> String {
        let mut description = vec![query.producer_name.trim().to_string()];
        if let Some(vintage) = query.vintage_year {
            description.push(format!("vintage {}", vintage));
        }
        if let Some(region) = query.region_name.as_deref().filter(|r| !r.trim().is_empty()) {
            description.push(format!("from {}", region.trim()));
        }

        let size_note = match self.catalog.lookup(&query.bottle_size_id) {
            Some(size) if !size.is_standard() => bottle_size_instruction(size),
            Some(_) => String::new(),
            None => {
                tracing::warn!(
                    "Unknown bottle size '{}', estimating for a standard bottle",
                    query.bottle_size_id
                );
                String::new()
            }
        };

        format!(
            r#"You are a wine expert. Estimate the retail price in {currency} for this wine:
{description}
{size_note}
Based on your knowledge of wine prices, provide a realistic price estimate.
Consider the producer's reputation, the region, the vintage quality, and typical market prices.

Return ONLY valid JSON (no markdown, no code blocks, just the JSON object):
{{
  "price_min": 15.99,
  "price_max": 25.99,
  "price_avg": 19.99,
  "confidence": "medium",
  "reasoning": "Brief explanation"
}}

The confidence must be one of "high", "medium" or "low".
If you don't know this wine well enough to estimate, return:
{{
  "price_min": null,
  "price_max": null,
  "price_avg": null,
  "confidence": "low",
  "reasoning": "Unknown wine"
}}"#,
            currency = self.currency,
            description = description.join(", "),
            size_note = size_note,
        )
    }

    /// Applies the confidence gate to a decoded answer.
    fn accept(&self, response: EstimateResponse) -> PriceResult {
        let Some(avg) = response.price_avg.filter(|v| v.is_finite() && *v > 0.0) else {
            tracing::info!("Model gave no usable average price");
            return PriceResult::empty(&self.currency);
        };

        if response.confidence == Confidence::Low {
            tracing::info!(
                "Suppressing low-confidence estimate of {} ({})",
                avg,
                response.reasoning.as_deref().unwrap_or("no reasoning")
            );
            return PriceResult::empty(&self.currency);
        }

        let below = response.price_min.is_some_and(|min| !(min > 0.0 && min <= avg));
        let above = response.price_max.is_some_and(|max| !(max >= avg));
        if below || above {
            tracing::warn!(
                "Rejecting inconsistent estimate min={:?} avg={} max={:?}",
                response.price_min,
                avg,
                response.price_max
            );
            return PriceResult::empty(&self.currency);
        }

        PriceResult::estimated(
            response.price_min,
            response.price_max,
            avg,
            response.confidence,
            &self.currency,
        )
    }
}

fn bottle_size_instruction(size: &BottleSizeDescriptor) -> String {
    format!(
        "\nIMPORTANT: This is a {name} bottle ({volume}), equivalent to {equivalent} standard 750ml bottles.\n\
         Large-format bottles typically command a 2-3x per-liter premium over standard bottles because of their rarity and aging potential.\n\
         Adjust your estimate accordingly and quote the price of one {name} bottle, not of a standard bottle.\n",
        name = size.display_name,
        volume = size.volume_label,
        equivalent = size.standard_bottle_equivalent,
    )
}

#[async_trait]
impl PriceEstimator for KnowledgeEstimator {
    async fn estimate(&self, query: &PriceQuery) -> Result<PriceResult> {
        let prompt = self.build_prompt(query);
        let raw = self.model.generate(GenerationRequest::text(prompt)).await?;

        match decode_model_json::<EstimateResponse>(&raw) {
            Ok(response) => Ok(self.accept(response)),
            Err(e) => {
                tracing::warn!("Discarding undecodable price estimate: {}", e);
                Ok(PriceResult::empty(&self.currency))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PriceSourceTag;
    use crate::utils::error::EnrichError;
    use std::sync::Mutex;

    struct CannedModel {
        reply: std::result::Result<String, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl GenerativeModel for CannedModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(429) => Err(EnrichError::QuotaExceeded {
                    message: "quota".to_string(),
                }),
                Err(status) => Err(EnrichError::ModelApi {
                    status: *status,
                    message: "failure".to_string(),
                }),
            }
        }
    }

    fn estimator(model: Arc<CannedModel>) -> KnowledgeEstimator {
        KnowledgeEstimator::new(model, Arc::new(BottleSizeCatalog::builtin()))
    }

    fn margaux() -> PriceQuery {
        PriceQuery::new("Château Margaux")
            .with_vintage(Some(2015))
            .with_region(Some("Bordeaux"))
    }

    #[tokio::test]
    async fn test_accepts_medium_confidence() {
        let model = CannedModel::replying(
            r#"{"price_min": 600, "price_max": 900, "price_avg": 750, "confidence": "medium", "reasoning": "First growth"}"#,
        );
        let result = estimator(model).estimate(&margaux()).await.unwrap();

        assert_eq!(result.price_avg, Some(750.0));
        assert_eq!(result.price_min, Some(600.0));
        assert_eq!(result.price_max, Some(900.0));
        assert_eq!(result.source, Some(PriceSourceTag::GenerativeEstimate));
        assert_eq!(result.confidence, Some(Confidence::Medium));
        assert_eq!(result.currency, "EUR");
    }

    #[tokio::test]
    async fn test_low_confidence_with_price_is_suppressed() {
        let model = CannedModel::replying(
            r#"{"price_min": 10, "price_max": 30, "price_avg": 20, "confidence": "low", "reasoning": "Guess"}"#,
        );
        let result = estimator(model).estimate(&margaux()).await.unwrap();
        assert_eq!(result, PriceResult::empty("EUR"));
    }

    #[tokio::test]
    async fn test_unknown_wine_answer_is_empty() {
        let model = CannedModel::replying(
            r#"{"price_min":null,"price_max":null,"price_avg":null,"confidence":"low","reasoning":"Unknown wine"}"#,
        );
        let result = estimator(model).estimate(&margaux()).await.unwrap();
        assert_eq!(result, PriceResult::empty("EUR"));
        assert_eq!(result.source, None);
    }

    #[tokio::test]
    async fn test_fenced_answer_is_decoded() {
        let model = CannedModel::replying(
            "```json\n{\"price_min\": 40, \"price_max\": 60, \"price_avg\": 50, \"confidence\": \"high\", \"reasoning\": \"ok\"}\n```",
        );
        let result = estimator(model).estimate(&margaux()).await.unwrap();
        assert_eq!(result.price_avg, Some(50.0));
        assert_eq!(result.confidence, Some(Confidence::High));
    }

    #[tokio::test]
    async fn test_malformed_or_inconsistent_answers_are_empty() {
        for reply in [
            "Sorry, I cannot help with that.",
            r#"{"price_avg": 50, "reasoning": "no confidence given"}"#,
            r#"{"price_avg": "fifty", "confidence": "high"}"#,
            r#"{"price_min": 80, "price_max": 90, "price_avg": 50, "confidence": "high"}"#,
            r#"{"price_avg": -5, "confidence": "high"}"#,
        ] {
            let result = estimator(CannedModel::replying(reply))
                .estimate(&margaux())
                .await
                .unwrap();
            assert!(!result.has_price(), "accepted: {}", reply);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let err = estimator(CannedModel::failing(429))
            .estimate(&margaux())
            .await
            .unwrap_err();
        assert!(err.is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_prompt_mentions_large_format() {
        let model = CannedModel::replying(r#"{"price_avg": null, "confidence": "low"}"#);
        let estimator = estimator(model.clone());
        estimator
            .estimate(&margaux().with_bottle_size("magnum"))
            .await
            .unwrap();

        let prompt = model.last_prompt();
        assert!(prompt.contains("Château Margaux, vintage 2015, from Bordeaux"));
        assert!(prompt.contains("Magnum bottle (1.5L)"));
        assert!(prompt.contains("equivalent to 2 standard"));
        assert!(prompt.contains("2-3x per-liter premium"));
    }

    #[test]
    fn test_standard_prompt_has_no_size_note() {
        let estimator = estimator(CannedModel::replying("{}"));
        let prompt = estimator.build_prompt(&margaux());
        assert!(!prompt.contains("per-liter premium"));
        assert!(prompt.contains("\"confidence\": \"low\""));
    }
}
