use crate::core::model_output::decode_model_json;
use crate::core::resolver::PriceResolver;
use crate::domain::model::{GenerationRequest, InlineImage, PriceQuery, PriceResult, WineRecord};
use crate::domain::ports::GenerativeModel;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const QUICK_READ_PROMPT: &str = r#"Look at this wine bottle label and extract ONLY what you can clearly READ on the label.
Return ONLY valid JSON (no markdown, no code blocks):

{
  "chateau": "Producer/Chateau/Domaine name from label",
  "wine_name": "Specific wine name if visible and different from chateau, otherwise null",
  "vintage": 2020,
  "color": "red or white or rosé or sparkling or champagne or dessert",
  "region": null,
  "country": null,
  "grape_variety": null,
  "appellation": null
}

CRITICAL RULES:
- ONLY extract chateau/producer name and vintage - these are MOST IMPORTANT
- For color: determine from label design, bottle shape, or wine color if visible
- Set region/country/grape_variety/appellation to null - these will be looked up later
- Do NOT guess or infer information that is not clearly printed on the label
- If vintage is not visible, set to null"#;

const FULL_READ_PROMPT: &str = r#"Analyze this wine bottle label image and extract comprehensive wine information.
Return ONLY valid JSON with these fields (no markdown, no code blocks, just the JSON object):

{
  "chateau": "Producer/Chateau/Winery name",
  "wine_name": "Specific wine name if different from chateau, otherwise null",
  "vintage": 2020,
  "region": "Wine region (e.g., Bordeaux, Burgundy, Napa Valley, Rioja)",
  "appellation": "Specific appellation (e.g., Saint-Émilion Grand Cru, Pauillac)",
  "country": "Country of origin",
  "grape_variety": "Primary grape(s) - if not visible, infer from region",
  "color": "red or white or rosé or sparkling",
  "alcohol_pct": 13.5,
  "winemaker_info": "Brief description of the château/winery (2-3 sentences)",
  "food_pairing": ["grilled lamb", "aged cheese", "beef stew"],
  "tasting_notes": "Expected taste profile - body, tannins, fruit notes, finish",
  "drinking_window": "e.g., 2024-2030 or 'Drink now'",
  "confidence": {
    "chateau": 0.95,
    "vintage": 0.90,
    "region": 0.85
  }
}

IMPORTANT:
- Focus on accuracy for chateau/producer name and vintage year - these are the most critical fields
- For food_pairing: suggest 3-5 specific dishes that pair well
- If a field is not visible AND cannot be inferred, set it to null
- Return ONLY the JSON object, no additional text or formatting"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Producer, name, vintage and colour only; the rest is left for enrichment.
    Quick,
    Full,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfidence {
    pub chateau: Option<f64>,
    pub vintage: Option<f64>,
    pub region: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelDetails {
    #[serde(rename = "chateau")]
    pub producer: Option<String>,
    pub wine_name: Option<String>,
    pub vintage: Option<i32>,
    pub color: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub appellation: Option<String>,
    pub grape_variety: Option<String>,
    pub alcohol_pct: Option<f64>,
    pub winemaker_info: Option<String>,
    pub food_pairing: Option<Vec<String>>,
    pub tasting_notes: Option<String>,
    pub drinking_window: Option<String>,
    pub confidence: Option<FieldConfidence>,
}

impl LabelDetails {
    pub fn producer_name(&self) -> Option<&str> {
        self.producer.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Record ready for a first save; price fields stay empty.
    pub fn to_record(&self, bottle_size: &str) -> Option<WineRecord> {
        let producer = self.producer_name()?;
        Some(WineRecord {
            producer: producer.to_string(),
            wine_name: self.wine_name.clone(),
            vintage: self.vintage,
            color: self.color.clone(),
            region: self.region.clone(),
            country: self.country.clone(),
            appellation: self.appellation.clone(),
            grape_variety: self.grape_variety.clone(),
            tasting_notes: self.tasting_notes.clone(),
            food_pairing: self.food_pairing.clone(),
            drinking_window: self.drinking_window.clone(),
            winemaker_info: self.winemaker_info.clone(),
            bottle_size: Some(bottle_size.to_string()),
            ..WineRecord::default()
        })
    }

    fn keep_label_fields_only(mut self) -> Self {
        self.region = None;
        self.country = None;
        self.appellation = None;
        self.grape_variety = None;
        self.alcohol_pct = None;
        self.winemaker_info = None;
        self.food_pairing = None;
        self.tasting_notes = None;
        self.drinking_window = None;
        self.confidence = None;
        self
    }
}

/// Reads wine labels from photos with a vision-capable model.
pub struct LabelReader {
    model: Arc<dyn GenerativeModel>,
}

impl LabelReader {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Unlike price lookups, read failures propagate: without a label there is nothing to save.
    pub async fn read(&self, image: InlineImage, mode: ReadMode) -> Result<LabelDetails> {
        let prompt = match mode {
            ReadMode::Quick => QUICK_READ_PROMPT,
            ReadMode::Full => FULL_READ_PROMPT,
        };
        tracing::debug!("Reading label ({:?}, {})", mode, image.mime_type);

        let raw = self
            .model
            .generate(GenerationRequest::with_image(prompt, image))
            .await?;
        let details: LabelDetails = decode_model_json(&raw)?;

        Ok(match mode {
            ReadMode::Quick => details.keep_label_fields_only(),
            ReadMode::Full => details,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub wine: LabelDetails,
    pub price: Option<PriceResult>,
    pub quota_exceeded: bool,
}

/// Full label read followed by a price lookup when a producer was read.
pub struct LabelScanner {
    reader: LabelReader,
    resolver: Arc<PriceResolver>,
}

impl LabelScanner {
    pub fn new(model: Arc<dyn GenerativeModel>, resolver: Arc<PriceResolver>) -> Self {
        Self {
            reader: LabelReader::new(model),
            resolver,
        }
    }

    pub async fn scan(&self, image: InlineImage, bottle_size: &str) -> Result<ScanOutcome> {
        let wine = self.reader.read(image, ReadMode::Full).await?;

        let Some(producer) = wine.producer_name() else {
            tracing::info!("No producer read from label, skipping price lookup");
            return Ok(ScanOutcome {
                wine,
                price: None,
                quota_exceeded: false,
            });
        };

        let query = PriceQuery::new(producer)
            .with_vintage(wine.vintage)
            .with_region(wine.region.clone())
            .with_bottle_size(bottle_size);
        let resolution = self.resolver.resolve_detailed(&query).await?;

        Ok(ScanOutcome {
            wine,
            price: Some(resolution.result),
            quota_exceeded: resolution.quota_exceeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::BottleSizeCatalog;
    use crate::domain::ports::{PriceEstimator, PriceSource};
    use crate::utils::error::EnrichError;
    use async_trait::async_trait;

    struct VisionModel {
        reply: Result<String>,
    }

    impl VisionModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
            })
        }
    }

    #[async_trait]
    impl GenerativeModel for VisionModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            assert!(request.image.is_some(), "label reads must carry the image");
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(EnrichError::QuotaExceeded {
                    message: "429".to_string(),
                }),
            }
        }
    }

    struct FixedSource;

    #[async_trait]
    impl PriceSource for FixedSource {
        async fn scrape(&self, search_query: &str) -> Result<PriceResult> {
            assert_eq!(search_query, "Château Palmer 2016 Bordeaux");
            Ok(PriceResult::scraped(280.0, 320.0, 300.0, "EUR"))
        }
    }

    struct NoEstimate;

    #[async_trait]
    impl PriceEstimator for NoEstimate {
        async fn estimate(&self, _query: &PriceQuery) -> Result<PriceResult> {
            Ok(PriceResult::empty("EUR"))
        }
    }

    fn image() -> InlineImage {
        InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: "aGVsbG8=".to_string(),
        }
    }

    fn resolver() -> Arc<PriceResolver> {
        Arc::new(PriceResolver::new(
            Arc::new(FixedSource),
            Arc::new(NoEstimate),
            Arc::new(BottleSizeCatalog::builtin()),
        ))
    }

    const FULL: &str = r#"{"chateau": "Château Palmer", "vintage": 2016, "region": "Bordeaux",
        "appellation": "Margaux", "color": "red", "alcohol_pct": 13.5,
        "food_pairing": ["duck"], "confidence": {"chateau": 0.97, "vintage": 0.9, "region": 0.8}}"#;

    #[tokio::test]
    async fn test_quick_read_drops_inferred_fields() {
        let reader = LabelReader::new(VisionModel::replying(FULL));
        let details = reader.read(image(), ReadMode::Quick).await.unwrap();

        assert_eq!(details.producer_name(), Some("Château Palmer"));
        assert_eq!(details.vintage, Some(2016));
        assert_eq!(details.color.as_deref(), Some("red"));
        assert_eq!(details.region, None);
        assert_eq!(details.food_pairing, None);
    }

    #[tokio::test]
    async fn test_full_read_keeps_everything() {
        let reader = LabelReader::new(VisionModel::replying(FULL));
        let details = reader.read(image(), ReadMode::Full).await.unwrap();

        assert_eq!(details.appellation.as_deref(), Some("Margaux"));
        assert_eq!(details.alcohol_pct, Some(13.5));
        assert_eq!(details.confidence.unwrap().chateau, Some(0.97));
    }

    #[tokio::test]
    async fn test_unreadable_answer_is_an_error() {
        let reader = LabelReader::new(VisionModel::replying("I see a bottle."));
        let err = reader.read(image(), ReadMode::Full).await.unwrap_err();
        assert!(matches!(err, EnrichError::ModelResponse { .. }));
    }

    #[tokio::test]
    async fn test_quota_error_propagates() {
        let reader = LabelReader::new(Arc::new(VisionModel {
            reply: Err(EnrichError::QuotaExceeded {
                message: "429".to_string(),
            }),
        }));
        let err = reader.read(image(), ReadMode::Quick).await.unwrap_err();
        assert!(err.is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_scan_prices_the_read_wine() {
        let scanner = LabelScanner::new(VisionModel::replying(FULL), resolver());
        let outcome = scanner.scan(image(), "standard").await.unwrap();

        assert_eq!(outcome.price.unwrap().price_avg, Some(300.0));
        assert!(!outcome.quota_exceeded);

        let record = outcome.wine.to_record("standard").unwrap();
        assert_eq!(record.producer, "Château Palmer");
        assert_eq!(record.price_avg, None);
    }

    #[tokio::test]
    async fn test_scan_without_producer_skips_pricing() {
        let scanner = LabelScanner::new(VisionModel::replying(r#"{"chateau": null}"#), resolver());
        let outcome = scanner.scan(image(), "standard").await.unwrap();
        assert!(outcome.price.is_none());
        assert!(outcome.wine.to_record("standard").is_none());
    }
}
