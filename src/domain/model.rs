use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CURRENCY: &str = "EUR";
pub const STANDARD_BOTTLE_ID: &str = "standard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleSizeDescriptor {
    pub id: String,
    pub display_name: String,
    pub volume_label: String,
    pub volume_ml: f64,
    pub standard_bottle_equivalent: f64,
    pub description: String,
}

impl BottleSizeDescriptor {
    pub fn is_standard(&self) -> bool {
        self.id == STANDARD_BOTTLE_ID
    }
}

/// Identity of a wine for price resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub producer_name: String,
    pub vintage_year: Option<i32>,
    pub region_name: Option<String>,
    pub bottle_size_id: String,
}

impl PriceQuery {
    pub fn new(producer_name: impl Into<String>) -> Self {
        Self {
            producer_name: producer_name.into(),
            vintage_year: None,
            region_name: None,
            bottle_size_id: STANDARD_BOTTLE_ID.to_string(),
        }
    }

    pub fn with_vintage(mut self, vintage_year: Option<i32>) -> Self {
        self.vintage_year = vintage_year;
        self
    }

    pub fn with_region(mut self, region_name: Option<impl Into<String>>) -> Self {
        self.region_name = region_name.map(Into::into);
        self
    }

    pub fn with_bottle_size(mut self, bottle_size_id: impl Into<String>) -> Self {
        self.bottle_size_id = bottle_size_id.into();
        self
    }
}

impl Validate for PriceQuery {
    fn validate(&self) -> Result<()> {
        if self.producer_name.trim().is_empty() {
            return Err(EnrichError::InvalidQuery {
                message: "producer name is empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSourceTag {
    ScrapedMarketplace,
    GenerativeEstimate,
}

impl PriceSourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSourceTag::ScrapedMarketplace => "scraped-marketplace",
            PriceSourceTag::GenerativeEstimate => "generative-estimate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Resolved price. Either every price field and `source` are `None`, or
/// `price_avg` and `source` are both set; the constructors keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResult {
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub price_avg: Option<f64>,
    pub source: Option<PriceSourceTag>,
    pub currency: String,
    /// Self-reported model confidence; only set on generative estimates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl PriceResult {
    pub fn empty(currency: impl Into<String>) -> Self {
        Self {
            price_min: None,
            price_max: None,
            price_avg: None,
            source: None,
            currency: currency.into(),
            confidence: None,
        }
    }

    pub fn scraped(min: f64, max: f64, avg: f64, currency: impl Into<String>) -> Self {
        Self {
            price_min: Some(min),
            price_max: Some(max),
            price_avg: Some(avg),
            source: Some(PriceSourceTag::ScrapedMarketplace),
            currency: currency.into(),
            confidence: None,
        }
    }

    pub fn estimated(
        min: Option<f64>,
        max: Option<f64>,
        avg: f64,
        confidence: Confidence,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            price_min: min,
            price_max: max,
            price_avg: Some(avg),
            source: Some(PriceSourceTag::GenerativeEstimate),
            currency: currency.into(),
            confidence: Some(confidence),
        }
    }

    pub fn has_price(&self) -> bool {
        self.price_avg.is_some()
    }
}

impl Default for PriceResult {
    fn default() -> Self {
        Self::empty(DEFAULT_CURRENCY)
    }
}

/// A stored wine as the persistence layer hands it over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WineRecord {
    pub id: Option<String>,
    #[serde(alias = "chateau")]
    pub producer: String,
    pub wine_name: Option<String>,
    pub vintage: Option<i32>,
    pub color: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub appellation: Option<String>,
    pub grape_variety: Option<String>,
    pub tasting_notes: Option<String>,
    pub food_pairing: Option<Vec<String>>,
    pub drinking_window: Option<String>,
    pub winemaker_info: Option<String>,
    pub bottle_size: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub price_avg: Option<f64>,
    pub price_source: Option<String>,
    pub currency: Option<String>,
}

impl WineRecord {
    pub fn new(producer: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
            ..Self::default()
        }
    }

    pub fn bottle_size_id(&self) -> &str {
        self.bottle_size
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(STANDARD_BOTTLE_ID)
    }
}

/// Partial field update for one wine record, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateSet {
    fields: BTreeMap<String, serde_json::Value>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, serde_json::Value> {
        self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload, already encoded by the caller.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: InlineImage) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}
