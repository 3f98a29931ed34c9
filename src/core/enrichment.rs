// Background gap-filling for a saved wine: descriptive details first, then
// price. Only empty fields are ever proposed, so a repeated run over an
// already enriched record yields an empty update set.

use crate::core::model_output::decode_model_json;
use crate::core::resolver::PriceResolver;
use crate::domain::model::{GenerationRequest, PriceQuery, UpdateSet, WineRecord};
use crate::domain::ports::GenerativeModel;
use crate::utils::error::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptiveField {
    Region,
    Country,
    Appellation,
    GrapeVariety,
    TastingNotes,
    FoodPairing,
    DrinkingWindow,
    WinemakerInfo,
}

impl DescriptiveField {
    pub const ALL: [DescriptiveField; 8] = [
        DescriptiveField::Region,
        DescriptiveField::Country,
        DescriptiveField::Appellation,
        DescriptiveField::GrapeVariety,
        DescriptiveField::TastingNotes,
        DescriptiveField::FoodPairing,
        DescriptiveField::DrinkingWindow,
        DescriptiveField::WinemakerInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptiveField::Region => "region",
            DescriptiveField::Country => "country",
            DescriptiveField::Appellation => "appellation",
            DescriptiveField::GrapeVariety => "grape_variety",
            DescriptiveField::TastingNotes => "tasting_notes",
            DescriptiveField::FoodPairing => "food_pairing",
            DescriptiveField::DrinkingWindow => "drinking_window",
            DescriptiveField::WinemakerInfo => "winemaker_info",
        }
    }

    pub fn is_empty_on(&self, record: &WineRecord) -> bool {
        match self {
            DescriptiveField::Region => blank(&record.region),
            DescriptiveField::Country => blank(&record.country),
            DescriptiveField::Appellation => blank(&record.appellation),
            DescriptiveField::GrapeVariety => blank(&record.grape_variety),
            DescriptiveField::TastingNotes => blank(&record.tasting_notes),
            DescriptiveField::FoodPairing => record
                .food_pairing
                .as_ref()
                .map_or(true, |dishes| dishes.iter().all(|d| d.trim().is_empty())),
            DescriptiveField::DrinkingWindow => blank(&record.drinking_window),
            DescriptiveField::WinemakerInfo => blank(&record.winemaker_info),
        }
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Descriptive details as the model returns them; every field may be null.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WineDetails {
    region: Option<String>,
    country: Option<String>,
    appellation: Option<String>,
    grape_variety: Option<String>,
    tasting_notes: Option<String>,
    food_pairing: Option<Vec<String>>,
    drinking_window: Option<String>,
    winemaker_info: Option<String>,
}

impl WineDetails {
    fn value_for(&self, field: DescriptiveField) -> Option<Value> {
        let text = match field {
            DescriptiveField::Region => &self.region,
            DescriptiveField::Country => &self.country,
            DescriptiveField::Appellation => &self.appellation,
            DescriptiveField::GrapeVariety => &self.grape_variety,
            DescriptiveField::TastingNotes => &self.tasting_notes,
            DescriptiveField::DrinkingWindow => &self.drinking_window,
            DescriptiveField::WinemakerInfo => &self.winemaker_info,
            DescriptiveField::FoodPairing => {
                let dishes: Vec<String> = self
                    .food_pairing
                    .iter()
                    .flatten()
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect();
                return (!dishes.is_empty()).then(|| Value::from(dishes));
            }
        };
        present(text).map(Value::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub updates: UpdateSet,
    /// The generative model refused a call for quota reasons; retry later.
    pub quota_exceeded: bool,
    pub details_attempted: bool,
    pub price_attempted: bool,
}

impl EnrichmentReport {
    pub fn enriched_fields(&self) -> Vec<String> {
        self.updates.field_names()
    }
}

pub struct WineEnricher {
    model: Arc<dyn GenerativeModel>,
    resolver: Arc<PriceResolver>,
}

impl WineEnricher {
    pub fn new(model: Arc<dyn GenerativeModel>, resolver: Arc<PriceResolver>) -> Self {
        Self { model, resolver }
    }

    /// Proposed additions for `record`; the caller persists them.
    pub async fn enrich(&self, record: &WineRecord) -> Result<UpdateSet> {
        Ok(self.enrich_report(record).await?.updates)
    }

    pub async fn enrich_report(&self, record: &WineRecord) -> Result<EnrichmentReport> {
        if record.producer.trim().is_empty() {
            return Err(EnrichError::InvalidQuery {
                message: "wine record has no producer".to_string(),
            });
        }

        let mut report = EnrichmentReport::default();

        let missing: Vec<DescriptiveField> = DescriptiveField::ALL
            .into_iter()
            .filter(|field| field.is_empty_on(record))
            .collect();

        if !missing.is_empty() {
            report.details_attempted = true;
            tracing::debug!(
                "Looking up {} missing descriptive fields for '{}'",
                missing.len(),
                record.producer
            );
            match self.lookup_details(record).await {
                Ok(details) => {
                    for field in missing {
                        if let Some(value) = details.value_for(field) {
                            report.updates.insert(field.as_str(), value);
                        }
                    }
                }
                Err(e) => {
                    report.quota_exceeded |= e.is_quota_exceeded();
                    tracing::warn!("Descriptive enrichment failed for '{}': {}", record.producer, e);
                }
            }
        }

        // A stored average, even 0, counts as user data and is left alone.
        if record.price_avg.is_none() {
            report.price_attempted = true;
            let region = report
                .updates
                .get_str("region")
                .map(str::to_string)
                .or_else(|| present(&record.region).map(str::to_string));

            let query = PriceQuery::new(record.producer.trim())
                .with_vintage(record.vintage)
                .with_region(region)
                .with_bottle_size(record.bottle_size_id());

            let resolution = self.resolver.resolve_detailed(&query).await?;
            report.quota_exceeded |= resolution.quota_exceeded;

            let price = resolution.result;
            if let (Some(avg), Some(source)) = (price.price_avg, price.source) {
                let updates = &mut report.updates;
                if let (None, Some(min)) = (record.price_min, price.price_min) {
                    updates.insert("price_min", min);
                }
                if let (None, Some(max)) = (record.price_max, price.price_max) {
                    updates.insert("price_max", max);
                }
                updates.insert("price_avg", avg);
                if record.price_source.is_none() {
                    updates.insert("price_source", source.as_str());
                }
                if record.currency.is_none() {
                    updates.insert("currency", price.currency);
                }
            }
        }

        tracing::info!(
            "Enrichment for '{}' proposes {} field(s)",
            record.producer,
            report.updates.len()
        );
        Ok(report)
    }

    async fn lookup_details(&self, record: &WineRecord) -> Result<WineDetails> {
        let raw = self
            .model
            .generate(GenerationRequest::text(details_prompt(record)))
            .await?;
        decode_model_json(&raw)
    }
}

fn details_prompt(record: &WineRecord) -> String {
    let mut identity = vec![format!("Producer/Chateau: {}", record.producer.trim())];
    if let Some(name) = present(&record.wine_name) {
        identity.push(format!("Wine Name: {}", name));
    }
    if let Some(vintage) = record.vintage {
        identity.push(format!("Vintage: {}", vintage));
    }
    if let Some(color) = present(&record.color) {
        identity.push(format!("Type: {}", color));
    }

    format!(
        r#"You are a wine expert. Look up information about this wine:
{identity}

Return ONLY valid JSON (no markdown, no code blocks):
{{
  "region": "Wine region (e.g., Bordeaux, Burgundy, Champagne, Napa Valley)",
  "country": "Country of origin",
  "appellation": "Specific appellation if known (e.g., Saint-Émilion Grand Cru, Pauillac)",
  "grape_variety": "Main grape varieties used",
  "tasting_notes": "Brief description of taste profile, body, aromas (2-3 sentences)",
  "food_pairing": ["dish1", "dish2", "dish3"],
  "drinking_window": "e.g., 2024-2030 or Drink now",
  "winemaker_info": "Brief info about the producer/chateau (1-2 sentences)"
}}

If you cannot find reliable information about a field, set it to null.
Focus on accuracy - only include information you are confident about."#,
        identity = identity.join("\n")
    )
}
