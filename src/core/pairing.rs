use crate::core::model_output::decode_model_json;
use crate::domain::model::{GenerationRequest, WineRecord};
use crate::domain::ports::GenerativeModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodPairings {
    pub ideal_pairings: Vec<String>,
    pub meat: Vec<String>,
    pub fish: Vec<String>,
    pub cheese: Vec<String>,
    pub vegetarian: Vec<String>,
}

impl FoodPairings {
    pub fn is_empty(&self) -> bool {
        self.ideal_pairings.is_empty()
            && self.meat.is_empty()
            && self.fish.is_empty()
            && self.cheese.is_empty()
            && self.vegetarian.is_empty()
    }
}

pub struct PairingAdvisor {
    model: Arc<dyn GenerativeModel>,
}

impl PairingAdvisor {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Categorised dish suggestions; empty lists when the model cannot help.
    pub async fn suggest(&self, wine: &WineRecord) -> FoodPairings {
        let request = GenerationRequest::text(pairing_prompt(wine));
        let outcome = match self.model.generate(request).await {
            Ok(raw) => decode_model_json::<FoodPairings>(&raw),
            Err(e) => Err(e),
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!("Food pairing lookup failed for '{}': {}", wine.producer, e);
            FoodPairings::default()
        })
    }
}

fn pairing_prompt(wine: &WineRecord) -> String {
    let field = |value: &Option<String>| value.as_deref().unwrap_or("").trim().to_string();
    let vintage = wine.vintage.map(|v| v.to_string()).unwrap_or_default();
    let title = [wine.producer.trim().to_string(), field(&wine.wine_name), vintage]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"Based on this wine information, suggest food pairings.
Wine: {title}
Region: {region}
Grape: {grape}
Color: {color}

Return ONLY valid JSON with these categories (no markdown, no code blocks):
{{
  "ideal_pairings": ["dish1", "dish2", "dish3"],
  "meat": ["beef dish", "lamb dish"],
  "fish": ["fish dish"],
  "cheese": ["cheese type"],
  "vegetarian": ["vegetarian dish"]
}}

Suggest practical, specific dishes that pair well with this wine style."#,
        title = title,
        region = field(&wine.region),
        grape = field(&wine.grape_variety),
        color = field(&wine.color),
    )
}
