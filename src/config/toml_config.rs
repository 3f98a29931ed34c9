use crate::adapters::gemini::{GeminiSettings, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
use crate::core::catalog::BottleSizeCatalog;
use crate::core::marketplace::{
    MarketplaceSettings, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_MARKETPLACE_URL, DEFAULT_SEARCH_PATH,
    DEFAULT_USER_AGENT,
};
use crate::domain::model::{BottleSizeDescriptor, DEFAULT_CURRENCY};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable the sample configuration reads the model key from.
pub const API_KEY_ENV: &str = "GOOGLE_AI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub marketplace: MarketplaceConfig,
    pub model: ModelConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
    /// Replaces the builtin catalog when present; must include "standard".
    pub bottle_sizes: Option<Vec<BottleSizeDescriptor>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    pub base_url: String,
    pub search_path: String,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MARKETPLACE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_seconds: None,
        }
    }
}

/// Bounds are exclusive: a candidate must satisfy `min_price < p < max_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub currency: String,
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            min_price: 0.0,
            max_price: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: LogFormat,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn marketplace_settings(&self) -> MarketplaceSettings {
        MarketplaceSettings {
            base_url: self.marketplace.base_url.clone(),
            search_path: self.marketplace.search_path.clone(),
            user_agent: self.marketplace.user_agent.clone(),
            accept_language: self.marketplace.accept_language.clone(),
            timeout: self.marketplace.timeout_seconds.map(Duration::from_secs),
            currency: self.pricing.currency.clone(),
            min_price: self.pricing.min_price,
            max_price: self.pricing.max_price,
        }
    }

    pub fn bottle_size_catalog(&self) -> Result<BottleSizeCatalog> {
        match &self.bottle_sizes {
            Some(sizes) => BottleSizeCatalog::from_descriptors(sizes.clone()),
            None => Ok(BottleSizeCatalog::builtin()),
        }
    }

    /// Falls back to the `GOOGLE_AI_API_KEY` environment variable when no key is configured.
    pub fn gemini_settings(&self) -> Result<GeminiSettings> {
        let api_key = self
            .model
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EnrichError::MissingConfigError {
                field: "model.api_key".to_string(),
            })?;

        Ok(GeminiSettings {
            endpoint: self.model.endpoint.clone(),
            api_key,
            model: self.model.model.clone(),
            timeout: self.model.timeout_seconds.map(Duration::from_secs),
        })
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("marketplace.base_url", &self.marketplace.base_url)?;
        if !self.marketplace.search_path.starts_with('/') {
            return Err(EnrichError::InvalidConfigValueError {
                field: "marketplace.search_path".to_string(),
                value: self.marketplace.search_path.clone(),
                reason: "Path must start with '/'".to_string(),
            });
        }
        validation::validate_non_empty_string(
            "marketplace.user_agent",
            &self.marketplace.user_agent,
        )?;
        if let Some(timeout) = self.marketplace.timeout_seconds {
            validation::validate_positive_number("marketplace.timeout_seconds", timeout, 1)?;
        }

        validation::validate_url("model.endpoint", &self.model.endpoint)?;
        validation::validate_non_empty_string("model.model", &self.model.model)?;
        if let Some(timeout) = self.model.timeout_seconds {
            validation::validate_positive_number("model.timeout_seconds", timeout, 1)?;
        }

        self.bottle_size_catalog()?;

        validation::validate_currency_code("pricing.currency", &self.pricing.currency)?;
        validation::validate_range("pricing.min_price", self.pricing.min_price, 0.0, f64::MAX)?;
        if self.pricing.max_price <= self.pricing.min_price {
            return Err(EnrichError::ConfigValidationError {
                field: "pricing.max_price".to_string(),
                message: format!(
                    "max_price ({}) must be greater than min_price ({})",
                    self.pricing.max_price, self.pricing.min_price
                ),
            });
        }

        Ok(())
    }
}
