// Best-effort price extraction from a wine marketplace's search page.
//
// Two independent heuristics run over the whole document and share one
// numeric sanity filter:
// - elements whose class or test-id mentions "price", scanned for
//   symbol-prefixed or symbol-suffixed euro amounts;
// - every rendered text node containing a euro sign, for markup that does
//   not name its price elements.

use crate::domain::model::{PriceResult, DEFAULT_CURRENCY};
use crate::domain::ports::PriceSource;
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

pub const DEFAULT_MARKETPLACE_URL: &str = "https://www.vivino.com";
pub const DEFAULT_SEARCH_PATH: &str = "/search/wines";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

const PRICE_ELEMENT_SELECTOR: &str =
    r#"[class*="price"], [class*="Price"], [data-testid*="price"]"#;
const AMOUNT: &str = r"\d+(?:[.,]\d+)*";

#[derive(Debug, Clone)]
pub struct MarketplaceSettings {
    pub base_url: String,
    pub search_path: String,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Option<Duration>,
    pub currency: String,
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MARKETPLACE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout: None,
            currency: DEFAULT_CURRENCY.to_string(),
            min_price: 0.0,
            max_price: 10_000.0,
        }
    }
}

/// Pulls candidate amounts out of raw HTML and folds them into a `PriceResult`.
pub struct PriceExtractor {
    price_elements: Selector,
    tagged_amount: Regex,
    euro_amount: Regex,
    min_price: f64,
    max_price: f64,
}

impl PriceExtractor {
    /// `min_price` and `max_price` are exclusive bounds.
    pub fn new(min_price: f64, max_price: f64) -> Result<Self> {
        let price_elements =
            Selector::parse(PRICE_ELEMENT_SELECTOR).map_err(|e| EnrichError::HtmlParse {
                message: format!("invalid selector '{}': {}", PRICE_ELEMENT_SELECTOR, e),
            })?;
        let tagged_amount = compile(&format!(
            r"(?:€|EUR)\s*({amount})|({amount})\s*(?:€|EUR\b)",
            amount = AMOUNT
        ))?;
        let euro_amount = compile(&format!(r"€\s*({})", AMOUNT))?;

        Ok(Self {
            price_elements,
            tagged_amount,
            euro_amount,
            min_price,
            max_price,
        })
    }

    /// Distinct plausible amounts found in `html`, ascending.
    pub fn extract(&self, html: &str) -> Vec<f64> {
        let document = Html::parse_document(html);
        let mut prices = Vec::new();

        for element in document.select(&self.price_elements) {
            let text = element.text().collect::<String>();
            for caps in self.tagged_amount.captures_iter(&text) {
                if let Some(token) = caps.get(1).or_else(|| caps.get(2)) {
                    self.push_candidate(&mut prices, token.as_str());
                }
            }
        }

        for node in document.tree.nodes() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let in_code = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"));
            if in_code {
                continue;
            }

            let content: &str = text;
            if !content.contains('€') {
                continue;
            }
            for caps in self.euro_amount.captures_iter(content) {
                if let Some(token) = caps.get(1) {
                    self.push_candidate(&mut prices, token.as_str());
                }
            }
        }

        prices.sort_by(|a, b| a.total_cmp(b));
        prices.dedup();
        tracing::debug!("Extracted {} distinct candidate prices", prices.len());
        prices
    }

    pub fn price_result(&self, html: &str, currency: &str) -> PriceResult {
        summarize_prices(&self.extract(html), currency)
    }

    fn push_candidate(&self, prices: &mut Vec<f64>, token: &str) {
        match normalize_amount(token) {
            Some(value) if value > self.min_price && value < self.max_price => prices.push(value),
            Some(value) => tracing::trace!("Discarding out-of-range amount {}", value),
            None => tracing::trace!("Discarding unparsable amount '{}'", token),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| EnrichError::HtmlParse {
        message: format!("invalid price pattern: {}", e),
    })
}

/// Parses a matched amount token into a number.
///
/// With both `.` and `,` present the last one is the decimal separator. A
/// single separator followed by exactly three digits, or a repeated one, is
/// thousands grouping. Otherwise a lone `,` is a decimal comma.
pub fn normalize_amount(token: &str) -> Option<f64> {
    let token = token.trim();
    let is_sep = |c: char| c == '.' || c == ',';

    let normalized = match token.rfind(is_sep) {
        None => token.to_string(),
        Some(idx) => {
            let separators = token.matches(is_sep).count();
            let digits_after = token.len() - idx - 1;
            if token.contains('.') && token.contains(',') {
                let (whole, fraction) = token.split_at(idx);
                format!("{}.{}", whole.replace(['.', ','], ""), &fraction[1..])
            } else if separators > 1 || digits_after == 3 {
                token.replace(['.', ','], "")
            } else {
                token.replace(',', ".")
            }
        }
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Min, max and two-decimal mean of an ascending candidate set.
pub fn summarize_prices(prices: &[f64], currency: &str) -> PriceResult {
    let (Some(&min), Some(&max)) = (prices.first(), prices.last()) else {
        return PriceResult::empty(currency);
    };

    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    let avg = round_cents(mean).clamp(min, max);
    PriceResult::scraped(min, max, avg, currency)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `PriceSource` backed by an HTTP fetch of the marketplace search page.
pub struct MarketplaceScraper {
    client: Client,
    settings: MarketplaceSettings,
    extractor: PriceExtractor,
}

impl MarketplaceScraper {
    pub fn new(settings: MarketplaceSettings) -> Result<Self> {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: MarketplaceSettings) -> Result<Self> {
        let extractor = PriceExtractor::new(settings.min_price, settings.max_price)?;
        Ok(Self {
            client,
            settings,
            extractor,
        })
    }

    pub fn search_url(&self, search_query: &str) -> String {
        format!(
            "{}{}?q={}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.search_path,
            urlencoding::encode(search_query)
        )
    }
}

#[async_trait]
impl PriceSource for MarketplaceScraper {
    async fn scrape(&self, search_query: &str) -> Result<PriceResult> {
        let url = self.search_url(search_query);
        tracing::debug!("Fetching marketplace search page: {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.settings.user_agent)
            .header(ACCEPT, DEFAULT_ACCEPT)
            .header(ACCEPT_LANGUAGE, &self.settings.accept_language);
        if let Some(timeout) = self.settings.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Marketplace response status: {}", status);

        if !status.is_success() {
            return Err(EnrichError::ScrapeTransport {
                status: status.as_u16(),
                url,
            });
        }

        let html = response.text().await?;
        Ok(self.extractor.price_result(&html, &self.settings.currency))
    }
}
