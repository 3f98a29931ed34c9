use cellar_enrich::core::marketplace::MarketplaceSettings;
use cellar_enrich::domain::ports::GenerativeModel;
use cellar_enrich::{
    BottleSizeCatalog, GeminiClient, GeminiSettings, KnowledgeEstimator, MarketplaceScraper,
    PriceResolver, WineEnricher, WineRecord,
};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn enricher(marketplace: &MockServer, model: &MockServer) -> WineEnricher {
    let catalog = Arc::new(BottleSizeCatalog::builtin());

    let scraper = MarketplaceScraper::new(MarketplaceSettings {
        base_url: marketplace.base_url(),
        ..MarketplaceSettings::default()
    })
    .unwrap();

    let mut settings = GeminiSettings::new("test-key");
    settings.endpoint = model.base_url();
    let gemini: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(settings));

    let estimator = KnowledgeEstimator::new(gemini.clone(), catalog.clone());
    let resolver = PriceResolver::new(Arc::new(scraper), Arc::new(estimator), catalog);
    WineEnricher::new(gemini, Arc::new(resolver))
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn palmer() -> WineRecord {
    let mut wine = WineRecord::new("Château Palmer");
    wine.vintage = Some(2016);
    wine.color = Some("red".to_string());
    wine
}

#[tokio::test]
async fn test_enrichment_fills_details_then_prices_with_fresh_region() {
    let marketplace = MockServer::start();
    let model = MockServer::start();

    let page = marketplace.mock(|when, then| {
        when.method(GET).query_param("q", "Château Palmer 2016 Bordeaux");
        then.status(200).body("<html><body><p>Nothing here</p></body></html>");
    });
    let details = model.mock(|when, then| {
        when.method(POST).body_contains("Look up information about this wine");
        then.status(200).json_body(gemini_reply(
            r#"{"region": "Bordeaux", "country": "France", "appellation": "Margaux",
                "grape_variety": null, "food_pairing": ["roast lamb", " "],
                "drinking_window": "2026-2045"}"#,
        ));
    });
    let estimate = model.mock(|when, then| {
        when.method(POST).body_contains("Estimate the retail price");
        then.status(200).json_body(gemini_reply(
            r#"{"price_min": 280, "price_max": 340, "price_avg": 310, "confidence": "high"}"#,
        ));
    });

    let report = enricher(&marketplace, &model)
        .enrich_report(&palmer())
        .await
        .unwrap();

    details.assert();
    page.assert();
    estimate.assert();
    assert!(!report.quota_exceeded);

    let updates = &report.updates;
    assert_eq!(updates.get_str("region"), Some("Bordeaux"));
    assert_eq!(updates.get_str("appellation"), Some("Margaux"));
    assert_eq!(updates.get("food_pairing"), Some(&json!(["roast lamb"])));
    assert!(!updates.contains_key("grape_variety"));
    assert_eq!(updates.get("price_avg"), Some(&json!(310.0)));
    assert_eq!(updates.get_str("price_source"), Some("generative-estimate"));
    assert_eq!(updates.get_str("currency"), Some("EUR"));

    let fields = report.enriched_fields();
    assert!(fields.contains(&"drinking_window".to_string()));
    assert!(!fields.contains(&"color".to_string()));
}

#[tokio::test]
async fn test_complete_record_makes_no_calls() {
    let marketplace = MockServer::start();
    let model = MockServer::start();

    let page = marketplace.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });
    let calls = model.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let wine = WineRecord {
        region: Some("Bordeaux".to_string()),
        country: Some("France".to_string()),
        appellation: Some("Margaux".to_string()),
        grape_variety: Some("Cabernet Sauvignon, Merlot".to_string()),
        tasting_notes: Some("Dark fruit, violets".to_string()),
        food_pairing: Some(vec!["lamb".to_string()]),
        drinking_window: Some("2026-2045".to_string()),
        winemaker_info: Some("Third growth".to_string()),
        price_avg: Some(310.0),
        ..palmer()
    };

    let updates = enricher(&marketplace, &model).enrich(&wine).await.unwrap();

    assert!(updates.is_empty());
    page.assert_hits(0);
    calls.assert_hits(0);
}

#[tokio::test]
async fn test_quota_on_details_still_applies_marketplace_price() {
    let marketplace = MockServer::start();
    let model = MockServer::start();

    marketplace.mock(|when, then| {
        when.method(GET).query_param("q", "Château Palmer 2016 magnum 1.5L");
        then.status(200).body(
            r#"<div class="wine-card"><span class="price">€600.00</span><span class="price">€700.00</span></div>"#,
        );
    });
    model.mock(|when, then| {
        when.method(POST);
        then.status(429).body("RESOURCE_EXHAUSTED");
    });

    let wine = WineRecord {
        bottle_size: Some("magnum".to_string()),
        ..palmer()
    };
    let report = enricher(&marketplace, &model)
        .enrich_report(&wine)
        .await
        .unwrap();

    assert!(report.quota_exceeded);
    assert!(!report.updates.contains_key("region"));
    assert_eq!(report.updates.get("price_avg"), Some(&json!(650.0)));
    assert_eq!(report.updates.get("price_min"), Some(&json!(600.0)));
    assert_eq!(
        report.updates.get_str("price_source"),
        Some("scraped-marketplace")
    );
}
