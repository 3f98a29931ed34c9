use crate::core::catalog::BottleSizeCatalog;
use crate::domain::model::PriceQuery;

/// Free-text marketplace search: producer, vintage, region, then the size phrase.
pub fn build_search_query(
    catalog: &BottleSizeCatalog,
    producer_name: &str,
    vintage_year: Option<i32>,
    region_name: Option<&str>,
    bottle_size_id: &str,
) -> String {
    let mut parts: Vec<String> = vec![producer_name.trim().to_string()];

    if let Some(vintage) = vintage_year {
        parts.push(vintage.to_string());
    }
    if let Some(region) = region_name.map(str::trim).filter(|r| !r.is_empty()) {
        parts.push(region.to_string());
    }

    let modifier = catalog.search_modifier(bottle_size_id);
    if !modifier.is_empty() {
        parts.push(modifier);
    }

    parts.retain(|p| !p.is_empty());
    parts.join(" ").trim().to_string()
}

pub fn search_query_for(catalog: &BottleSizeCatalog, query: &PriceQuery) -> String {
    build_search_query(
        catalog,
        &query.producer_name,
        query.vintage_year,
        query.region_name.as_deref(),
        &query.bottle_size_id,
    )
}
