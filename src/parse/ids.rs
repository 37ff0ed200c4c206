//! Listing-id harvesting from arbitrary payloads
//!
//! Marketplace APIs and pages embed ten-character listing ids in JSON blobs,
//! `data-asin` attributes, product links, and plain text. `extract_ids`
//! sweeps whichever form the caller has on hand.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Payload to harvest ids from
#[derive(Debug, Clone, Copy)]
pub enum IdSource<'a> {
    /// A JSON document; every `"asin"` key with a ten-character string value
    Json(&'a str),
    /// An HTML page; `data-asin` attributes and `/dp/` links
    Html(&'a str),
    /// Free text; ten-character alphanumeric tokens
    Text(&'a str),
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{10}$").expect("static pattern"))
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/dp/([A-Z0-9]{10})").expect("static pattern"))
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-Z0-9]{10}\b").expect("static pattern"))
}

/// Harvests the set of listing ids present in the source
pub fn extract_ids(source: IdSource<'_>) -> HashSet<String> {
    let mut ids = HashSet::new();
    match source {
        IdSource::Json(raw) => {
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => collect_from_json(&value, &mut ids),
                Err(e) => tracing::warn!("Id extraction got unparseable JSON: {}", e),
            }
        }
        IdSource::Html(raw) => collect_from_html(raw, &mut ids),
        IdSource::Text(raw) => collect_from_text(raw, &mut ids),
    }
    ids
}

/// Listing id embedded in a `/dp/` URL path, if any
pub(crate) fn asin_from_path(path: &str) -> Option<String> {
    link_pattern()
        .captures(path)
        .map(|caps| caps[1].to_string())
}

fn collect_from_json(value: &Value, ids: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(asin)) = map.get("asin") {
                if id_pattern().is_match(asin) {
                    ids.insert(asin.clone());
                }
            }
            for nested in map.values() {
                collect_from_json(nested, ids);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_from_json(item, ids);
            }
        }
        _ => {}
    }
}

fn collect_from_html(raw: &str, ids: &mut HashSet<String>) {
    let document = Html::parse_document(raw);

    if let Ok(selector) = Selector::parse("[data-asin]") {
        for element in document.select(&selector) {
            if let Some(asin) = element.value().attr("data-asin") {
                if id_pattern().is_match(asin) {
                    ids.insert(asin.to_string());
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("a[href*='/dp/']") {
        for link in document.select(&selector) {
            if let Some(asin) = link.value().attr("href").and_then(asin_from_path) {
                ids.insert(asin);
            }
        }
    }
}

fn collect_from_text(raw: &str, ids: &mut HashSet<String>) {
    let has_product_link = raw.contains("/dp/");
    for token in token_pattern().find_iter(raw) {
        let token = token.as_str();
        // Real listing ids almost always start with B; plain tokens only
        // count when the surrounding text looks like product links
        if token.starts_with('B') || has_product_link {
            ids.insert(token.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_nested_extraction() {
        let raw = r#"{
            "results": [
                {"asin": "B08N5WRWNW", "title": "x"},
                {"detail": {"asin": "B07XJ8C8F5"}},
                {"asin": "too-short"}
            ],
            "asin": "B01ABCDEF2"
        }"#;
        let ids = extract_ids(IdSource::Json(raw));
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("B08N5WRWNW"));
        assert!(ids.contains("B07XJ8C8F5"));
        assert!(ids.contains("B01ABCDEF2"));
    }

    #[test]
    fn test_json_garbage_is_empty() {
        assert!(extract_ids(IdSource::Json("not json at all")).is_empty());
    }

    #[test]
    fn test_html_attributes_and_links() {
        let raw = r#"
            <div data-asin="B08N5WRWNW"></div>
            <div data-asin="short"></div>
            <a href="/dp/B07XJ8C8F5/ref=sr_1_1">link</a>
        "#;
        let ids = extract_ids(IdSource::Html(raw));
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("B08N5WRWNW"));
        assert!(ids.contains("B07XJ8C8F5"));
    }

    #[test]
    fn test_text_requires_b_prefix_without_links() {
        let ids = extract_ids(IdSource::Text("ids: B08N5WRWNW and 1234567890"));
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("B08N5WRWNW"));
    }

    #[test]
    fn test_text_accepts_any_token_near_links() {
        let ids = extract_ids(IdSource::Text("see /dp/ pages: B08N5WRWNW 1234567890"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_asin_from_path() {
        assert_eq!(
            asin_from_path("/dp/B08N5WRWNW/ref=zg_bs"),
            Some("B08N5WRWNW".to_string())
        );
        assert_eq!(asin_from_path("/gp/bestsellers"), None);
    }
}
