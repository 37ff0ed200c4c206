//! HTML product extraction
//!
//! Every field except the listing id is optional: a missing or unparseable
//! element leaves the field `None` and never discards the listing, and a
//! listing with no recognizable id is skipped without failing the page.
//! Marketplaces A/B-test their markup, so each field is resolved through a
//! small cascade of selectors tried in order.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Which page layout the selectors target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorProfile {
    /// Best-seller ranking grids
    Bestsellers,
    /// Search result listings
    SearchResults,
    /// Deal and outlet pages
    DealPage,
}

/// One extracted product listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Ten-character marketplace listing id
    pub asin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    /// Position within the ranking page, 1-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_lbs: Option<f64>,
    /// Category node the listing was harvested under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Product {
    pub fn new(asin: impl Into<String>) -> Self {
        Self {
            asin: asin.into(),
            title: None,
            url: None,
            image_url: None,
            price: None,
            original_price: None,
            discount_percentage: None,
            rating: None,
            review_count: None,
            rank: None,
            rank_change: None,
            item_condition: None,
            weight_lbs: None,
            category_id: None,
            provenance: None,
        }
    }

    /// Discount as a percentage, preferring the explicit page value and
    /// falling back to the price pair when both prices are present.
    pub fn effective_discount(&self) -> Option<f64> {
        if self.discount_percentage.is_some() {
            return self.discount_percentage;
        }
        match (self.price, self.original_price) {
            (Some(price), Some(original)) if original > 0.0 && price <= original => {
                Some((1.0 - price / original) * 100.0)
            }
            _ => None,
        }
    }
}

/// Where and when a product was harvested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub source_url: String,
    pub risk: RiskLevel,
}

/// Coarse compliance-risk grade stamped onto accepted listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Extracts every recognizable product listing from an HTML page
pub fn extract_products(html: &str, profile: SelectorProfile) -> Vec<Product> {
    if html.trim().is_empty() {
        tracing::warn!("Asked to extract products from an empty page");
        return Vec::new();
    }

    let document = Html::parse_document(html);
    match profile {
        SelectorProfile::Bestsellers => extract_bestsellers(&document),
        SelectorProfile::SearchResults => extract_search_results(&document),
        SelectorProfile::DealPage => extract_deals(&document),
    }
}

fn extract_bestsellers(document: &Html) -> Vec<Product> {
    let mut products = Vec::new();

    for container in select_all(document, &[".zg-item", "#gridItemRoot"]) {
        let asin = attr_cascade(&container, &["div[data-asin]", "[data-asin]"], "data-asin")
            .or_else(|| asin_from_links(&container));
        let Some(asin) = asin else { continue };

        let mut product = Product::new(asin);
        product.rank = Some(products.len() as u32 + 1);
        product.title = text_cascade(
            &container,
            &[".p13n-sc-truncated", "._cDEzb_p13n-sc-css-line-clamp-3_g3dy1"],
        );
        product.price = text_cascade(&container, &[".p13n-sc-price", "._cDEzb_p13n-sc-price_3mJ9Z"])
            .and_then(|t| parse_price(&t));
        product.image_url = attr_cascade(&container, &["img"], "src");
        product.rating =
            text_cascade(&container, &[".a-icon-star", ".a-icon-star-small"]).and_then(|t| parse_rating(&t));
        product.review_count = text_cascade(&container, &[".a-size-small:not(.a-color-price)"])
            .and_then(|t| parse_review_count(&t));

        products.push(product);
    }

    products
}

fn extract_search_results(document: &Html) -> Vec<Product> {
    let mut products = Vec::new();

    for container in select_all(document, &["[data-component-type='s-search-result']"]) {
        let Some(asin) = container
            .value()
            .attr("data-asin")
            .filter(|a| !a.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let mut product = Product::new(asin);
        product.title = text_cascade(&container, &["h2 a span", "h2 span"]);
        product.url = attr_cascade(&container, &["h2 a"], "href");
        product.price =
            text_cascade(&container, &[".a-price .a-offscreen"]).and_then(|t| parse_price(&t));
        product.image_url = attr_cascade(&container, &["img.s-image"], "src");
        product.rating = text_cascade(&container, &["i.a-icon-star-small", "i.a-icon-star"])
            .and_then(|t| parse_rating(&t));
        product.review_count = text_cascade(&container, &["span.a-size-base.s-underline-text"])
            .and_then(|t| parse_review_count(&t));

        products.push(product);
    }

    products
}

fn extract_deals(document: &Html) -> Vec<Product> {
    let mut products = Vec::new();

    for container in select_all(document, &[".dealContainer", "[data-testid='deal-card']"]) {
        let asin = attr_cascade(&container, &["[data-asin]"], "data-asin")
            .or_else(|| asin_from_links(&container));
        let Some(asin) = asin else { continue };

        let mut product = Product::new(asin);
        product.title = text_cascade(&container, &[".dealTitle"]);
        product.price = text_cascade(&container, &[".dealPrice"]).and_then(|t| parse_price(&t));
        product.original_price =
            text_cascade(&container, &[".dealListPrice"]).and_then(|t| parse_price(&t));
        product.discount_percentage = text_cascade(&container, &[".dealPercentage"])
            .and_then(|t| parse_price(&t.replace('%', "")));
        product.image_url = attr_cascade(&container, &["img.dealImage", "img"], "src");

        products.push(product);
    }

    products
}

/// All elements matching the first selector in the cascade that matches at all
fn select_all<'a>(document: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let matches: Vec<_> = document.select(&selector).collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

/// First non-empty text under any of the selectors
fn text_cascade(element: &ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(found) = element.select(&selector).next() {
            let text: String = found.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First non-empty attribute value under any of the selectors
fn attr_cascade(element: &ElementRef<'_>, selectors: &[&str], attr: &str) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(found) = element.select(&selector).next() {
            if let Some(value) = found.value().attr(attr) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Listing id recovered from a `/dp/` product link
fn asin_from_links(element: &ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("a[href*='/dp/']").ok()?;
    for link in element.select(&selector) {
        if let Some(href) = link.value().attr("href") {
            if let Some(asin) = crate::parse::ids::asin_from_path(href) {
                return Some(asin);
            }
        }
    }
    None
}

/// Parses a price string like `"$1,299.99"` into a float
fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Parses a rating string like `"4.5 out of 5 stars"`
fn parse_rating(text: &str) -> Option<f64> {
    let (value, _) = text.split_once("out of")?;
    value.trim().parse().ok()
}

/// Parses a review-count string like `"1,234"`
fn parse_review_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BESTSELLER_PAGE: &str = r#"
        <html><body>
          <div class="zg-item">
            <div data-asin="B08N5WRWNW"></div>
            <span class="p13n-sc-truncated">Wireless Earbuds, Noise Cancelling</span>
            <span class="p13n-sc-price">$49.99</span>
            <img src="https://img.example.com/a.jpg">
            <i class="a-icon-star"><span>4.5 out of 5 stars</span></i>
            <span class="a-size-small">12,345</span>
          </div>
          <div class="zg-item">
            <div data-asin="B07XJ8C8F5"></div>
            <span class="p13n-sc-truncated">USB-C Hub</span>
          </div>
          <div class="zg-item">
            <span class="p13n-sc-truncated">No id, should be skipped</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_bestsellers_extraction() {
        let products = extract_products(BESTSELLER_PAGE, SelectorProfile::Bestsellers);
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.asin, "B08N5WRWNW");
        assert_eq!(first.title.as_deref(), Some("Wireless Earbuds, Noise Cancelling"));
        assert_eq!(first.price, Some(49.99));
        assert_eq!(first.rating, Some(4.5));
        assert_eq!(first.review_count, Some(12345));
        assert_eq!(first.rank, Some(1));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let products = extract_products(BESTSELLER_PAGE, SelectorProfile::Bestsellers);
        let second = &products[1];
        assert_eq!(second.asin, "B07XJ8C8F5");
        assert_eq!(second.rank, Some(2));
        assert!(second.price.is_none());
        assert!(second.rating.is_none());
        assert!(second.review_count.is_none());
    }

    #[test]
    fn test_search_results_extraction() {
        let html = r#"
            <div data-component-type="s-search-result" data-asin="B01ABCDEF2">
              <h2><a href="/dp/B01ABCDEF2/"><span>Cast Iron Skillet</span></a></h2>
              <span class="a-price"><span class="a-offscreen">$24.00</span></span>
              <img class="s-image" src="https://img.example.com/b.jpg">
            </div>
        "#;
        let products = extract_products(html, SelectorProfile::SearchResults);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].asin, "B01ABCDEF2");
        assert_eq!(products[0].title.as_deref(), Some("Cast Iron Skillet"));
        assert_eq!(products[0].url.as_deref(), Some("/dp/B01ABCDEF2/"));
        assert_eq!(products[0].price, Some(24.0));
    }

    #[test]
    fn test_deal_page_extraction() {
        let html = r#"
            <div class="dealContainer">
              <span data-asin="B09DEAL0001"></span>
              <span class="dealTitle">Stand Mixer</span>
              <span class="dealPrice">$89.99</span>
              <span class="dealListPrice">$179.99</span>
              <span class="dealPercentage">50%</span>
              <img class="dealImage" src="https://img.example.com/c.jpg">
            </div>
        "#;
        let products = extract_products(html, SelectorProfile::DealPage);
        assert_eq!(products.len(), 1);
        let deal = &products[0];
        assert_eq!(deal.asin, "B09DEAL0001");
        assert_eq!(deal.price, Some(89.99));
        assert_eq!(deal.original_price, Some(179.99));
        assert_eq!(deal.discount_percentage, Some(50.0));
    }

    #[test]
    fn test_effective_discount_prefers_explicit() {
        let mut product = Product::new("B000000001");
        product.price = Some(30.0);
        product.original_price = Some(100.0);
        assert_eq!(product.effective_discount(), Some(70.0));

        product.discount_percentage = Some(65.0);
        assert_eq!(product.effective_discount(), Some(65.0));
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(extract_products("", SelectorProfile::Bestsellers).is_empty());
        assert!(extract_products("<html></html>", SelectorProfile::DealPage).is_empty());
    }

    #[test]
    fn test_parse_price_strips_currency() {
        assert_eq!(parse_price("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price("£24"), Some(24.0));
        assert_eq!(parse_price("See price in cart"), None);
    }

    #[test]
    fn test_parse_rating_formats() {
        assert_eq!(parse_rating("4.5 out of 5 stars"), Some(4.5));
        assert_eq!(parse_rating("no rating"), None);
    }
}
