//! Marketplace region handling
//!
//! Maps region codes to marketplace base URLs. Unknown codes fall back to
//! the US storefront rather than failing, so a bad region in an ad-hoc
//! invocation degrades instead of aborting.

const REGION_DOMAINS: &[(&str, &str)] = &[
    ("us", "amazon.com"),
    ("uk", "amazon.co.uk"),
    ("de", "amazon.de"),
    ("fr", "amazon.fr"),
    ("es", "amazon.es"),
    ("it", "amazon.it"),
    ("jp", "amazon.co.jp"),
    ("ca", "amazon.ca"),
    ("in", "amazon.in"),
    ("br", "amazon.com.br"),
    ("mx", "amazon.com.mx"),
    ("au", "amazon.com.au"),
];

/// Returns the marketplace base URL for a region code, e.g. `us` →
/// `https://www.amazon.com`
pub fn base_url(region: &str) -> String {
    let region = region.to_ascii_lowercase();
    let domain = REGION_DOMAINS
        .iter()
        .find(|(code, _)| *code == region)
        .map(|(_, domain)| *domain)
        .unwrap_or("amazon.com");
    format!("https://www.{}", domain)
}

/// Whether a region code is one of the supported marketplaces
pub fn is_known_region(region: &str) -> bool {
    let region = region.to_ascii_lowercase();
    REGION_DOMAINS.iter().any(|(code, _)| *code == region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_known_regions() {
        assert_eq!(base_url("us"), "https://www.amazon.com");
        assert_eq!(base_url("uk"), "https://www.amazon.co.uk");
        assert_eq!(base_url("jp"), "https://www.amazon.co.jp");
    }

    #[test]
    fn test_base_url_case_insensitive() {
        assert_eq!(base_url("DE"), "https://www.amazon.de");
    }

    #[test]
    fn test_base_url_unknown_falls_back() {
        assert_eq!(base_url("zz"), "https://www.amazon.com");
    }

    #[test]
    fn test_is_known_region() {
        assert!(is_known_region("us"));
        assert!(is_known_region("MX"));
        assert!(!is_known_region("zz"));
    }
}
