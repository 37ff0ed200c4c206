//! Channel catalog
//!
//! Four harvest channels, each with its own entry URLs, crawl depth, page
//! cap, refresh cadence, and filter rules. `ChannelManager` is the single
//! lookup point and also runs the shared compliance checks before the
//! per-channel rules.

use crate::channel::filter::{apply_rules, FilterRule, Verdict};
use crate::channel::risk;
use crate::parse::{Product, Provenance, RiskLevel, SelectorProfile};
use crate::HarvestError;
use chrono::Utc;
use std::collections::HashMap;

/// The four harvest channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    BestSellers,
    MoversShakers,
    Outlet,
    Warehouse,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::BestSellers,
        Channel::MoversShakers,
        Channel::Outlet,
        Channel::Warehouse,
    ];

    pub fn from_name(name: &str) -> Result<Channel, HarvestError> {
        match name {
            "best_sellers" => Ok(Channel::BestSellers),
            "movers_shakers" => Ok(Channel::MoversShakers),
            "outlet" => Ok(Channel::Outlet),
            "warehouse" => Ok(Channel::Warehouse),
            other => Err(HarvestError::UnknownChannel(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::BestSellers => "best_sellers",
            Channel::MoversShakers => "movers_shakers",
            Channel::Outlet => "outlet",
            Channel::Warehouse => "warehouse",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Channel::BestSellers => "Best Sellers",
            Channel::MoversShakers => "Movers & Shakers",
            Channel::Outlet => "Outlet",
            Channel::Warehouse => "Warehouse Deals",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static harvest parameters for one channel
#[derive(Debug, Clone)]
pub struct ChannelProfile {
    pub channel: Channel,
    /// How many subcategory levels to descend
    pub depth: u32,
    /// Listing cap per category page
    pub max_products: usize,
    /// Categories harvested when the run does not name one
    pub categories: Vec<String>,
    /// Hours between scheduled runs
    pub refresh_hours: u64,
    /// Page layout the channel's pages use
    pub selector_profile: SelectorProfile,
    pub rules: Vec<FilterRule>,
}

fn default_categories() -> Vec<String> {
    ["electronics", "home-garden", "pet-supplies", "kitchen", "office-products"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn builtin_profile(channel: Channel) -> ChannelProfile {
    match channel {
        Channel::BestSellers => ChannelProfile {
            channel,
            depth: 3,
            max_products: 100,
            categories: default_categories(),
            refresh_hours: 24,
            selector_profile: SelectorProfile::Bestsellers,
            rules: vec![FilterRule::MinRating { min: 4.3 }],
        },
        Channel::MoversShakers => ChannelProfile {
            channel,
            depth: 1,
            max_products: 200,
            categories: default_categories(),
            refresh_hours: 1,
            selector_profile: SelectorProfile::Bestsellers,
            rules: vec![FilterRule::MinRankChangePct { min: 100.0 }],
        },
        Channel::Outlet => ChannelProfile {
            channel,
            depth: 2,
            max_products: 50,
            categories: vec![
                "electronics".to_string(),
                "home-garden".to_string(),
                "pet-supplies".to_string(),
            ],
            refresh_hours: 168,
            selector_profile: SelectorProfile::DealPage,
            rules: vec![FilterRule::MinDiscountPct { min: 40.0 }],
        },
        Channel::Warehouse => ChannelProfile {
            channel,
            depth: 2,
            max_products: 50,
            categories: default_categories(),
            refresh_hours: 168,
            selector_profile: SelectorProfile::SearchResults,
            rules: vec![
                FilterRule::AllowedConditions {
                    conditions: vec!["Like New".to_string(), "Renewed".to_string()],
                },
                FilterRule::MaxWeightLbs { max: 1.0 },
            ],
        },
    }
}

/// Entry URL for a channel and optional category in a region
pub fn channel_url(channel: Channel, category: Option<&str>, region: &str) -> String {
    let base = crate::region::base_url(region);
    match channel {
        Channel::BestSellers => match category {
            Some(cat) => format!("{base}/Best-Sellers-{cat}/zgbs/{cat}?ref=zg_bs_nav_0"),
            None => format!("{base}/Best-Sellers/zgbs/?ref=zg_bs_nav_0"),
        },
        Channel::MoversShakers => format!(
            "{base}/gp/movers-and-shakers/{}?ref=zg_bsms_nav_0",
            category.unwrap_or("")
        ),
        Channel::Outlet => match category {
            Some(cat) => format!("{base}/outlet/{cat}?ref=outlet_deals_topnav"),
            None => format!("{base}/outlet?ref=outlet_deals_topnav"),
        },
        // Warehouse has a single landing node regardless of category
        Channel::Warehouse => {
            format!("{base}/Warehouse-Deals/b?node=10158976011&ref=sd_allcat_warehouse_deals")
        }
    }
}

/// Lookup and filtering front-end over the channel catalog
pub struct ChannelManager {
    profiles: HashMap<Channel, ChannelProfile>,
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelManager {
    pub fn new() -> Self {
        let profiles = Channel::ALL
            .iter()
            .map(|c| (*c, builtin_profile(*c)))
            .collect();
        Self { profiles }
    }

    /// Builds the catalog with per-channel category overrides applied
    pub fn with_overrides(overrides: &HashMap<String, crate::config::ChannelOverride>) -> crate::Result<Self> {
        let mut manager = Self::new();
        for (name, over) in overrides {
            let channel = Channel::from_name(name)?;
            if !over.categories.is_empty() {
                let profile = manager
                    .profiles
                    .get_mut(&channel)
                    .expect("catalog covers every channel");
                profile.categories = over.categories.clone();
            }
        }
        Ok(manager)
    }

    pub fn profile(&self, channel: Channel) -> &ChannelProfile {
        &self.profiles[&channel]
    }

    /// Runs the shared compliance checks, then the channel's own rules
    ///
    /// Ordering is observable in the rejection reason: a banned category
    /// always wins over a keyword hit, which wins over channel rules.
    pub fn filter_product(&self, product: &Product, channel: Channel) -> Verdict {
        if let Some(category_id) = &product.category_id {
            if let Some(name) = risk::banned_category(category_id) {
                return Verdict::Rejected(format!("Banned category: {name}"));
            }
        }

        let title = product.title.as_deref().unwrap_or("");
        if let Some(keyword) = risk::high_risk_match(title, "") {
            return Verdict::Rejected(format!("High-risk keyword: {keyword}"));
        }

        apply_rules(product, &self.profile(channel).rules)
    }

    /// Stamps where and when the listing was harvested, with a risk grade
    pub fn stamp_provenance(
        &self,
        product: &mut Product,
        channel: Channel,
        category: Option<&str>,
        source_url: &str,
    ) {
        let mut risk = RiskLevel::Low;
        if channel == Channel::Outlet && product.effective_discount().unwrap_or(0.0) > 70.0 {
            risk = RiskLevel::Medium;
        }
        if channel == Channel::Warehouse && product.item_condition.as_deref() == Some("Renewed") {
            risk = RiskLevel::Medium;
        }

        product.provenance = Some(Provenance {
            channel: channel.as_str().to_string(),
            category: category.map(str::to_string),
            fetched_at: Utc::now(),
            source_url: source_url.to_string(),
            risk,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_name(channel.as_str()).unwrap(), channel);
        }
        assert!(Channel::from_name("lightning_deals").is_err());
    }

    #[test]
    fn test_builtin_depths_and_caps() {
        let manager = ChannelManager::new();
        assert_eq!(manager.profile(Channel::BestSellers).depth, 3);
        assert_eq!(manager.profile(Channel::BestSellers).max_products, 100);
        assert_eq!(manager.profile(Channel::MoversShakers).depth, 1);
        assert_eq!(manager.profile(Channel::MoversShakers).max_products, 200);
        assert_eq!(manager.profile(Channel::Outlet).max_products, 50);
        assert_eq!(manager.profile(Channel::Warehouse).depth, 2);
    }

    #[test]
    fn test_channel_urls() {
        assert_eq!(
            channel_url(Channel::BestSellers, Some("electronics"), "us"),
            "https://www.amazon.com/Best-Sellers-electronics/zgbs/electronics?ref=zg_bs_nav_0"
        );
        assert_eq!(
            channel_url(Channel::MoversShakers, Some("kitchen"), "uk"),
            "https://www.amazon.co.uk/gp/movers-and-shakers/kitchen?ref=zg_bsms_nav_0"
        );
        assert!(channel_url(Channel::Warehouse, Some("ignored"), "us").contains("node=10158976011"));
    }

    #[test]
    fn test_banned_category_beats_channel_rules() {
        let manager = ChannelManager::new();
        let mut product = Product::new("B08N5WRWNW");
        product.category_id = Some("3760931".to_string());
        product.rating = Some(1.0); // would also fail the rating rule

        let verdict = manager.filter_product(&product, Channel::BestSellers);
        assert_eq!(verdict.reason(), Some("Banned category: Baby"));
    }

    #[test]
    fn test_keyword_beats_channel_rules() {
        let manager = ChannelManager::new();
        let mut product = Product::new("B08N5WRWNW");
        product.title = Some("Therapeutic knee brace".to_string());
        product.rating = Some(1.0);

        let verdict = manager.filter_product(&product, Channel::BestSellers);
        assert!(verdict.reason().unwrap().starts_with("High-risk keyword"));
    }

    #[test]
    fn test_clean_product_passes() {
        let manager = ChannelManager::new();
        let mut product = Product::new("B08N5WRWNW");
        product.title = Some("Stainless steel water bottle".to_string());
        product.rating = Some(4.7);

        assert!(manager
            .filter_product(&product, Channel::BestSellers)
            .is_accepted());
    }

    #[test]
    fn test_category_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "outlet".to_string(),
            crate::config::ChannelOverride {
                categories: vec!["kitchen".to_string()],
            },
        );
        let manager = ChannelManager::with_overrides(&overrides).unwrap();
        assert_eq!(manager.profile(Channel::Outlet).categories, vec!["kitchen"]);
        // untouched channels keep their defaults
        assert_eq!(manager.profile(Channel::BestSellers).categories.len(), 5);
    }

    #[test]
    fn test_outlet_deep_discount_marked_medium() {
        let manager = ChannelManager::new();
        let mut product = Product::new("B08N5WRWNW");
        product.discount_percentage = Some(85.0);
        manager.stamp_provenance(&mut product, Channel::Outlet, Some("electronics"), "u");
        assert_eq!(product.provenance.as_ref().unwrap().risk, RiskLevel::Medium);
    }

    #[test]
    fn test_renewed_warehouse_marked_medium() {
        let manager = ChannelManager::new();
        let mut product = Product::new("B08N5WRWNW");
        product.item_condition = Some("Renewed".to_string());
        manager.stamp_provenance(&mut product, Channel::Warehouse, None, "u");
        assert_eq!(product.provenance.as_ref().unwrap().risk, RiskLevel::Medium);

        let mut like_new = Product::new("B07XJ8C8F5");
        like_new.item_condition = Some("Like New".to_string());
        manager.stamp_provenance(&mut like_new, Channel::Warehouse, None, "u");
        assert_eq!(like_new.provenance.as_ref().unwrap().risk, RiskLevel::Low);
    }
}
