//! Channel filter rules
//!
//! Each channel carries a list of `FilterRule`s evaluated by one dispatcher.
//! A rule only fires when the field it inspects is present on the listing;
//! missing data never rejects. Evaluation is pure, so re-filtering an
//! already accepted listing always accepts it again.

use crate::parse::Product;
use serde::{Deserialize, Serialize};

/// One declarative acceptance criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum FilterRule {
    /// Minimum star rating
    MinRating { min: f64 },
    /// Minimum rank-climb percentage, parsed from text like `"+320%"`
    MinRankChangePct { min: f64 },
    /// Minimum discount percentage
    MinDiscountPct { min: f64 },
    /// Acceptable item conditions
    AllowedConditions { conditions: Vec<String> },
    /// Maximum shipping weight in pounds
    MaxWeightLbs { max: f64 },
}

/// Outcome of filtering one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Rejected, with the first reason that fired
    Rejected(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }
}

/// Applies the rule list in order, stopping at the first rejection
pub fn apply_rules(product: &Product, rules: &[FilterRule]) -> Verdict {
    for rule in rules {
        if let Some(reason) = evaluate(product, rule) {
            return Verdict::Rejected(reason);
        }
    }
    Verdict::Accepted
}

/// Rejection reason if the rule fires against this listing
fn evaluate(product: &Product, rule: &FilterRule) -> Option<String> {
    match rule {
        FilterRule::MinRating { min } => {
            let rating = product.rating?;
            (rating < *min).then(|| format!("Rating too low: {rating} < {min}"))
        }
        FilterRule::MinRankChangePct { min } => {
            let pct = parse_rank_change(product.rank_change.as_deref()?)?;
            (pct < *min).then(|| format!("Rank climb too small: {pct}% < {min}%"))
        }
        FilterRule::MinDiscountPct { min } => {
            let discount = product.effective_discount()?;
            (discount < *min).then(|| format!("Discount too low: {discount:.0}% < {min:.0}%"))
        }
        FilterRule::AllowedConditions { conditions } => {
            let condition = product.item_condition.as_deref()?;
            (!conditions.iter().any(|c| c == condition))
                .then(|| format!("Condition not accepted: {condition}"))
        }
        FilterRule::MaxWeightLbs { max } => {
            let weight = product.weight_lbs?;
            (weight > *max).then(|| format!("Too heavy: {weight} lbs > {max} lbs"))
        }
    }
}

/// Extracts the percentage from rank-change text like `"+320%"`
///
/// Unparseable text is treated as absent rather than failing the listing.
fn parse_rank_change(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product::new("B08N5WRWNW")
    }

    #[test]
    fn test_min_rating_fires_only_when_present() {
        let rules = vec![FilterRule::MinRating { min: 4.3 }];

        let mut p = product();
        assert!(apply_rules(&p, &rules).is_accepted());

        p.rating = Some(4.1);
        let verdict = apply_rules(&p, &rules);
        assert!(!verdict.is_accepted());
        assert!(verdict.reason().unwrap().contains("4.1"));

        p.rating = Some(4.6);
        assert!(apply_rules(&p, &rules).is_accepted());
    }

    #[test]
    fn test_rank_change_parsing() {
        assert_eq!(parse_rank_change("+320%"), Some(320.0));
        assert_eq!(parse_rank_change("87%"), Some(87.0));
        assert_eq!(parse_rank_change("n/a"), None);
    }

    #[test]
    fn test_rank_change_rule() {
        let rules = vec![FilterRule::MinRankChangePct { min: 100.0 }];

        let mut p = product();
        p.rank_change = Some("+320%".to_string());
        assert!(apply_rules(&p, &rules).is_accepted());

        p.rank_change = Some("+45%".to_string());
        assert!(!apply_rules(&p, &rules).is_accepted());

        // Garbage text passes instead of rejecting
        p.rank_change = Some("new entry".to_string());
        assert!(apply_rules(&p, &rules).is_accepted());
    }

    #[test]
    fn test_discount_rule_reports_threshold() {
        let rules = vec![FilterRule::MinDiscountPct { min: 40.0 }];

        let mut p = product();
        p.discount_percentage = Some(25.0);
        let verdict = apply_rules(&p, &rules);
        assert!(!verdict.is_accepted());
        assert!(verdict.reason().unwrap().contains("40"));
    }

    #[test]
    fn test_discount_rule_uses_price_pair_fallback() {
        let rules = vec![FilterRule::MinDiscountPct { min: 40.0 }];

        let mut p = product();
        p.price = Some(50.0);
        p.original_price = Some(100.0);
        assert!(apply_rules(&p, &rules).is_accepted());

        p.price = Some(80.0);
        assert!(!apply_rules(&p, &rules).is_accepted());
    }

    #[test]
    fn test_condition_and_weight_rules() {
        let rules = vec![
            FilterRule::AllowedConditions {
                conditions: vec!["Like New".to_string(), "Renewed".to_string()],
            },
            FilterRule::MaxWeightLbs { max: 1.0 },
        ];

        let mut p = product();
        p.item_condition = Some("Used - Acceptable".to_string());
        assert!(!apply_rules(&p, &rules).is_accepted());

        p.item_condition = Some("Renewed".to_string());
        p.weight_lbs = Some(2.5);
        let verdict = apply_rules(&p, &rules);
        assert_eq!(verdict.reason(), Some("Too heavy: 2.5 lbs > 1 lbs"));

        p.weight_lbs = Some(0.8);
        assert!(apply_rules(&p, &rules).is_accepted());
    }

    #[test]
    fn test_first_rejection_wins() {
        let rules = vec![
            FilterRule::MinRating { min: 4.3 },
            FilterRule::MaxWeightLbs { max: 1.0 },
        ];
        let mut p = product();
        p.rating = Some(2.0);
        p.weight_lbs = Some(9.0);
        assert!(apply_rules(&p, &rules).reason().unwrap().contains("Rating"));
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let rules = vec![FilterRule::MinRating { min: 4.3 }];
        let mut p = product();
        p.rating = Some(4.8);

        assert!(apply_rules(&p, &rules).is_accepted());
        assert!(apply_rules(&p, &rules).is_accepted());
    }
}
