use crate::core::config::ShippingCostConfig;
use crate::features::shipping::models::{Locality, ShippingQuote, ShippingTier};
use crate::shared::constants::{BOGOR_LOCALITY, BOGOR_LOCALITY_TYPES, JABODETABEK_LOCALITIES};

/// Classify a destination from its raw name and type labels.
///
/// Total over all inputs: anything outside Bogor and Jabodetabek is
/// `RestOfCountry`. Comparison is case-insensitive.
pub fn classify_destination(name: &str, locality_type: &str) -> ShippingTier {
    let name = name.trim().to_uppercase();
    let locality_type = locality_type.trim().to_uppercase();

    if name == BOGOR_LOCALITY && BOGOR_LOCALITY_TYPES.contains(&locality_type.as_str()) {
        return ShippingTier::Bogor;
    }

    if JABODETABEK_LOCALITIES.contains(&name.as_str()) {
        return ShippingTier::Jabodetabek;
    }

    ShippingTier::RestOfCountry
}

pub fn classify(locality: &Locality) -> ShippingTier {
    classify_destination(&locality.name, locality.locality_type.provider_label())
}

/// Maps destinations to tiers and tiers to their configured flat cost
pub struct TierPricingEngine {
    costs: ShippingCostConfig,
}

impl TierPricingEngine {
    pub fn new(costs: ShippingCostConfig) -> Self {
        Self { costs }
    }

    pub fn cost_of(&self, tier: ShippingTier) -> i64 {
        match tier {
            ShippingTier::Bogor => self.costs.bogor,
            ShippingTier::Jabodetabek => self.costs.jabodetabek,
            ShippingTier::RestOfCountry => self.costs.rest_of_country,
        }
    }

    pub fn quote(&self, locality: &Locality) -> ShippingQuote {
        self.quote_tier(classify(locality))
    }

    pub fn quote_destination(&self, name: &str, locality_type: &str) -> ShippingQuote {
        self.quote_tier(classify_destination(name, locality_type))
    }

    pub fn quote_tier(&self, tier: ShippingTier) -> ShippingQuote {
        ShippingQuote {
            tier,
            shipping_cost: self.cost_of(tier),
        }
    }
}

impl Default for TierPricingEngine {
    fn default() -> Self {
        Self::new(ShippingCostConfig::default())
    }
}
