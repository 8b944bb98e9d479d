use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Flat shipping-cost bracket for a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingTier {
    Bogor,
    Jabodetabek,
    RestOfCountry,
}

impl ShippingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingTier::Bogor => "BOGOR",
            ShippingTier::Jabodetabek => "JABODETABEK",
            ShippingTier::RestOfCountry => "REST_OF_COUNTRY",
        }
    }
}

/// Tier and cost resolved for one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingQuote {
    pub tier: ShippingTier,
    pub shipping_cost: i64,
}

impl ShippingQuote {
    /// Order total the storefront persists: item subtotal plus shipping
    pub fn total_with(&self, subtotal: i64) -> i64 {
        subtotal.saturating_add(self.shipping_cost)
    }
}
