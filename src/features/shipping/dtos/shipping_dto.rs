use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::shipping::clients::CacheStats;
use crate::features::shipping::models::{
    Locality, LocalityType, Region, ShippingQuote, ShippingTier,
};
use crate::features::shipping::services::{RegionsState, SelectionState, ShippingSession};

/// Response DTO for province data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceResponseDto {
    pub id: String,
    pub name: String,
}

impl From<&Region> for ProvinceResponseDto {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            name: region.name.clone(),
        }
    }
}

/// Response DTO for city/regency data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityResponseDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub locality_type: LocalityType,
    pub province_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl From<&Locality> for CityResponseDto {
    fn from(locality: &Locality) -> Self {
        Self {
            id: locality.id.clone(),
            name: locality.name.clone(),
            locality_type: locality.locality_type,
            province_id: locality.region_id.clone(),
            postal_code: locality.postal_code.clone(),
        }
    }
}

/// Request DTO for a one-off shipping quote
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestDto {
    /// City or regency name, e.g. "Jakarta Selatan"
    #[validate(length(min = 1, max = 128, message = "City name must be 1-128 characters"))]
    pub city_name: String,

    /// Provider type label ("Kota" / "Kabupaten")
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32, message = "Type must be 1-32 characters"))]
    pub locality_type: String,

    /// Order subtotal in rupiah; when present the response includes the total
    #[validate(range(min = 0, message = "Subtotal must not be negative"))]
    pub subtotal: Option<i64>,
}

/// Response DTO for a shipping quote
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponseDto {
    pub tier: ShippingTier,
    pub shipping_cost: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,
}

impl QuoteResponseDto {
    pub fn new(quote: ShippingQuote, subtotal: Option<i64>) -> Self {
        Self {
            tier: quote.tier,
            shipping_cost: quote.shipping_cost,
            subtotal,
            total_amount: subtotal.map(|s| quote.total_with(s)),
        }
    }
}

/// Request DTO for choosing a province in a session
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectProvinceDto {
    #[validate(regex(
        path = "*crate::shared::validation::PROVIDER_ID_REGEX",
        message = "Province id must be numeric"
    ))]
    pub province_id: String,
}

/// Request DTO for choosing a city in a session
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectCityDto {
    #[validate(regex(
        path = "*crate::shared::validation::PROVIDER_ID_REGEX",
        message = "City id must be numeric"
    ))]
    pub city_id: String,
}

/// Query parameters for the session cost endpoint
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CostQuery {
    /// Order subtotal in rupiah, added to the shipping cost when present
    #[param(example = 150000)]
    #[validate(range(min = 0, message = "Subtotal must not be negative"))]
    pub subtotal: Option<i64>,
}

/// Response DTO for a session's current cost
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCostDto {
    /// Absent when no city is selected
    pub tier: Option<ShippingTier>,
    /// 0 when no city is selected
    pub shipping_cost: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,
}

impl SessionCostDto {
    pub fn from_session(session: &ShippingSession, subtotal: Option<i64>) -> Self {
        let shipping_cost = session.current_cost();
        Self {
            tier: session.tier(),
            shipping_cost,
            subtotal,
            total_amount: subtotal.map(|s| s.saturating_add(shipping_cost)),
        }
    }
}

/// Snapshot of a shipping session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSessionDto {
    pub id: Uuid,
    pub regions_state: RegionsState,
    pub selection_state: SelectionState,
    pub loading: bool,
    pub provinces: Vec<ProvinceResponseDto>,
    pub cities: Vec<CityResponseDto>,
    pub selected_province_id: Option<String>,
    pub selected_city: Option<CityResponseDto>,
    pub tier: Option<ShippingTier>,
    pub shipping_cost: i64,
    /// Last fetch failure, cleared by the next fetch
    pub error: Option<String>,
}

impl ShippingSessionDto {
    pub fn from_session(id: Uuid, session: &ShippingSession) -> Self {
        Self {
            id,
            regions_state: session.regions_state(),
            selection_state: session.selection_state(),
            loading: session.is_loading(),
            provinces: session.regions().iter().map(Into::into).collect(),
            cities: session.localities().iter().map(Into::into).collect(),
            selected_province_id: session.selected_region_id().map(str::to_string),
            selected_city: session.selection().map(Into::into),
            tier: session.tier(),
            shipping_cost: session.current_cost(),
            error: session.error().map(str::to_string),
        }
    }
}

/// Response DTO for response cache statistics
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsDto {
    pub province_list_cached: bool,
    pub cached_city_lists: usize,
    pub hits: u64,
    pub misses: u64,
    /// Absent when entries never expire
    pub ttl_secs: Option<u64>,
}

impl CacheStatsDto {
    pub fn new(stats: CacheStats, ttl_secs: Option<u64>) -> Self {
        Self {
            province_list_cached: stats.regions_cached,
            cached_city_lists: stats.locality_lists,
            hits: stats.hits,
            misses: stats.misses,
            ttl_secs,
        }
    }
}
