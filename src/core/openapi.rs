use utoipa::{Modify, OpenApi};

use crate::features::shipping::{dtos as shipping_dtos, handlers as shipping_handlers};
use crate::features::shipping::models::{LocalityType, ShippingTier};
use crate::features::shipping::services::{RegionsState, SelectionState};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Provider lookups
        shipping_handlers::list_provinces,
        shipping_handlers::list_cities,
        shipping_handlers::quote,
        shipping_handlers::cache_stats,
        // Sessions
        shipping_handlers::create_session,
        shipping_handlers::get_session,
        shipping_handlers::delete_session,
        shipping_handlers::load_provinces,
        shipping_handlers::select_province,
        shipping_handlers::select_city,
        shipping_handlers::session_cost,
        shipping_handlers::reset_session,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Shipping
            LocalityType,
            ShippingTier,
            RegionsState,
            SelectionState,
            shipping_dtos::ProvinceResponseDto,
            shipping_dtos::CityResponseDto,
            shipping_dtos::QuoteRequestDto,
            shipping_dtos::QuoteResponseDto,
            shipping_dtos::SelectProvinceDto,
            shipping_dtos::SelectCityDto,
            shipping_dtos::SessionCostDto,
            shipping_dtos::ShippingSessionDto,
            shipping_dtos::CacheStatsDto,
            ApiResponse<Vec<shipping_dtos::ProvinceResponseDto>>,
            ApiResponse<Vec<shipping_dtos::CityResponseDto>>,
            ApiResponse<shipping_dtos::QuoteResponseDto>,
            ApiResponse<shipping_dtos::SessionCostDto>,
            ApiResponse<shipping_dtos::ShippingSessionDto>,
            ApiResponse<shipping_dtos::CacheStatsDto>,
        )
    ),
    tags(
        (name = "shipping", description = "RajaOngkir provinces and cities, flat-tier shipping quotes"),
        (name = "shipping-sessions", description = "Stateful destination selection for a checkout"),
    ),
    info(
        title = "Ongkir API",
        version = "0.1.0",
        description = "Shipping rate resolution backed by RajaOngkir",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_shipping_paths() {
        let mut openapi = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Toko".to_string(),
            version: "2.0.0".to_string(),
            description: "Storefront".to_string(),
        }
        .modify(&mut openapi);

        assert_eq!(openapi.info.title, "Toko");
        assert!(openapi.paths.paths.contains_key("/api/shipping/provinces"));
        assert!(openapi
            .paths
            .paths
            .contains_key("/api/shipping/sessions/{id}/cost"));
    }
}
