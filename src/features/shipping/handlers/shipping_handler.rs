use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::shipping::dtos::{
    CacheStatsDto, CityResponseDto, CostQuery, ProvinceResponseDto, QuoteRequestDto,
    QuoteResponseDto, SelectCityDto, SelectProvinceDto, SessionCostDto, ShippingSessionDto,
};
use crate::features::shipping::services::ShippingService;
use crate::shared::types::{ApiResponse, Meta};

// ==================== Provider Handlers ====================

/// List all provinces
#[utoipa::path(
    get,
    path = "/api/shipping/provinces",
    responses(
        (status = 200, description = "List of provinces", body = ApiResponse<Vec<ProvinceResponseDto>>),
        (status = 502, description = "Shipping rate provider failed")
    ),
    tag = "shipping"
)]
pub async fn list_provinces(
    State(service): State<Arc<ShippingService>>,
) -> Result<Json<ApiResponse<Vec<ProvinceResponseDto>>>> {
    let provinces = service.list_provinces().await?;
    let meta = Meta::with_total(provinces.len());
    Ok(Json(ApiResponse::success(Some(provinces), None, Some(meta))))
}

/// List cities and regencies in a province
#[utoipa::path(
    get,
    path = "/api/shipping/provinces/{id}/cities",
    params(
        ("id" = String, Path, description = "RajaOngkir province id")
    ),
    responses(
        (status = 200, description = "List of cities in the province", body = ApiResponse<Vec<CityResponseDto>>),
        (status = 400, description = "Invalid province id"),
        (status = 502, description = "Shipping rate provider failed")
    ),
    tag = "shipping"
)]
pub async fn list_cities(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CityResponseDto>>>> {
    let cities = service.list_cities(&id).await?;
    let meta = Meta::with_total(cities.len());
    Ok(Json(ApiResponse::success(Some(cities), None, Some(meta))))
}

/// Quote a destination without a session
#[utoipa::path(
    post,
    path = "/api/shipping/quote",
    request_body = QuoteRequestDto,
    responses(
        (status = 200, description = "Shipping quote", body = ApiResponse<QuoteResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "shipping"
)]
pub async fn quote(
    State(service): State<Arc<ShippingService>>,
    AppJson(dto): AppJson<QuoteRequestDto>,
) -> Result<Json<ApiResponse<QuoteResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let quote = service.quote(&dto.city_name, &dto.locality_type, dto.subtotal);
    Ok(Json(ApiResponse::success(Some(quote), None, None)))
}

/// Response cache statistics
#[utoipa::path(
    get,
    path = "/api/shipping/cache",
    responses(
        (status = 200, description = "Cache statistics", body = ApiResponse<CacheStatsDto>)
    ),
    tag = "shipping"
)]
pub async fn cache_stats(
    State(service): State<Arc<ShippingService>>,
) -> Result<Json<ApiResponse<CacheStatsDto>>> {
    let stats = service.cache_stats().await;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

// ==================== Session Handlers ====================

/// Start a shipping session
#[utoipa::path(
    post,
    path = "/api/shipping/sessions",
    responses(
        (status = 201, description = "Session created", body = ApiResponse<ShippingSessionDto>),
        (status = 429, description = "Too many live sessions")
    ),
    tag = "shipping-sessions"
)]
pub async fn create_session(
    State(service): State<Arc<ShippingService>>,
) -> Result<(StatusCode, Json<ApiResponse<ShippingSessionDto>>)> {
    let session = service.create_session().await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(session),
            Some("Shipping session created".to_string()),
            None,
        )),
    ))
}

/// Get a session snapshot
#[utoipa::path(
    get,
    path = "/api/shipping/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Shipping session id")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = ApiResponse<ShippingSessionDto>),
        (status = 404, description = "Session not found")
    ),
    tag = "shipping-sessions"
)]
pub async fn get_session(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShippingSessionDto>>> {
    let session = service.get_session(id).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

/// Discard a session
#[utoipa::path(
    delete,
    path = "/api/shipping/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Shipping session id")
    ),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found")
    ),
    tag = "shipping-sessions"
)]
pub async fn delete_session(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    service.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load provinces into the session
///
/// Provider failures are reported in the snapshot's `error` field.
#[utoipa::path(
    post,
    path = "/api/shipping/sessions/{id}/provinces",
    params(
        ("id" = Uuid, Path, description = "Shipping session id")
    ),
    responses(
        (status = 200, description = "Session snapshot after loading", body = ApiResponse<ShippingSessionDto>),
        (status = 404, description = "Session not found")
    ),
    tag = "shipping-sessions"
)]
pub async fn load_provinces(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShippingSessionDto>>> {
    let session = service.load_provinces(id).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

/// Choose a province and load its cities
///
/// Provider failures are reported in the snapshot's `error` field.
#[utoipa::path(
    put,
    path = "/api/shipping/sessions/{id}/province",
    params(
        ("id" = Uuid, Path, description = "Shipping session id")
    ),
    request_body = SelectProvinceDto,
    responses(
        (status = 200, description = "Session snapshot after selecting", body = ApiResponse<ShippingSessionDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Session not found")
    ),
    tag = "shipping-sessions"
)]
pub async fn select_province(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SelectProvinceDto>,
) -> Result<Json<ApiResponse<ShippingSessionDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let session = service.select_province(id, &dto.province_id).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

/// Choose a city from the session's loaded city list
#[utoipa::path(
    put,
    path = "/api/shipping/sessions/{id}/city",
    params(
        ("id" = Uuid, Path, description = "Shipping session id")
    ),
    request_body = SelectCityDto,
    responses(
        (status = 200, description = "Session snapshot after selecting", body = ApiResponse<ShippingSessionDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Session not found or city not loaded")
    ),
    tag = "shipping-sessions"
)]
pub async fn select_city(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SelectCityDto>,
) -> Result<Json<ApiResponse<ShippingSessionDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let session = service.select_city(id, &dto.city_id).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

/// Current shipping cost of the session
#[utoipa::path(
    get,
    path = "/api/shipping/sessions/{id}/cost",
    params(
        ("id" = Uuid, Path, description = "Shipping session id"),
        CostQuery
    ),
    responses(
        (status = 200, description = "Shipping cost (0 without a city)", body = ApiResponse<SessionCostDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Session not found")
    ),
    tag = "shipping-sessions"
)]
pub async fn session_cost(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<CostQuery>,
) -> Result<Json<ApiResponse<SessionCostDto>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let cost = service.session_cost(id, query.subtotal).await?;
    Ok(Json(ApiResponse::success(Some(cost), None, None)))
}

/// Reset the session and clear the response cache
#[utoipa::path(
    post,
    path = "/api/shipping/sessions/{id}/reset",
    params(
        ("id" = Uuid, Path, description = "Shipping session id")
    ),
    responses(
        (status = 200, description = "Session snapshot after reset", body = ApiResponse<ShippingSessionDto>),
        (status = 404, description = "Session not found")
    ),
    tag = "shipping-sessions"
)]
pub async fn reset_session(
    State(service): State<Arc<ShippingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShippingSessionDto>>> {
    let session = service.reset_session(id).await?;
    Ok(Json(ApiResponse::success(
        Some(session),
        Some("Shipping session reset".to_string()),
        None,
    )))
}
