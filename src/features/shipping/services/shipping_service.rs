use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::shipping::clients::RajaOngkirClient;
use crate::features::shipping::dtos::{
    CacheStatsDto, CityResponseDto, ProvinceResponseDto, QuoteResponseDto, SessionCostDto,
    ShippingSessionDto,
};
use crate::features::shipping::services::session_registry::ShippingSessionRegistry;
use crate::features::shipping::services::tier_pricing::TierPricingEngine;

/// Entry point for the shipping HTTP handlers
pub struct ShippingService {
    client: Arc<RajaOngkirClient>,
    pricing: Arc<TierPricingEngine>,
    sessions: Arc<ShippingSessionRegistry>,
}

impl ShippingService {
    pub fn new(
        client: Arc<RajaOngkirClient>,
        pricing: Arc<TierPricingEngine>,
        sessions: Arc<ShippingSessionRegistry>,
    ) -> Self {
        Self {
            client,
            pricing,
            sessions,
        }
    }

    // ==================== Provider Lookups ====================

    pub async fn list_provinces(&self) -> Result<Vec<ProvinceResponseDto>> {
        let regions = self.client.list_regions().await?;
        Ok(regions.iter().map(Into::into).collect())
    }

    pub async fn list_cities(&self, province_id: &str) -> Result<Vec<CityResponseDto>> {
        let localities = self.client.list_localities(province_id).await?;
        Ok(localities.iter().map(Into::into).collect())
    }

    pub fn quote(
        &self,
        city_name: &str,
        locality_type: &str,
        subtotal: Option<i64>,
    ) -> QuoteResponseDto {
        QuoteResponseDto::new(
            self.pricing.quote_destination(city_name, locality_type),
            subtotal,
        )
    }

    pub async fn cache_stats(&self) -> CacheStatsDto {
        let cache = self.client.cache();
        CacheStatsDto::new(cache.stats().await, cache.ttl().map(|ttl| ttl.as_secs()))
    }

    // ==================== Sessions ====================

    pub async fn create_session(&self) -> Result<ShippingSessionDto> {
        let (id, session) = self.sessions.create().await?;
        let session = session.lock().await;
        Ok(ShippingSessionDto::from_session(id, &session))
    }

    pub async fn get_session(&self, id: Uuid) -> Result<ShippingSessionDto> {
        let session = self.sessions.get(&id).await?;
        let session = session.lock().await;
        Ok(ShippingSessionDto::from_session(id, &session))
    }

    pub async fn delete_session(&self, id: Uuid) -> Result<()> {
        self.sessions.remove(&id).await
    }

    pub async fn load_provinces(&self, id: Uuid) -> Result<ShippingSessionDto> {
        let session = self.sessions.get(&id).await?;
        session.load_regions().await;
        let session = session.lock().await;
        Ok(ShippingSessionDto::from_session(id, &session))
    }

    pub async fn select_province(
        &self,
        id: Uuid,
        province_id: &str,
    ) -> Result<ShippingSessionDto> {
        let session = self.sessions.get(&id).await?;
        session.select_region(province_id).await;
        let session = session.lock().await;
        Ok(ShippingSessionDto::from_session(id, &session))
    }

    pub async fn select_city(&self, id: Uuid, city_id: &str) -> Result<ShippingSessionDto> {
        let session = self.sessions.get(&id).await?;
        let mut session = session.lock().await;
        session.select_locality_by_id(city_id)?;
        Ok(ShippingSessionDto::from_session(id, &session))
    }

    pub async fn session_cost(&self, id: Uuid, subtotal: Option<i64>) -> Result<SessionCostDto> {
        let session = self.sessions.get(&id).await?;
        let session = session.lock().await;
        Ok(SessionCostDto::from_session(&session, subtotal))
    }

    pub async fn reset_session(&self, id: Uuid) -> Result<ShippingSessionDto> {
        let session = self.sessions.get(&id).await?;
        session.reset().await;
        tracing::info!("Shipping session {} reset, response cache cleared", id);
        let session = session.lock().await;
        Ok(ShippingSessionDto::from_session(id, &session))
    }
}
