use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::features::shipping::clients::{RajaOngkirClient, RateClientError};
use crate::features::shipping::models::{Locality, Region, ShippingQuote, ShippingTier};
use crate::features::shipping::services::tier_pricing::TierPricingEngine;

/// Province list lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionsState {
    Empty,
    RegionsLoading,
    RegionsReady,
}

/// Destination selection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionState {
    NoSelection,
    LocalitiesLoading,
    SelectionMade,
}

/// One shopper's province/city choice and the shipping cost it implies.
///
/// Fetches are split into a `begin_*` step that enters the loading state and a
/// `finish_*` step that applies the outcome. Each begin hands out a ticket and
/// only the latest ticket may finish, so a reset or a newer request makes an
/// older in-flight result a no-op. Fetch failures never escape: they land in
/// `error` and the previous lists stay as they were.
pub struct ShippingSession {
    client: Arc<RajaOngkirClient>,
    pricing: Arc<TierPricingEngine>,
    regions: Arc<Vec<Region>>,
    localities: Arc<Vec<Locality>>,
    selected_region_id: Option<String>,
    selection: Option<Locality>,
    tier: Option<ShippingTier>,
    regions_state: RegionsState,
    selection_state: SelectionState,
    error: Option<String>,
    regions_ticket: u64,
    localities_ticket: u64,
}

impl ShippingSession {
    pub fn new(client: Arc<RajaOngkirClient>, pricing: Arc<TierPricingEngine>) -> Self {
        Self {
            client,
            pricing,
            regions: Arc::new(Vec::new()),
            localities: Arc::new(Vec::new()),
            selected_region_id: None,
            selection: None,
            tier: None,
            regions_state: RegionsState::Empty,
            selection_state: SelectionState::NoSelection,
            error: None,
            regions_ticket: 0,
            localities_ticket: 0,
        }
    }

    /// `None` when provinces are already loaded and nothing needs fetching
    fn begin_load_regions(&mut self) -> Option<u64> {
        if self.regions_state == RegionsState::RegionsReady {
            tracing::debug!("Provinces already loaded, skipping fetch");
            return None;
        }

        self.regions_ticket += 1;
        self.regions_state = RegionsState::RegionsLoading;
        self.error = None;
        Some(self.regions_ticket)
    }

    fn finish_load_regions(
        &mut self,
        ticket: u64,
        result: std::result::Result<Arc<Vec<Region>>, RateClientError>,
    ) {
        if ticket != self.regions_ticket {
            tracing::debug!("Discarding superseded province load");
            return;
        }

        match result {
            Ok(regions) => {
                self.regions = regions;
                self.regions_state = RegionsState::RegionsReady;
            }
            Err(e) => {
                tracing::warn!("Failed to load provinces: {}", e);
                self.error = Some(e.to_string());
                self.regions_state = RegionsState::Empty;
            }
        }
    }

    /// Switch province: drops the city list and selection. `None` for an empty id.
    fn begin_select_region(&mut self, region_id: &str) -> Option<(String, u64)> {
        let region_id = region_id.trim();
        if region_id.is_empty() {
            tracing::debug!("Ignoring province selection without an id");
            return None;
        }

        self.localities_ticket += 1;
        self.error = None;
        self.localities = Arc::new(Vec::new());
        self.selection = None;
        self.tier = None;
        self.selected_region_id = Some(region_id.to_string());
        self.selection_state = SelectionState::LocalitiesLoading;
        Some((region_id.to_string(), self.localities_ticket))
    }

    fn finish_select_region(
        &mut self,
        ticket: u64,
        region_id: &str,
        result: std::result::Result<Arc<Vec<Locality>>, RateClientError>,
    ) {
        if ticket != self.localities_ticket {
            tracing::debug!("Discarding superseded city load for province {}", region_id);
            return;
        }

        match result {
            Ok(localities) => self.localities = localities,
            Err(e) => {
                tracing::warn!("Failed to load cities for province {}: {}", region_id, e);
                self.error = Some(e.to_string());
                self.selected_region_id = None;
            }
        }

        self.selection_state = SelectionState::NoSelection;
    }

    pub fn select_locality(&mut self, locality: Locality) -> ShippingQuote {
        let quote = self.pricing.quote(&locality);
        tracing::debug!(
            "Selected {} {} ({}), shipping cost {}",
            locality.locality_type,
            locality.name,
            quote.tier.as_str(),
            quote.shipping_cost
        );

        self.tier = Some(quote.tier);
        self.selection = Some(locality);
        self.selection_state = SelectionState::SelectionMade;
        quote
    }

    /// Select a city from the currently loaded list
    pub fn select_locality_by_id(&mut self, locality_id: &str) -> Result<ShippingQuote> {
        let locality = self
            .localities
            .iter()
            .find(|l| l.id == locality_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "City '{}' is not in the loaded city list",
                    locality_id
                ))
            })?;

        Ok(self.select_locality(locality))
    }

    /// Shipping cost of the selection, 0 when nothing is selected
    pub fn current_cost(&self) -> i64 {
        self.tier.map(|tier| self.pricing.cost_of(tier)).unwrap_or(0)
    }

    pub fn current_quote(&self) -> Option<ShippingQuote> {
        self.tier.map(|tier| self.pricing.quote_tier(tier))
    }

    /// Back to a fresh session. Fetches still in flight are ignored when they land.
    fn reset_state(&mut self) {
        self.regions_ticket += 1;
        self.localities_ticket += 1;
        self.regions = Arc::new(Vec::new());
        self.localities = Arc::new(Vec::new());
        self.selected_region_id = None;
        self.selection = None;
        self.tier = None;
        self.regions_state = RegionsState::Empty;
        self.selection_state = SelectionState::NoSelection;
        self.error = None;
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn localities(&self) -> &[Locality] {
        &self.localities
    }

    pub fn selected_region_id(&self) -> Option<&str> {
        self.selected_region_id.as_deref()
    }

    pub fn selection(&self) -> Option<&Locality> {
        self.selection.as_ref()
    }

    pub fn tier(&self) -> Option<ShippingTier> {
        self.tier
    }

    pub fn regions_state(&self) -> RegionsState {
        self.regions_state
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection_state
    }

    pub fn is_loading(&self) -> bool {
        self.regions_state == RegionsState::RegionsLoading
            || self.selection_state == SelectionState::LocalitiesLoading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Shared handle to one [`ShippingSession`].
///
/// The session lock is held while state changes, never across a provider
/// fetch, so snapshots taken mid-fetch see the loading states. Every fetching
/// operation runs on its own task: once issued it runs to completion even if
/// the caller stops waiting, and the session never stays stuck loading.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<ShippingSession>>,
}

impl SessionHandle {
    pub fn new(session: ShippingSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ShippingSession> {
        self.inner.lock().await
    }

    /// Fetch provinces unless already loaded
    pub async fn load_regions(&self) {
        let handle = self.clone();
        settle(tokio::spawn(async move {
            let (client, ticket) = {
                let mut session = handle.inner.lock().await;
                match session.begin_load_regions() {
                    Some(ticket) => (Arc::clone(&session.client), ticket),
                    None => return,
                }
            };

            let result = client.list_regions().await;
            handle.inner.lock().await.finish_load_regions(ticket, result);
        }))
        .await;
    }

    /// Choose a province and fetch its cities. An empty id is ignored.
    pub async fn select_region(&self, region_id: &str) {
        let handle = self.clone();
        let region_id = region_id.to_string();
        settle(tokio::spawn(async move {
            let (client, region_id, ticket) = {
                let mut session = handle.inner.lock().await;
                match session.begin_select_region(&region_id) {
                    Some((region_id, ticket)) => (Arc::clone(&session.client), region_id, ticket),
                    None => return,
                }
            };

            let result = client.list_localities(&region_id).await;
            handle
                .inner
                .lock()
                .await
                .finish_select_region(ticket, &region_id, result);
        }))
        .await;
    }

    /// Clear the session and the shared response cache
    pub async fn reset(&self) {
        let handle = self.clone();
        settle(tokio::spawn(async move {
            let client = {
                let mut session = handle.inner.lock().await;
                session.reset_state();
                Arc::clone(&session.client)
            };
            client.cache().clear().await;
        }))
        .await;
    }
}

async fn settle(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        tracing::error!("Shipping session task failed: {}", e);
    }
}
