use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;

use crate::core::config::{SessionConfig, ShippingCostConfig};
use crate::features::shipping::clients::rajaongkir_client::{
    ProviderResponse, RajaOngkirClient, RateClientError, RateTransport,
};
use crate::features::shipping::clients::response_cache::ResponseCache;
use crate::features::shipping::services::shipping_session::{SessionHandle, ShippingSession};
use crate::features::shipping::services::{
    ShippingService, ShippingSessionRegistry, TierPricingEngine,
};
use crate::shared::retry::RetryPolicy;

/// Scripted outcome for one provider call
#[derive(Debug, Clone)]
pub enum FakeReply {
    Respond(u16, String),
    NetworkDown,
}

impl FakeReply {
    pub fn ok(body: String) -> Self {
        FakeReply::Respond(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        FakeReply::Respond(status, body.to_string())
    }
}

/// In-memory provider. Replies queue per endpoint and the last one repeats.
///
/// A gated transport records each request, then holds the reply until the
/// gate semaphore hands out a permit.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<String, VecDeque<FakeReply>>>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, endpoint: &str, reply: FakeReply) -> Self {
        self.push(endpoint, reply);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push(&self, endpoint: &str, reply: FakeReply) {
        self.replies
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_to(&self, endpoint: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == endpoint)
            .count()
    }
}

#[async_trait]
impl RateTransport for FakeTransport {
    async fn get(&self, endpoint: &str) -> Result<ProviderResponse, RateClientError> {
        self.requests.lock().unwrap().push(endpoint.to_string());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(endpoint) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(FakeReply::Respond(status, body)) => Ok(ProviderResponse { status, body }),
            Some(FakeReply::NetworkDown) => Err(RateClientError::Transport(
                "connection refused".to_string(),
            )),
            None => Ok(ProviderResponse {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}

/// Polls `condition` every millisecond, panicking after one second
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let waited = tokio::time::timeout(Duration::from_secs(1), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached within 1s");
}

/// Successful `/province` envelope from (id, name) pairs
pub fn provinces_body(provinces: &[(&str, &str)]) -> String {
    let results: Vec<_> = provinces
        .iter()
        .map(|(id, name)| json!({ "province_id": id, "province": name }))
        .collect();

    json!({
        "rajaongkir": {
            "query": [],
            "status": { "code": 200, "description": "OK" },
            "results": results
        }
    })
    .to_string()
}

/// Successful `/city` envelope from (id, type, name) triples
pub fn cities_body(province_id: &str, cities: &[(&str, &str, &str)]) -> String {
    let results: Vec<_> = cities
        .iter()
        .map(|(id, city_type, name)| {
            json!({
                "city_id": id,
                "province_id": province_id,
                "province": "Test Province",
                "type": city_type,
                "city_name": name,
                "postal_code": format!("1{:0>4}", id)
            })
        })
        .collect();

    json!({
        "rajaongkir": {
            "query": { "province": province_id },
            "status": { "code": 200, "description": "OK" },
            "results": results
        }
    })
    .to_string()
}

/// Envelope carrying a non-200 status and no results
pub fn envelope_error_body(code: u16, description: &str) -> String {
    json!({
        "rajaongkir": {
            "status": { "code": code, "description": description }
        }
    })
    .to_string()
}

/// Provider with two provinces: DKI Jakarta ("1") and Jawa Barat ("9")
pub fn storefront_transport() -> FakeTransport {
    FakeTransport::new()
        .reply(
            "province",
            FakeReply::ok(provinces_body(&[("1", "DKI Jakarta"), ("9", "Jawa Barat")])),
        )
        .reply(
            "city?province=1",
            FakeReply::ok(cities_body(
                "1",
                &[("101", "Kota", "JAKARTA PUSAT"), ("102", "Kota", "Jakarta Selatan")],
            )),
        )
        .reply(
            "city?province=9",
            FakeReply::ok(cities_body(
                "9",
                &[
                    ("78", "Kota", "Bogor"),
                    ("79", "Kabupaten", "Bogor"),
                    ("115", "Kota", "Depok"),
                    ("23", "Kota", "Bandung"),
                ],
            )),
        )
}

pub fn test_client(transport: Arc<FakeTransport>) -> RajaOngkirClient {
    RajaOngkirClient::new(transport, Arc::new(ResponseCache::new()), RetryPolicy::none())
}

pub fn test_session(transport: Arc<FakeTransport>) -> SessionHandle {
    SessionHandle::new(ShippingSession::new(
        Arc::new(test_client(transport)),
        Arc::new(TierPricingEngine::new(ShippingCostConfig::default())),
    ))
}

pub fn test_service(transport: Arc<FakeTransport>) -> ShippingService {
    let client = Arc::new(test_client(transport));
    let pricing = Arc::new(TierPricingEngine::new(ShippingCostConfig::default()));
    let registry = Arc::new(ShippingSessionRegistry::new(
        Arc::clone(&client),
        Arc::clone(&pricing),
        SessionConfig::default(),
    ));
    ShippingService::new(client, pricing, registry)
}
