use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::config::RajaOngkirConfig;
use crate::features::shipping::clients::response_cache::ResponseCache;
use crate::features::shipping::models::{Locality, LocalityType, Region};
use crate::shared::constants::{RAJAONGKIR_KEY_HEADER, RAJAONGKIR_OK_STATUS};
use crate::shared::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateClientError {
    /// Connectivity, timeout, or body read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success status or a response that does not match the envelope
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The client itself could not be built from configuration
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl RateClientError {
    /// Only transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, RateClientError::Transport(_))
    }
}

/// Raw HTTP response from the provider
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP seam between the client and the provider
#[async_trait]
pub trait RateTransport: Send + Sync {
    /// GET `endpoint`, relative to the provider base URL, query string included
    async fn get(&self, endpoint: &str) -> Result<ProviderResponse, RateClientError>;
}

/// reqwest-backed transport that sends the API key and content type on every call
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &RajaOngkirConfig) -> Result<Self, RateClientError> {
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            RateClientError::Configuration(
                "RAJAONGKIR_API_KEY contains characters not allowed in a header".to_string(),
            )
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(RAJAONGKIR_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent("OngkirCore/0.1")
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RateClientError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl RateTransport for HttpTransport {
    async fn get(&self, endpoint: &str) -> Result<ProviderResponse, RateClientError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("RajaOngkir request: GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!("RajaOngkir request failed: {:?}", e);
            RateClientError::Transport(format!("RajaOngkir request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            RateClientError::Transport(format!("Failed to read RajaOngkir response: {}", e))
        })?;

        Ok(ProviderResponse { status, body })
    }
}

/// `{ "rajaongkir": { "status": {..}, "results": [..] } }`
#[derive(Debug, Deserialize)]
struct Envelope {
    rajaongkir: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    status: EnvelopeStatus,
    results: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeStatus {
    code: u16,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProvinceRecord {
    province_id: String,
    province: String,
}

#[derive(Debug, Deserialize)]
struct CityRecord {
    city_id: String,
    province_id: String,
    #[serde(rename = "type")]
    city_type: String,
    city_name: String,
    postal_code: Option<String>,
}

impl From<ProvinceRecord> for Region {
    fn from(record: ProvinceRecord) -> Self {
        Self {
            id: record.province_id,
            name: record.province,
        }
    }
}

impl TryFrom<CityRecord> for Locality {
    type Error = RateClientError;

    fn try_from(record: CityRecord) -> Result<Self, Self::Error> {
        let locality_type = record
            .city_type
            .parse::<LocalityType>()
            .map_err(|e| RateClientError::Provider(format!("City {}: {}", record.city_id, e)))?;

        Ok(Self {
            id: record.city_id,
            name: record.city_name,
            locality_type,
            region_id: record.province_id,
            postal_code: record.postal_code.filter(|code| !code.is_empty()),
        })
    }
}

/// Validates the provider envelope and extracts `results`
fn decode_results<T: DeserializeOwned>(
    response: ProviderResponse,
    what: &str,
) -> Result<Vec<T>, RateClientError> {
    if !(200..300).contains(&response.status) {
        let description = serde_json::from_str::<Envelope>(&response.body)
            .ok()
            .and_then(|envelope| envelope.rajaongkir.status.description);
        return Err(RateClientError::Provider(match description {
            Some(description) => format!(
                "{} request failed: HTTP {} - {}",
                what, response.status, description
            ),
            None => format!("{} request failed: HTTP {}", what, response.status),
        }));
    }

    let envelope: Envelope = serde_json::from_str(&response.body).map_err(|e| {
        RateClientError::Provider(format!("Malformed {} response: {}", what, e))
    })?;
    let body = envelope.rajaongkir;

    if body.status.code != RAJAONGKIR_OK_STATUS {
        return Err(RateClientError::Provider(format!(
            "{} request rejected with status {}: {}",
            what,
            body.status.code,
            body.status.description.unwrap_or_default()
        )));
    }

    let results = body.results.ok_or_else(|| {
        RateClientError::Provider(format!("{} response is missing results", what))
    })?;

    serde_json::from_value(results).map_err(|e| {
        RateClientError::Provider(format!("Unexpected {} results: {}", what, e))
    })
}

/// Client for the RajaOngkir province and city endpoints, backed by a response cache
pub struct RajaOngkirClient {
    transport: Arc<dyn RateTransport>,
    cache: Arc<ResponseCache>,
    retry: RetryPolicy,
}

impl RajaOngkirClient {
    pub fn new(
        transport: Arc<dyn RateTransport>,
        cache: Arc<ResponseCache>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            cache,
            retry,
        }
    }

    pub fn from_config(config: &RajaOngkirConfig) -> Result<Self, RateClientError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        let cache = Arc::new(ResponseCache::with_ttl(config.cache_ttl));
        let retry = RetryPolicy::new(
            config.max_retries,
            config.retry_base_delay_ms,
            config.retry_max_delay_ms,
        );

        Ok(Self::new(transport, cache, retry))
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// List all provinces, served from cache after the first success
    pub async fn list_regions(&self) -> Result<Arc<Vec<Region>>, RateClientError> {
        if let Some(regions) = self.cache.get_regions().await {
            tracing::debug!("Using cached province list ({} provinces)", regions.len());
            return Ok(regions);
        }

        let generation = self.cache.generation();
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let retry = self.retry;

        run_to_completion(async move {
            let records: Vec<ProvinceRecord> =
                fetch(transport.as_ref(), retry, "province", "Province").await?;
            let regions: Arc<Vec<Region>> =
                Arc::new(records.into_iter().map(Region::from).collect());

            if cache.put_regions(generation, Arc::clone(&regions)).await {
                tracing::info!("Fetched {} provinces from RajaOngkir", regions.len());
            }

            Ok(regions)
        })
        .await
    }

    /// List cities and regencies of one province, cached per province id
    pub async fn list_localities(
        &self,
        region_id: &str,
    ) -> Result<Arc<Vec<Locality>>, RateClientError> {
        let region_id = region_id.trim();
        if region_id.is_empty() {
            return Err(RateClientError::InvalidRequest(
                "Province id must not be empty".to_string(),
            ));
        }

        if let Some(localities) = self.cache.get_localities(region_id).await {
            tracing::debug!(
                "Using cached city list for province {} ({} cities)",
                region_id,
                localities.len()
            );
            return Ok(localities);
        }

        let generation = self.cache.generation();
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let retry = self.retry;
        let region_id = region_id.to_string();

        run_to_completion(async move {
            let endpoint = format!("city?province={}", urlencoding::encode(&region_id));
            let records: Vec<CityRecord> =
                fetch(transport.as_ref(), retry, &endpoint, "City").await?;
            let localities = records
                .into_iter()
                .map(Locality::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            let localities = Arc::new(localities);

            if cache
                .put_localities(generation, &region_id, Arc::clone(&localities))
                .await
            {
                tracing::info!(
                    "Fetched {} cities for province {} from RajaOngkir",
                    localities.len(),
                    region_id
                );
            }

            Ok(localities)
        })
        .await
    }
}

/// Drives a provider fetch on its own task. Once issued it finishes, cache
/// write included, even if the caller stops waiting for it.
async fn run_to_completion<T, F>(fetch: F) -> Result<T, RateClientError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, RateClientError>> + Send + 'static,
{
    tokio::spawn(fetch).await.map_err(|e| {
        tracing::error!("RajaOngkir fetch task failed: {}", e);
        RateClientError::Transport(format!("Fetch task failed: {}", e))
    })?
}

/// Issue a GET, retrying transport failures with backoff
async fn fetch<T: DeserializeOwned>(
    transport: &dyn RateTransport,
    retry: RetryPolicy,
    endpoint: &str,
    what: &str,
) -> Result<Vec<T>, RateClientError> {
    let mut attempt = 0;
    loop {
        match transport.get(endpoint).await {
            Ok(response) => {
                return decode_results(response, what).inspect_err(|e| {
                    tracing::error!("{} lookup failed: {}", what, e);
                });
            }
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.delay_for(attempt);
                tracing::warn!(
                    "{} request failed ({}), retrying in {:?} (attempt {}/{})",
                    what,
                    e,
                    delay,
                    attempt,
                    retry.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!("{} request failed: {}", what, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        cities_body, envelope_error_body, eventually, provinces_body, test_client, FakeReply,
        FakeTransport,
    };
    use axum::{routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio_test::{assert_err, assert_ok};

    async fn serve_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn http_config(base_url: String, timeout: Duration) -> RajaOngkirConfig {
        RajaOngkirConfig {
            base_url,
            api_key: "test-key".to_string(),
            timeout,
            max_retries: 0,
            retry_base_delay_ms: 0,
            retry_max_delay_ms: 0,
            cache_ttl: None,
        }
    }

    #[tokio::test]
    async fn test_list_regions_parses_envelope() {
        let transport = Arc::new(FakeTransport::new().reply(
            "province",
            FakeReply::ok(provinces_body(&[("1", "DKI Jakarta"), ("9", "Jawa Barat")])),
        ));
        let client = test_client(transport.clone());

        let regions = assert_ok!(client.list_regions().await);
        assert_eq!(
            *regions,
            vec![
                Region {
                    id: "1".to_string(),
                    name: "DKI Jakarta".to_string()
                },
                Region {
                    id: "9".to_string(),
                    name: "Jawa Barat".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_regions_is_cached() {
        let transport = Arc::new(
            FakeTransport::new().reply("province", FakeReply::ok(provinces_body(&[("1", "Bali")]))),
        );
        let client = test_client(transport.clone());

        assert_ok!(client.list_regions().await);
        assert_ok!(client.list_regions().await);
        assert_ok!(client.list_regions().await);

        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_cleared_cache_refetches() {
        let transport = Arc::new(
            FakeTransport::new().reply("province", FakeReply::ok(provinces_body(&[("1", "Bali")]))),
        );
        let client = test_client(transport.clone());

        assert_ok!(client.list_regions().await);
        client.cache().clear().await;
        assert_ok!(client.list_regions().await);

        assert_eq!(transport.requests_to("province"), 2);
    }

    #[tokio::test]
    async fn test_list_localities_maps_city_records() {
        let transport = Arc::new(FakeTransport::new().reply(
            "city?province=9",
            FakeReply::ok(cities_body(
                "9",
                &[("78", "Kota", "Bogor"), ("79", "Kabupaten", "Bogor")],
            )),
        ));
        let client = test_client(transport.clone());

        let localities = assert_ok!(client.list_localities("9").await);
        assert_eq!(localities.len(), 2);
        assert_eq!(localities[0].id, "78");
        assert_eq!(localities[0].locality_type, LocalityType::City);
        assert_eq!(localities[1].locality_type, LocalityType::Regency);
        assert_eq!(localities[1].region_id, "9");
        assert!(localities[0].postal_code.is_some());

        // Second call per province comes from cache, other provinces do not
        assert_ok!(client.list_localities("9").await);
        assert_eq!(transport.requests_to("city?province=9"), 1);
    }

    #[tokio::test]
    async fn test_list_localities_rejects_empty_id() {
        let transport = Arc::new(FakeTransport::new());
        let client = test_client(transport.clone());

        let err = assert_err!(client.list_localities("  ").await);
        assert!(matches!(err, RateClientError::InvalidRequest(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_http_error_is_provider_error() {
        let transport = Arc::new(FakeTransport::new().reply(
            "province",
            FakeReply::status(500, "Internal Server Error"),
        ));
        let client = test_client(transport.clone());

        let err = assert_err!(client.list_regions().await);
        assert!(matches!(err, RateClientError::Provider(ref msg) if msg.contains("HTTP 500")));
        assert!(client.cache().get_regions().await.is_none());
    }

    #[tokio::test]
    async fn test_http_error_includes_envelope_description() {
        let transport = Arc::new(FakeTransport::new().reply(
            "province",
            FakeReply::status(400, &envelope_error_body(400, "Invalid key.")),
        ));
        let client = test_client(transport);

        let err = assert_err!(client.list_regions().await);
        assert_eq!(
            err,
            RateClientError::Provider("Province request failed: HTTP 400 - Invalid key.".to_string())
        );
    }

    #[tokio::test]
    async fn test_envelope_status_mismatch_is_provider_error() {
        let transport = Arc::new(FakeTransport::new().reply(
            "province",
            FakeReply::ok(envelope_error_body(400, "Bad province")),
        ));
        let client = test_client(transport);

        let err = assert_err!(client.list_regions().await);
        assert!(matches!(err, RateClientError::Provider(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_provider_error() {
        let transport = Arc::new(
            FakeTransport::new()
                .reply("province", FakeReply::ok("<html>gateway</html>".to_string()))
                .reply(
                    "city?province=1",
                    FakeReply::ok(r#"{"rajaongkir":{"status":{"code":200}}}"#.to_string()),
                )
                .reply(
                    "city?province=2",
                    FakeReply::ok(cities_body("2", &[("5", "Kecamatan", "Nowhere")])),
                ),
        );
        let client = test_client(transport);

        assert!(matches!(
            client.list_regions().await,
            Err(RateClientError::Provider(_))
        ));
        assert!(matches!(
            client.list_localities("1").await,
            Err(RateClientError::Provider(ref msg)) if msg.contains("missing results")
        ));
        assert!(matches!(
            client.list_localities("2").await,
            Err(RateClientError::Provider(ref msg)) if msg.contains("Unknown locality type")
        ));
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let transport = Arc::new(
            FakeTransport::new()
                .reply("province", FakeReply::NetworkDown)
                .reply("province", FakeReply::NetworkDown)
                .reply("province", FakeReply::ok(provinces_body(&[("1", "Bali")]))),
        );
        let client = RajaOngkirClient::new(
            transport.clone(),
            Arc::new(ResponseCache::new()),
            RetryPolicy::new(2, 1, 5),
        );

        let regions = assert_ok!(client.list_regions().await);
        assert_eq!(regions.len(), 1);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let transport =
            Arc::new(FakeTransport::new().reply("province", FakeReply::NetworkDown));
        let client = RajaOngkirClient::new(
            transport.clone(),
            Arc::new(ResponseCache::new()),
            RetryPolicy::new(2, 1, 5),
        );

        let err = assert_err!(client.list_regions().await);
        assert!(matches!(err, RateClientError::Transport(_)));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_provider_errors_are_not_retried() {
        let transport = Arc::new(
            FakeTransport::new().reply("province", FakeReply::status(503, "Unavailable")),
        );
        let client = RajaOngkirClient::new(
            transport.clone(),
            Arc::new(ResponseCache::new()),
            RetryPolicy::new(3, 1, 5),
        );

        assert_err!(client.list_regions().await);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_not_coalesced() {
        let transport = Arc::new(
            FakeTransport::new().reply("province", FakeReply::ok(provinces_body(&[("1", "Bali")]))),
        );
        let client = test_client(transport.clone());

        let (first, second) = tokio::join!(client.list_regions(), client.list_regions());
        assert_eq!(assert_ok!(first), assert_ok!(second));
        assert!(transport.request_count() >= 1 && transport.request_count() <= 2);
    }

    #[tokio::test]
    async fn test_http_transport_sends_key_and_content_type() {
        async fn echo_headers(headers: axum::http::HeaderMap) -> Json<Value> {
            Json(json!({
                "key": headers.get("key").and_then(|v| v.to_str().ok()),
                "contentType": headers.get("content-type").and_then(|v| v.to_str().ok()),
            }))
        }

        let base = serve_provider(Router::new().route("/starter/province", get(echo_headers))).await;
        let transport =
            HttpTransport::new(&http_config(format!("{}/starter", base), Duration::from_secs(5)))
                .unwrap();

        let response = assert_ok!(transport.get("province").await);
        assert_eq!(response.status, 200);

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["key"], "test-key");
        assert_eq!(body["contentType"], "application/json");
    }

    #[tokio::test]
    async fn test_http_client_against_live_provider() {
        async fn cities() -> String {
            cities_body("9", &[("115", "Kota", "Depok")])
        }

        let base = serve_provider(Router::new().route("/starter/city", get(cities))).await;
        let client = RajaOngkirClient::from_config(&http_config(
            format!("{}/starter", base),
            Duration::from_secs(5),
        ))
        .unwrap();

        let localities = assert_ok!(client.list_localities("9").await);
        assert_eq!(localities[0].name, "Depok");

        // No route for /province on this server
        let err = assert_err!(client.list_regions().await);
        assert!(matches!(err, RateClientError::Provider(ref msg) if msg.contains("HTTP 404")));
    }

    #[tokio::test]
    async fn test_http_timeout_is_transport_error() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "late"
        }

        let base = serve_provider(Router::new().route("/province", get(slow))).await;
        let transport =
            HttpTransport::new(&http_config(base, Duration::from_millis(50))).unwrap();

        let err = assert_err!(transport.get("province").await);
        assert!(matches!(err, RateClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unusable_api_key_is_configuration_error() {
        let mut config = http_config("http://127.0.0.1:1".to_string(), Duration::from_secs(1));
        config.api_key = "line\nbreak".to_string();

        assert!(matches!(
            HttpTransport::new(&config),
            Err(RateClientError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_abandoned_fetch_still_fills_cache() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Arc::new(
            FakeTransport::new()
                .reply("province", FakeReply::ok(provinces_body(&[("1", "Bali")])))
                .gated(Arc::clone(&gate)),
        );
        let client = test_client(transport.clone());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), client.list_regions()).await;
        assert!(abandoned.is_err());

        gate.add_permits(1);
        let client = &client;
        eventually(move || async move { client.cache().stats().await.regions_cached }).await;
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_overlapping_clear_is_not_cached() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Arc::new(
            FakeTransport::new()
                .reply("province", FakeReply::ok(provinces_body(&[("1", "Bali")])))
                .gated(Arc::clone(&gate)),
        );
        let client = Arc::new(test_client(transport.clone()));

        let pending = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.list_regions().await }
        });
        let requests = &transport;
        eventually(move || async move { requests.request_count() == 1 }).await;

        client.cache().clear().await;
        gate.add_permits(1);

        // The caller still gets its answer, the cache does not keep it
        let regions = assert_ok!(pending.await.unwrap());
        assert_eq!(regions.len(), 1);
        assert!(!client.cache().stats().await.regions_cached);
    }
}
