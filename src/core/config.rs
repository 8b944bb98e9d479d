use std::env;
use std::time::Duration;

use axum::http::HeaderValue;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub rajaongkir: RajaOngkirConfig,
    pub shipping: ShippingCostConfig,
    pub sessions: SessionConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Configuration for the RajaOngkir shipping-rate provider
#[derive(Debug, Clone)]
pub struct RajaOngkirConfig {
    /// Base URL, without trailing slash (e.g. "https://api.rajaongkir.com/starter")
    pub base_url: String,
    /// Sent as the `key` header on every request
    pub api_key: String,
    pub timeout: Duration,
    /// Extra attempts after the first one, transport failures only
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// `None` keeps cached reference data for the process lifetime
    pub cache_ttl: Option<Duration>,
}

/// Flat shipping cost per tier, in rupiah
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingCostConfig {
    pub bogor: i64,
    pub jabodetabek: i64,
    pub rest_of_country: i64,
}

/// Limits for the in-memory shipping session registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Live sessions allowed at once; creation beyond this is refused
    pub max_sessions: usize,
    /// Sessions untouched for this long are evicted
    pub idle_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            rajaongkir: RajaOngkirConfig::from_env()?,
            shipping: ShippingCostConfig::from_env()?,
            sessions: SessionConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RajaOngkirConfig {
    const DEFAULT_BASE_URL: &'static str = "https://api.rajaongkir.com/starter";
    const DEFAULT_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_MAX_RETRIES: u32 = 2;
    const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
    const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2000;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("RAJAONGKIR_API_KEY")
            .map_err(|_| "RAJAONGKIR_API_KEY environment variable is required".to_string())?;
        validate_api_key(&api_key)?;

        let base_url = env::var("RAJAONGKIR_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = env::var("RAJAONGKIR_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RAJAONGKIR_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_retries = env::var("RAJAONGKIR_MAX_RETRIES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_RETRIES.to_string())
            .parse::<u32>()
            .map_err(|_| "RAJAONGKIR_MAX_RETRIES must be a valid number".to_string())?;

        let retry_base_delay_ms = env::var("RAJAONGKIR_RETRY_BASE_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_RETRY_BASE_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "RAJAONGKIR_RETRY_BASE_DELAY_MS must be a valid number".to_string())?;

        let retry_max_delay_ms = env::var("RAJAONGKIR_RETRY_MAX_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_RETRY_MAX_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "RAJAONGKIR_RETRY_MAX_DELAY_MS must be a valid number".to_string())?;

        // Unset or 0 means cached entries never expire
        let cache_ttl = match env::var("RAJAONGKIR_CACHE_TTL_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    "RAJAONGKIR_CACHE_TTL_SECS must be a valid number".to_string()
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            retry_base_delay_ms,
            retry_max_delay_ms,
            cache_ttl,
        })
    }
}

/// The key travels as a header value, so it must be non-empty visible ASCII
fn validate_api_key(api_key: &str) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("RAJAONGKIR_API_KEY must not be empty".to_string());
    }

    HeaderValue::from_str(api_key)
        .map(|_| ())
        .map_err(|_| "RAJAONGKIR_API_KEY contains characters not allowed in a header".to_string())
}

impl ShippingCostConfig {
    const DEFAULT_BOGOR: i64 = 5000;
    const DEFAULT_JABODETABEK: i64 = 12000;
    const DEFAULT_REST_OF_COUNTRY: i64 = 20000;

    pub fn from_env() -> Result<Self, String> {
        let bogor = parse_cost("SHIPPING_COST_BOGOR", Self::DEFAULT_BOGOR)?;
        let jabodetabek = parse_cost("SHIPPING_COST_JABODETABEK", Self::DEFAULT_JABODETABEK)?;
        let rest_of_country = parse_cost(
            "SHIPPING_COST_REST_OF_COUNTRY",
            Self::DEFAULT_REST_OF_COUNTRY,
        )?;

        Ok(Self {
            bogor,
            jabodetabek,
            rest_of_country,
        })
    }
}

impl Default for ShippingCostConfig {
    fn default() -> Self {
        Self {
            bogor: Self::DEFAULT_BOGOR,
            jabodetabek: Self::DEFAULT_JABODETABEK,
            rest_of_country: Self::DEFAULT_REST_OF_COUNTRY,
        }
    }
}

fn parse_cost(var: &str, default: i64) -> Result<i64, String> {
    let cost = env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse::<i64>()
        .map_err(|_| format!("{} must be a valid number", var))?;

    if cost < 0 {
        return Err(format!("{} must not be negative", var));
    }

    Ok(cost)
}

impl SessionConfig {
    const DEFAULT_MAX_SESSIONS: usize = 10_000;
    const DEFAULT_IDLE_TTL_SECS: u64 = 30 * 60;

    pub fn from_env() -> Result<Self, String> {
        let max_sessions = env::var("SHIPPING_MAX_SESSIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_SESSIONS.to_string())
            .parse::<usize>()
            .map_err(|_| "SHIPPING_MAX_SESSIONS must be a valid number".to_string())?;

        if max_sessions == 0 {
            return Err("SHIPPING_MAX_SESSIONS must be at least 1".to_string());
        }

        let idle_ttl_secs = env::var("SHIPPING_SESSION_IDLE_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "SHIPPING_SESSION_IDLE_TTL_SECS must be a valid number".to_string())?;

        if idle_ttl_secs == 0 {
            return Err("SHIPPING_SESSION_IDLE_TTL_SECS must be at least 1".to_string());
        }

        Ok(Self {
            max_sessions,
            idle_ttl: Duration::from_secs(idle_ttl_secs),
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            idle_ttl: Duration::from_secs(Self::DEFAULT_IDLE_TTL_SECS),
        }
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Ongkir API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Shipping rate resolution API for the casing storefront".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
