pub mod rajaongkir_client;
pub mod response_cache;

pub use rajaongkir_client::{RajaOngkirClient, RateClientError};
pub use response_cache::CacheStats;
