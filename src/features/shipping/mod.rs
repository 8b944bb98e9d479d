//! Shipping-rate resolution feature.
//!
//! Looks up provinces and cities from the RajaOngkir API (cached in-process),
//! classifies the chosen city into a flat-rate tier, and keeps per-shopper
//! shipping sessions for the checkout flow.
//!
//! ## Tiers
//!
//! | Tier | Destinations | Default cost |
//! |------|--------------|--------------|
//! | `BOGOR` | Kota/Kabupaten Bogor | 5000 |
//! | `JABODETABEK` | Jakarta (5 kota), Tangerang, Tangerang Selatan, Bekasi, Depok | 12000 |
//! | `REST_OF_COUNTRY` | everything else | 20000 |
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/shipping/provinces` | List all provinces |
//! | GET | `/api/shipping/provinces/{id}/cities` | List cities in a province |
//! | POST | `/api/shipping/quote` | Quote a destination by name and type |
//! | GET | `/api/shipping/cache` | Response cache statistics |
//! | POST | `/api/shipping/sessions` | Start a shipping session |
//! | GET | `/api/shipping/sessions/{id}` | Session snapshot |
//! | DELETE | `/api/shipping/sessions/{id}` | Discard a session |
//! | POST | `/api/shipping/sessions/{id}/provinces` | Load provinces into the session |
//! | PUT | `/api/shipping/sessions/{id}/province` | Choose a province |
//! | PUT | `/api/shipping/sessions/{id}/city` | Choose a city |
//! | GET | `/api/shipping/sessions/{id}/cost` | Current shipping cost |
//! | POST | `/api/shipping/sessions/{id}/reset` | Reset session and response cache |

pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use clients::RajaOngkirClient;
pub use services::{ShippingService, ShippingSessionRegistry, TierPricingEngine};
