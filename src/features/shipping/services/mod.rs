pub mod session_registry;
pub mod shipping_service;
pub mod shipping_session;
pub mod tier_pricing;

pub use session_registry::ShippingSessionRegistry;
pub use shipping_service::ShippingService;
pub use shipping_session::{RegionsState, SelectionState, ShippingSession};
pub use tier_pricing::TierPricingEngine;
