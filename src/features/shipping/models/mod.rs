pub mod locality;
pub mod region;
pub mod tier;

pub use locality::{Locality, LocalityType};
pub use region::Region;
pub use tier::{ShippingQuote, ShippingTier};
