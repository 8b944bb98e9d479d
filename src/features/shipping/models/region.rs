use serde::{Deserialize, Serialize};

/// Province (provinsi) as returned by the shipping-rate provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
}
