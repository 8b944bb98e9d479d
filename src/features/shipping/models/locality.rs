use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Administrative kind of a locality (kota or kabupaten)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalityType {
    /// Kota
    City,
    /// Kabupaten
    Regency,
}

impl LocalityType {
    /// Label used by the provider ("Kota" / "Kabupaten")
    pub fn provider_label(&self) -> &'static str {
        match self {
            LocalityType::City => "Kota",
            LocalityType::Regency => "Kabupaten",
        }
    }
}

impl FromStr for LocalityType {
    type Err = String;

    /// Accepts provider labels and the English names, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KOTA" | "CITY" => Ok(LocalityType::City),
            "KABUPATEN" | "REGENCY" => Ok(LocalityType::Regency),
            other => Err(format!("Unknown locality type '{}'", other)),
        }
    }
}

impl fmt::Display for LocalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_label())
    }
}

/// City or regency within a province
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locality {
    pub id: String,
    pub name: String,
    pub locality_type: LocalityType,
    pub region_id: String,
    pub postal_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locality_type_parse() {
        assert_eq!("Kota".parse::<LocalityType>(), Ok(LocalityType::City));
        assert_eq!("KABUPATEN".parse::<LocalityType>(), Ok(LocalityType::Regency));
        assert_eq!(" kabupaten ".parse::<LocalityType>(), Ok(LocalityType::Regency));
        assert_eq!("city".parse::<LocalityType>(), Ok(LocalityType::City));
        assert!("Kecamatan".parse::<LocalityType>().is_err());
    }

    #[test]
    fn test_locality_type_provider_label() {
        assert_eq!(LocalityType::City.to_string(), "Kota");
        assert_eq!(LocalityType::Regency.provider_label(), "Kabupaten");
    }
}
