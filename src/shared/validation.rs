use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for RajaOngkir identifiers (province_id, city_id)
    /// Must be a non-empty string of digits
    /// - Valid: "6", "152", "0001"
    /// - Invalid: "", "6a", "-1", " 6"
    pub static ref PROVIDER_ID_REGEX: Regex = Regex::new(r"^[0-9]+$").unwrap();
}
