// =============================================================================
// SHIPPING TIERS
// =============================================================================

/// Locality name that gets the cheapest flat rate, for both Kabupaten and Kota
pub const BOGOR_LOCALITY: &str = "BOGOR";

/// Locality types (uppercased) eligible for the Bogor tier
pub const BOGOR_LOCALITY_TYPES: [&str; 2] = ["KABUPATEN", "KOTA"];

/// Greater Jakarta localities (uppercased), excluding Bogor
pub const JABODETABEK_LOCALITIES: [&str; 9] = [
    "JAKARTA UTARA",
    "JAKARTA SELATAN",
    "JAKARTA TIMUR",
    "JAKARTA BARAT",
    "JAKARTA PUSAT",
    "TANGERANG",
    "TANGERANG SELATAN",
    "BEKASI",
    "DEPOK",
];

// =============================================================================
// RAJAONGKIR
// =============================================================================

/// Header carrying the RajaOngkir API key
pub const RAJAONGKIR_KEY_HEADER: &str = "key";

/// Envelope status code for a successful RajaOngkir call
pub const RAJAONGKIR_OK_STATUS: u16 = 200;
