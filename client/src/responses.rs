use serde::{Deserialize, Serialize};

/// Envelope returned by the API on every successful call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub status: String,
    pub error: Option<String>,
    pub data: Option<ZipRecord>,
}

/// Postal metadata for a single zip code.
///
/// All fields are strings, including latitude/longitude. The API quotes the
/// coordinates and the client passes them through without parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipRecord {
    pub zipcode: String,
    pub state_abbr: String,
    pub latitude: String,
    pub longitude: String,
    pub city: String,
    pub state: String,
}

/// Failure envelope: `{"status":"error","error":"<message>","data":null}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}
