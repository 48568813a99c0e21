use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(type_name = "key_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Available,
    Sold,
    Used,
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyStatus::Available => write!(f, "available"),
            KeyStatus::Sold => write!(f, "sold"),
            KeyStatus::Used => write!(f, "used"),
        }
    }
}

/// Inventory listing row. Key codes leave the service layer masked; the
/// plaintext only goes out through the reveal endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct SteamKeyMasked {
    pub id: i64,
    pub game_id: i64,
    pub title: String,
    pub status: KeyStatus,
    pub key_code_masked: String,
}

/// Accepts a single `key_code` or a bulk `key_codes` list; the two can be
/// combined.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddKeysRequest {
    pub game_id: i64,
    #[serde(default)]
    pub key_code: Option<String>,
    #[serde(default)]
    pub key_codes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddKeysResponse {
    pub added: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyListQuery {
    pub game_id: Option<i64>,
    /// Defaults to `available`; pass `all` for every status.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevealKeyResponse {
    pub key_code: String,
}
