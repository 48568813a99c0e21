use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: i64, // rupiah
    pub image_url: Option<String>,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Catalog row: active game plus its count of unsold keys.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CatalogGame {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub available_keys: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    #[schema(example = "Elden Ring")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = 500000)]
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateGameRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminGameQuery {
    /// `active=1` hides archived games, matching the admin picker default.
    pub active: Option<u8>,
}

/// Outcome of an admin delete: hard delete when nothing references the game,
/// archive otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeleteGameOutcome {
    Deleted,
    Archived,
}
