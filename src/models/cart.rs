use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub game_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

/// Cart row joined with its game. `subtotal` is display-only; the
/// authoritative total is computed server-side at order creation.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CartItemDetail {
    pub id: i64,
    pub game_id: i64,
    pub title: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItemDetail>,
    pub total: i64,
}
