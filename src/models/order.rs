use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Approved => write!(f, "approved"),
            OrderStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Qris,
    Bca,
    Seabank,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub total_price: i64,
}

/// Line item snapshot: title and price are frozen at order creation and stay
/// valid even when the catalog entry is later edited or archived.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub game_id: i64,
    pub title: String,
    pub price: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    #[serde(rename = "orderID")]
    pub order_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetPaymentMethodRequest {
    pub method: PaymentMethod,
}

/// Static instructions for the chosen payment method, straight from config.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentInstructions {
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qris_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_instructions: Option<PaymentInstructions>,
}

/// Moderation queue row: order plus the customer's email for the search box.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AdminOrderRow {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub total_price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminOrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModerateOrderRequest {
    pub status: OrderStatus,
}

/// Landing-page counters for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_purchase: i64,
    pub total_visitors: i64,
    pub need_confirm: i64,
}

/// Key assigned to an approved order, masked for the panel view.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignedKey {
    pub id: i64,
    pub game_id: i64,
    pub title: String,
    pub key_code_masked: String,
}
