use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::{KeyService, OrderService};

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "pending, approved or rejected"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Page size")
    ),
    responses((status = 200, description = "Orders with customer email, newest first"))
)]
pub async fn list_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<AdminOrderQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match order_service.admin_list_orders(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/data",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Dashboard counters"))
)]
pub async fn dashboard_stats(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match order_service.admin_stats().await {
        // Counters at the top level, the shape the dashboard consumes
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "totalPurchase": stats.total_purchase,
            "totalVisitors": stats.total_visitors,
            "needConfirm": stats.need_confirm
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/orders/{id}/keys",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order id")),
    responses((status = 200, description = "Keys assigned to the order, masked"))
)]
pub async fn order_keys(
    key_service: web::Data<KeyService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match key_service.keys_for_order(path.into_inner()).await {
        Ok(items) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "items": items
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/orders/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order id")),
    request_body = ModerateOrderRequest,
    responses(
        (status = 200, description = "Order approved (keys assigned) or rejected"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Insufficient stock, or order already moderated")
    )
)]
pub async fn moderate_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<ModerateOrderRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match order_service
        .moderate(path.into_inner(), request.into_inner().status)
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}
