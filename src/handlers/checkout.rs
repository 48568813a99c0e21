use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::current_user;
use crate::models::*;
use crate::services::OrderService;

#[utoipa::path(
    post,
    path = "/checkout/create-order",
    tag = "checkout",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order created from the cart, or open order reused"),
        (status = 400, description = "Cart is empty")
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.create_from_cart(user.id).await {
        // orderID at the top level, the shape the checkout page consumes
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "orderID": response.order_id
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/orders/{id}/payment-method",
    tag = "checkout",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order id")),
    request_body = SetPaymentMethodRequest,
    responses(
        (status = 200, description = "Payment method stored"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is no longer pending")
    )
)]
pub async fn set_payment_method(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetPaymentMethodRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service
        .set_payment_method(user.id, path.into_inner(), request.into_inner().method)
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "checkout",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with snapshot items and payment instructions"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service
        .get_order(path.into_inner(), user.id, user.is_admin)
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn checkout_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/checkout/create-order", web::post().to(create_order))
        .service(
            web::scope("/orders")
                .route("/{id}/payment-method", web::put().to(set_payment_method))
                .route("/{id}", web::get().to(get_order)),
        );
}
