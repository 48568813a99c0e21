use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::current_user;
use crate::models::*;
use crate::services::CartService;

#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Cart items with display total"))
)]
pub async fn get_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.list(user.id).await {
        Ok(cart) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": cart
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added or merged"),
        (status = 404, description = "Game missing or archived")
    )
)]
pub async fn add_item(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    request: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.add(user.id, request.into_inner()).await {
        Ok(item) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": item
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/cart/{id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated; zero removes the item"),
        (status = 404, description = "Cart item not found")
    )
)]
pub async fn update_item(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service
        .update_quantity(user.id, path.into_inner(), request.quantity)
        .await
    {
        Ok(Some(item)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": item
        }))),
        Ok(None) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Item removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/cart/{id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Cart item not found")
    )
)]
pub async fn delete_item(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.remove(user.id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Item removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn cart_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(get_cart))
            .route("", web::post().to(add_item))
            .route("/{id}", web::put().to(update_item))
            .route("/{id}", web::delete().to(delete_item)),
    );
}
