use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::KeyService;

#[utoipa::path(
    get,
    path = "/admin/manage-steamkey",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("game_id" = Option<i64>, Query, description = "Filter by game"),
        ("status" = Option<String>, Query, description = "available (default), sold, used, or all"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Page size")
    ),
    responses((status = 200, description = "Masked key inventory"))
)]
pub async fn list_keys(
    key_service: web::Data<KeyService>,
    req: HttpRequest,
    query: web::Query<KeyListQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match key_service.list_keys(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/manage-steamkey",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = AddKeysRequest,
    responses(
        (status = 200, description = "Keys added as available"),
        (status = 400, description = "Duplicate or blank key code")
    )
)]
pub async fn add_keys(
    key_service: web::Data<KeyService>,
    req: HttpRequest,
    request: web::Json<AddKeysRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match key_service.add_keys(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/keys/{id}/reveal",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Steam key id")),
    responses(
        (status = 200, description = "Plaintext key code; the reveal is audit-logged"),
        (status = 404, description = "Key not found")
    )
)]
pub async fn reveal_key(
    key_service: web::Data<KeyService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let admin = match require_admin(&req) {
        Ok(admin) => admin,
        Err(e) => return Ok(e.error_response()),
    };

    match key_service.reveal(path.into_inner(), admin.id).await {
        // key_code at the top level, the shape the admin panel consumes
        Ok(revealed) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "key_code": revealed.key_code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}
