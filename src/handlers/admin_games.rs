use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::CatalogService;

#[utoipa::path(
    get,
    path = "/admin/games",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("active" = Option<u8>, Query, description = "active=1 hides archived games")),
    responses((status = 200, description = "All games, archived included by default"))
)]
pub async fn list_games(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    query: web::Query<AdminGameQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    let active_only = query.active == Some(1);
    match catalog_service.admin_list_games(active_only).await {
        Ok(games) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": games
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/games",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created"),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_game(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    request: web::Json<CreateGameRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match catalog_service.create_game(request.into_inner()).await {
        Ok(game) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": game
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/games/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Game id")),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Game updated"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn update_game(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateGameRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match catalog_service
        .update_game(path.into_inner(), request.into_inner())
        .await
    {
        Ok(game) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": game
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/games/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Game id")),
    responses(
        (status = 200, description = "Deleted, or archived when referenced by keys/orders"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn delete_game(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match catalog_service.delete_game(path.into_inner()).await {
        Ok(outcome) => {
            // The admin UI words its toast off this distinction
            let message = match outcome {
                DeleteGameOutcome::Deleted => "Game deleted",
                DeleteGameOutcome::Archived => "Game archived (image removed)",
            };
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": { "outcome": outcome },
                "message": message
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}
