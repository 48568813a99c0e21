use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::ApiResponse;
use crate::services::CatalogService;

#[utoipa::path(
    get,
    path = "/games",
    tag = "catalog",
    responses((status = 200, description = "Active games with available key counts"))
)]
pub async fn get_games(catalog_service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog_service.list_catalog().await {
        Ok(games) => Ok(HttpResponse::Ok().json(ApiResponse::success(games))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Game id")),
    responses(
        (status = 200, description = "Game detail"),
        (status = 404, description = "Missing or archived game")
    )
)]
pub async fn get_game(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match catalog_service.get_catalog_game(path.into_inner()).await {
        Ok(game) => Ok(HttpResponse::Ok().json(ApiResponse::success(game))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/games")
            .route("", web::get().to(get_games))
            .route("/{id}", web::get().to(get_game)),
    );
}
