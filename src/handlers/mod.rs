pub mod admin_games;
pub mod admin_keys;
pub mod admin_orders;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use auth::auth_config;
pub use cart::cart_config;
pub use catalog::catalog_config;
pub use checkout::checkout_config;

use actix_web::web;

/// Admin back-office routes, mounted under `/api/v1/admin`. Every handler
/// checks the admin role itself.
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/games", web::get().to(admin_games::list_games))
            .route("/games", web::post().to(admin_games::create_game))
            .route("/games/{id}", web::put().to(admin_games::update_game))
            .route("/games/{id}", web::delete().to(admin_games::delete_game))
            .route("/manage-steamkey", web::get().to(admin_keys::list_keys))
            .route("/manage-steamkey", web::post().to(admin_keys::add_keys))
            .route("/keys/{id}/reveal", web::post().to(admin_keys::reveal_key))
            .route("/data", web::get().to(admin_orders::dashboard_stats))
            .route("/orders", web::get().to(admin_orders::list_orders))
            .route(
                "/orders/{id}/keys",
                web::get().to(admin_orders::order_keys),
            )
            .route("/orders/{id}", web::put().to(admin_orders::moderate_order)),
    );
}
