use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::catalog::get_games,
        handlers::catalog::get_game,
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::update_item,
        handlers::cart::delete_item,
        handlers::checkout::create_order,
        handlers::checkout::set_payment_method,
        handlers::checkout::get_order,
        handlers::admin_games::list_games,
        handlers::admin_games::create_game,
        handlers::admin_games::update_game,
        handlers::admin_games::delete_game,
        handlers::admin_keys::list_keys,
        handlers::admin_keys::add_keys,
        handlers::admin_keys::reveal_key,
        handlers::admin_orders::dashboard_stats,
        handlers::admin_orders::list_orders,
        handlers::admin_orders::order_keys,
        handlers::admin_orders::moderate_order,
    ),
    components(
        schemas(
            User,
            UserResponse,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            RefreshResponse,
            AuthResponse,
            Role,
            Game,
            CatalogGame,
            CreateGameRequest,
            UpdateGameRequest,
            DeleteGameOutcome,
            KeyStatus,
            SteamKeyMasked,
            AddKeysRequest,
            AddKeysResponse,
            RevealKeyResponse,
            AddCartItemRequest,
            UpdateCartItemRequest,
            CartItemDetail,
            CartResponse,
            Order,
            OrderItem,
            OrderStatus,
            PaymentMethod,
            CreateOrderResponse,
            SetPaymentMethodRequest,
            PaymentInstructions,
            OrderDetailResponse,
            AdminOrderRow,
            AdminStats,
            ModerateOrderRequest,
            AssignedKey,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Session API"),
        (name = "catalog", description = "Customer catalog API"),
        (name = "cart", description = "Cart API"),
        (name = "checkout", description = "Checkout and order summary API"),
        (name = "admin", description = "Back-office API"),
    ),
    info(
        title = "Keyshop Backend API",
        version = "1.0.0",
        description = "Steam key shop REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
