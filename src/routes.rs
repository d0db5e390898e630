use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::AppState;

fn cors_layer(allowed: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() || allowed.split(',').any(|o| o.trim() == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: AppState) -> Router {
    // Per-IP fixed window on credential endpoints
    let auth_limiter = RateLimiter::per_minute(state.config.auth_rate_limit_per_minute);

    let credential_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/change-password", post(handlers::auth::change_password))
        .route_layer(middleware::from_fn_with_state(
            auth_limiter,
            rate_limit_middleware,
        ));

    let auth_routes = Router::new()
        .route("/user/:user_id", get(handlers::user::get_user))
        .route("/me", patch(handlers::user::update_profile))
        .merge(credential_routes);

    let google_routes = Router::new()
        .route("/auth/google", get(handlers::google::redirect))
        .route("/auth/google/callback", get(handlers::google::callback));

    let user_routes = Router::new()
        .route("/", get(handlers::user::list_users))
        .route("/:id", delete(handlers::user::delete_user));

    let slot_routes = Router::new()
        .route("/available", get(handlers::slots::available))
        .route(
            "/",
            get(handlers::slots::list).post(handlers::slots::create),
        )
        .route("/defaults", post(handlers::slots::create_defaults))
        .route(
            "/:id",
            put(handlers::slots::update).delete(handlers::slots::delete),
        );

    let appointment_routes = Router::new()
        .route(
            "/",
            get(handlers::appointments::list).post(handlers::appointments::create),
        )
        .route("/mine", get(handlers::appointments::mine))
        .route("/scan", post(handlers::appointments::scan))
        .route(
            "/:id",
            get(handlers::appointments::get)
                .patch(handlers::appointments::admin_update)
                .delete(handlers::appointments::delete),
        )
        .route("/:id/status", patch(handlers::appointments::update_status))
        .route(
            "/:id/generate-qr",
            post(handlers::appointments::generate_qr),
        );

    let closure_routes = Router::new()
        .route(
            "/",
            get(handlers::closures::list).post(handlers::closures::create),
        )
        .route("/:id", delete(handlers::closures::delete));

    let window_routes = Router::new()
        .route(
            "/",
            get(handlers::windows::list).post(handlers::windows::create),
        )
        .route("/active", get(handlers::windows::active))
        .route(
            "/:id",
            put(handlers::windows::update).delete(handlers::windows::delete),
        );

    let announcement_routes = Router::new()
        .route(
            "/",
            get(handlers::announcements::list).post(handlers::announcements::create),
        )
        .route(
            "/:id",
            put(handlers::announcements::update).delete(handlers::announcements::delete),
        );

    let idcard_routes = Router::new()
        .route(
            "/",
            get(handlers::idcards::list).post(handlers::idcards::issue),
        )
        .route("/mine", get(handlers::idcards::mine))
        .route("/:id/return", patch(handlers::idcards::mark_returned))
        .route("/:id/history", get(handlers::idcards::history));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/google", google_routes)
        .nest("/users", user_routes)
        .nest("/slots", slot_routes)
        .nest("/appointments", appointment_routes)
        .nest("/calendar-closures", closure_routes)
        .nest("/scheduling-windows", window_routes)
        .nest("/announcements", announcement_routes)
        .nest("/idcards", idcard_routes);

    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}
