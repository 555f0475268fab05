use axum::Router;

pub mod auth;
pub mod orders;
pub mod products;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/products", products::public_router())
}

/// Endpoints that require a verified token (mounted behind the auth middleware).
pub fn protected_router() -> Router {
    Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/products", products::protected_router())
        .nest("/orders", orders::router())
}
