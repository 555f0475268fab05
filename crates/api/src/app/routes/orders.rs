use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/user", get(list_my_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_status))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::PlaceOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let cmd = body.into_command(principal.user_id());
    let order = services.orders.place_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(dto::order_json(&order))))
}

/// Admin: every order with its customer.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let views = services.orders.list_all(principal.principal()).await?;
    Ok(Json(views.iter().map(dto::admin_order_json).collect::<Vec<_>>()))
}

pub async fn list_my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let views = services.orders.list_for_user(principal.principal()).await?;
    Ok(Json(views.iter().map(dto::user_order_json).collect::<Vec<_>>()))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = dto::parse_order_id(&id)?;
    let order = services.orders.get_order(principal.principal(), id).await?;
    Ok(Json(dto::order_json(&order)))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let id = dto::parse_order_id(&id)?;
    let order = services
        .orders
        .update_status(principal.principal(), id, &body.status)
        .await?;
    Ok(Json(dto::order_json(&order)))
}
