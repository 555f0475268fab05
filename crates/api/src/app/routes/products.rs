use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use storefront_catalog::{NewProduct, ProductPatch};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

/// Admin writes; the role check happens in the catalog service.
pub fn protected_router() -> Router {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = services.catalog.list().await?;
    Ok(Json(products.iter().map(dto::product_json).collect::<Vec<_>>()))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = dto::parse_product_id(&id)?;
    let product = services.catalog.get(id).await?;
    Ok(Json(dto::product_json(&product)))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let product = services.catalog.create(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(dto::product_json(&product))))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = body?;
    let id = dto::parse_product_id(&id)?;
    let product = services.catalog.update(principal.principal(), id, patch).await?;
    Ok(Json(dto::product_json(&product)))
}
