use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/otp", post(request_otp))
        .route("/login", post(login))
}

pub fn protected_router() -> Router {
    Router::new().route("/me", get(me))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    services.accounts.register(&body.name, &body.email).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "User registered successfully" })),
    ))
}

pub async fn request_otp(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::OtpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let expires_at = services.accounts.request_otp(&body.email).await?;

    Ok(Json(json!({
        "msg": "OTP sent to your email",
        "expiresAt": expires_at,
    })))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let session = services.accounts.login(&body.email, &body.otp).await?;

    Ok(Json(json!({
        "token": session.token,
        "user": dto::user_json(&session.user),
    })))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let user = services.accounts.me(principal.principal()).await?;
    Ok(Json(dto::user_json(&user)))
}
