use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::credentials::{register, verify_credentials};
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

/// Register a new user
///
/// POST /api/auth/register
///
/// Returns 201 on success, 400 when the body is not a JSON object of
/// strings, a field is missing, or the username or email is already taken.
pub async fn register_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;
    register(
        &state.db,
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// Exchange email and password for a bearer token
///
/// POST /api/auth/login
///
/// Unknown email and wrong password both answer 400 "Invalid credentials".
pub async fn login_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let user = verify_credentials(&state.db, &payload.email, &payload.password).await?;
    let token = state.tokens.issue(&user.id)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        token,
        message: "Login successful".to_string(),
    }))
}
