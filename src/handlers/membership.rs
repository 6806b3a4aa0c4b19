//! Membership endpoints: sign-up, activation, password renewal.

use super::dto::AccountDtoConversion;
use super::resource::DtoConversion;
use crate::error::AppError;
use crate::membership::SignUpRequest;
use crate::response::{success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct NewPasswordBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordBody {
    pub password: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.membership.sign_up(request).await?;
    Ok(success_one(AccountDtoConversion.to_dto(&account)))
}

pub async fn activate(
    State(state): State<AppState>,
    Path((account_id, token)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.membership.activate(&account_id, &token).await?;
    Ok(success_one_ok(AccountDtoConversion.to_dto(&account)))
}

/// Always 202, whether or not the email belongs to an account.
pub async fn new_password(
    State(state): State<AppState>,
    Json(body): Json<NewPasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    state.membership.new_password(&body.email).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path((account_id, token)): Path<(String, String)>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .membership
        .reset_password(&account_id, &token, &body.password)
        .await?;
    Ok(success_one_ok(AccountDtoConversion.to_dto(&account)))
}
