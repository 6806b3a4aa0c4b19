//! Permissions granted to an account (admin only).

use super::dto::PermissionDtoConversion;
use super::resource::DtoConversion;
use crate::error::AppError;
use crate::response::success_many;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn list(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.resources().find_one(&account_id).await?;
    let permissions = state.permissions.find_for_account(&account_id).await?;
    Ok(success_many(
        permissions.iter().map(|p| PermissionDtoConversion.to_dto(p)).collect(),
    ))
}

pub async fn grant(
    State(state): State<AppState>,
    Path((account_id, permission_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.resources().find_one(&account_id).await?;
    state.permissions.add_to_account(&account_id, &permission_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke(
    State(state): State<AppState>,
    Path((account_id, permission_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permissions
        .remove_from_account(&account_id, &permission_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
