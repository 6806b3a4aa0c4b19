//! News publication transitions.

use super::dto::NewsDtoConversion;
use super::resource::DtoConversion;
use crate::error::AppError;
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

pub async fn mark_as_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let news = state.news.mark_as_draft(&id).await?;
    Ok(success_one_ok(NewsDtoConversion.to_dto(&news)))
}

pub async fn mark_as_validated(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let news = state.news.mark_as_validated(&id).await?;
    Ok(success_one_ok(NewsDtoConversion.to_dto(&news)))
}

pub async fn mark_as_published(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let news = state.news.mark_as_published(&id).await?;
    Ok(success_one_ok(NewsDtoConversion.to_dto(&news)))
}
