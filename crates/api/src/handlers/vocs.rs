//! VOC handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use vocatlas_common::{
    db::models::Voc,
    errors::Result,
    membership::MembershipFilters,
    metrics,
};

/// Request to create a new VOC
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVocRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub voc_subclass_id: Option<i32>,
}

/// Create a new VOC
pub async fn create_voc(
    State(state): State<AppState>,
    Json(request): Json<CreateVocRequest>,
) -> Result<(StatusCode, Json<Voc>)> {
    request.validate()?;

    let uow = state.db.unit_of_work().await?;
    let voc = uow
        .repository()
        .create_voc(request.name, request.voc_subclass_id)
        .await?;
    uow.commit().await?;

    metrics::record_created("voc");
    tracing::info!(voc_id = voc.id, name = %voc.name, "VOC created");

    Ok((StatusCode::CREATED, Json(voc)))
}

/// List all VOCs
pub async fn list_vocs(State(state): State<AppState>) -> Result<Json<Vec<Voc>>> {
    let uow = state.db.read_unit_of_work().await?;
    let vocs = uow.repository().list_vocs().await?;
    uow.commit().await?;

    Ok(Json(vocs))
}

/// VOCs whose subclass is the named subclass or one of its descendants
pub async fn vocs_by_subclass(
    State(state): State<AppState>,
    Path(subclass_name): Path<String>,
) -> Result<Json<Vec<Voc>>> {
    let uow = state.db.read_unit_of_work().await?;
    let repo = uow.repository();
    let vocs = MembershipFilters::new(&repo, state.config.hierarchy.max_depth)
        .vocs_matching_subclass(&subclass_name)
        .await?;
    uow.commit().await?;

    Ok(Json(vocs))
}
