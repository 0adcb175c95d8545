//! VOC subclass taxonomy handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use vocatlas_common::{
    db::models::VocSubclass,
    errors::Result,
    hierarchy::SubclassId,
    membership::MembershipFilters,
    metrics,
};

/// Request to create a new VOC subclass
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVocSubclassRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Parent subclass; `None` creates a root
    pub parent_id: Option<i32>,
}

/// Reflexive ancestor set of a subclass
#[derive(Debug, Serialize)]
pub struct AncestorsResponse {
    pub subclass_id: SubclassId,
    pub ancestor_ids: Vec<SubclassId>,
}

/// Create a new VOC subclass
pub async fn create_voc_subclass(
    State(state): State<AppState>,
    Json(request): Json<CreateVocSubclassRequest>,
) -> Result<(StatusCode, Json<VocSubclass>)> {
    request.validate()?;

    let uow = state.db.unit_of_work().await?;
    let subclass = uow
        .repository()
        .create_voc_subclass(request.name, request.parent_id)
        .await?;
    uow.commit().await?;

    metrics::record_created("voc_subclass");
    tracing::info!(
        subclass_id = subclass.id,
        parent_id = ?subclass.parent_id,
        name = %subclass.name,
        "VOC subclass created"
    );

    Ok((StatusCode::CREATED, Json(subclass)))
}

/// List all VOC subclasses
pub async fn list_voc_subclasses(State(state): State<AppState>) -> Result<Json<Vec<VocSubclass>>> {
    let uow = state.db.read_unit_of_work().await?;
    let subclasses = uow.repository().list_voc_subclasses().await?;
    uow.commit().await?;

    Ok(Json(subclasses))
}

/// Ancestor ids of a subclass, the subclass itself included
pub async fn subclass_ancestors(
    State(state): State<AppState>,
    Path(subclass_id): Path<SubclassId>,
) -> Result<Json<AncestorsResponse>> {
    let uow = state.db.read_unit_of_work().await?;
    let repo = uow.repository();
    let ancestors = MembershipFilters::new(&repo, state.config.hierarchy.max_depth)
        .resolve_ancestors(subclass_id)
        .await?;
    uow.commit().await?;

    Ok(Json(AncestorsResponse {
        subclass_id,
        ancestor_ids: ancestors.into_iter().collect(),
    }))
}

/// Subclass of a VOC followed by its ancestors, nearest first
pub async fn subclasses_by_voc(
    State(state): State<AppState>,
    Path(voc_id): Path<i32>,
) -> Result<Json<Vec<VocSubclass>>> {
    let uow = state.db.read_unit_of_work().await?;
    let repo = uow.repository();
    let subclasses = MembershipFilters::new(&repo, state.config.hierarchy.max_depth)
        .subclasses_for_voc(voc_id)
        .await?;
    uow.commit().await?;

    Ok(Json(subclasses))
}
