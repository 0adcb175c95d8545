//! Publication handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use vocatlas_common::{db::models::Publication, errors::Result, metrics};

/// Request to create a new publication
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePublicationRequest {
    #[validate(url)]
    pub link: String,
}

/// Create a new publication
pub async fn create_publication(
    State(state): State<AppState>,
    Json(request): Json<CreatePublicationRequest>,
) -> Result<(StatusCode, Json<Publication>)> {
    request.validate()?;

    let uow = state.db.unit_of_work().await?;
    let publication = uow.repository().create_publication(request.link).await?;
    uow.commit().await?;

    metrics::record_created("publication");
    tracing::info!(publication_id = publication.id, "Publication created");

    Ok((StatusCode::CREATED, Json(publication)))
}

/// List all publications
pub async fn list_publications(State(state): State<AppState>) -> Result<Json<Vec<Publication>>> {
    let uow = state.db.read_unit_of_work().await?;
    let publications = uow.repository().list_publications().await?;
    uow.commit().await?;

    Ok(Json(publications))
}

/// Publications of a dataset
pub async fn publications_by_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i32>,
) -> Result<Json<Vec<Publication>>> {
    let uow = state.db.read_unit_of_work().await?;
    let publications = uow.repository().publications_for_dataset(dataset_id).await?;
    uow.commit().await?;

    Ok(Json(publications))
}
