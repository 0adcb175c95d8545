//! Dataset handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use super::require_matches;
use crate::AppState;
use vocatlas_common::{
    db::{
        models::{Dataset, TimeResolutionUnit},
        NewDataset, VocLink,
    },
    errors::{AppError, Result},
    geo::BoundingBox,
    membership::MembershipFilters,
    metrics,
};

/// Request to create a new dataset with its links
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDatasetRequest {
    pub site_id: Option<i32>,

    pub sampling_period_begin: Option<NaiveDate>,

    pub sampling_period_end: Option<NaiveDate>,

    pub time_resolution_unit: Option<TimeResolutionUnit>,

    #[validate(range(min = 1))]
    pub time_resolution_interval: Option<i32>,

    #[validate(length(min = 1, max = 255))]
    pub data_type: Option<String>,

    #[validate(url)]
    pub link_to_dataset: Option<String>,

    /// VOCs measured in this dataset
    #[serde(default)]
    #[validate(nested)]
    pub vocs: Vec<VocLinkRequest>,

    /// Subclasses the dataset is tagged with directly
    #[serde(default)]
    pub voc_subclass_ids: Vec<i32>,

    #[serde(default)]
    pub contact_ids: Vec<i32>,

    #[serde(default)]
    pub publication_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VocLinkRequest {
    pub voc_id: i32,

    #[validate(length(min = 1, max = 255))]
    pub instrument: Option<String>,
}

impl CreateDatasetRequest {
    /// Field checks plus sampling period ordering
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if let (Some(begin), Some(end)) = (self.sampling_period_begin, self.sampling_period_end) {
            if end <= begin {
                return Err(AppError::Validation {
                    message: format!(
                        "sampling_period_end {} must be after sampling_period_begin {}",
                        end, begin
                    ),
                    field: Some("sampling_period_end".to_string()),
                });
            }
        }

        Ok(())
    }
}

impl From<CreateDatasetRequest> for NewDataset {
    fn from(request: CreateDatasetRequest) -> Self {
        NewDataset {
            site_id: request.site_id,
            sampling_period_begin: request.sampling_period_begin,
            sampling_period_end: request.sampling_period_end,
            time_resolution_unit: request.time_resolution_unit,
            time_resolution_interval: request.time_resolution_interval,
            data_type: request.data_type,
            link_to_dataset: request.link_to_dataset,
            vocs: request
                .vocs
                .into_iter()
                .map(|v| VocLink { voc_id: v.voc_id, instrument: v.instrument })
                .collect(),
            voc_subclass_ids: request.voc_subclass_ids,
            contact_ids: request.contact_ids,
            publication_ids: request.publication_ids,
        }
    }
}

/// Create a dataset and its VOC, subclass, contact and publication links
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(request): Json<CreateDatasetRequest>,
) -> Result<(StatusCode, Json<Dataset>)> {
    request.check()?;

    let link_count = request.vocs.len()
        + request.voc_subclass_ids.len()
        + request.contact_ids.len()
        + request.publication_ids.len();

    let uow = state.db.unit_of_work().await?;
    let dataset = uow.repository().create_dataset(request.into()).await?;
    uow.commit().await?;

    metrics::record_created("dataset");
    tracing::info!(dataset_id = dataset.id, links = link_count, "Dataset created");

    Ok((StatusCode::CREATED, Json(dataset)))
}

/// List all datasets
pub async fn list_datasets(State(state): State<AppState>) -> Result<Json<Vec<Dataset>>> {
    let uow = state.db.read_unit_of_work().await?;
    let datasets = uow.repository().list_datasets().await?;
    uow.commit().await?;

    Ok(Json(datasets))
}

/// Datasets collected at a site
pub async fn datasets_by_site(
    State(state): State<AppState>,
    Path(site_id): Path<i32>,
) -> Result<Json<Vec<Dataset>>> {
    let uow = state.db.read_unit_of_work().await?;
    let datasets = uow.repository().datasets_by_site(site_id).await?;
    uow.commit().await?;

    Ok(Json(datasets))
}

/// Datasets whose site lies in a country
pub async fn datasets_by_country(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Result<Json<Vec<Dataset>>> {
    let uow = state.db.read_unit_of_work().await?;
    let datasets = uow.repository().datasets_by_country(&country).await?;
    uow.commit().await?;

    Ok(Json(datasets))
}

/// Datasets that belong to a VOC subclass, directly or through their VOCs
pub async fn datasets_by_subclass(
    State(state): State<AppState>,
    Path(subclass_name): Path<String>,
) -> Result<Json<Vec<Dataset>>> {
    let uow = state.db.read_unit_of_work().await?;
    let repo = uow.repository();
    let datasets = MembershipFilters::new(&repo, state.config.hierarchy.max_depth)
        .datasets_matching_subclass(&subclass_name)
        .await?;
    uow.commit().await?;

    tracing::debug!(subclass = %subclass_name, count = datasets.len(), "Datasets by subclass");

    Ok(Json(datasets))
}

/// Datasets whose site is inside a bounding box, edges included
pub async fn datasets_by_area(
    State(state): State<AppState>,
    Path(bbox): Path<BoundingBox>,
) -> Result<Json<Vec<Dataset>>> {
    bbox.validate()?;

    let uow = state.db.read_unit_of_work().await?;
    let datasets = uow.repository().datasets_in_bounding_box(&bbox).await?;
    uow.commit().await?;

    let datasets = require_matches(datasets, || "No datasets found in the specified area".to_string())?;
    Ok(Json(datasets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn request(json: serde_json::Value) -> CreateDatasetRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_full_request_maps_links() {
        let req = request(serde_json::json!({
            "site_id": 1,
            "sampling_period_begin": "2021-01-01",
            "sampling_period_end": "2021-12-31",
            "time_resolution_unit": "hour",
            "time_resolution_interval": 1,
            "link_to_dataset": "https://data.example.org/d/1",
            "vocs": [{"voc_id": 3, "instrument": "PTR-ToF-MS"}, {"voc_id": 4}],
            "voc_subclass_ids": [2],
            "contact_ids": [5],
        }));
        assert_ok!(req.check());

        let new = NewDataset::from(req);
        assert_eq!(new.time_resolution_unit, Some(TimeResolutionUnit::Hour));
        assert_eq!(new.vocs.len(), 2);
        assert_eq!(new.vocs[0].instrument.as_deref(), Some("PTR-ToF-MS"));
        assert_eq!(new.voc_subclass_ids, vec![2]);
        assert!(new.publication_ids.is_empty());
    }

    #[test]
    fn test_sampling_period_must_move_forward() {
        let req = request(serde_json::json!({
            "sampling_period_begin": "2021-06-01",
            "sampling_period_end": "2021-06-01",
        }));
        let err = req.check().unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation { field: Some(ref f), .. } if f == "sampling_period_end"
        ));

        let open_ended = request(serde_json::json!({"sampling_period_begin": "2021-06-01"}));
        assert_ok!(open_ended.check());
    }

    #[test]
    fn test_bad_link_rejected() {
        let req = request(serde_json::json!({"link_to_dataset": "not a url"}));
        assert_err!(req.check());
    }

    #[test]
    fn test_unknown_time_unit_fails_to_parse() {
        let parsed = serde_json::from_value::<CreateDatasetRequest>(
            serde_json::json!({"time_resolution_unit": "fortnight"}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let req = request(serde_json::json!({"time_resolution_interval": 0}));
        assert!(matches!(req.check(), Err(AppError::Validation { .. })));
    }
}
