//! Research site handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::require_matches;
use crate::AppState;
use vocatlas_common::{
    db::{models::Site, NewSite},
    errors::{AppError, Result},
    geo::{BoundingBox, GeoJsonPoint},
    metrics,
};

/// Request to create a new site
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSiteRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub region: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub country: String,

    #[validate(length(min = 1, max = 255))]
    pub typology: Option<String>,

    /// GeoJSON point, `[longitude, latitude]`
    pub geo_location: Option<GeoJsonPoint>,
}

impl CreateSiteRequest {
    /// Field checks plus the coordinate range of the location
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if let Some(point) = &self.geo_location {
            point.validate()?;
        }

        Ok(())
    }
}

impl From<CreateSiteRequest> for NewSite {
    fn from(request: CreateSiteRequest) -> Self {
        NewSite {
            name: request.name,
            region: request.region,
            country: request.country,
            typology: request.typology,
            geo_location: request.geo_location,
        }
    }
}

/// Site as returned by the API
#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub id: i32,
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: String,
    pub typology: Option<String>,
    pub geo_location: Option<GeoJsonPoint>,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        SiteResponse {
            id: site.id,
            geo_location: GeoJsonPoint::from_columns(site.longitude, site.latitude),
            name: site.name,
            region: site.region,
            country: site.country,
            typology: site.typology,
        }
    }
}

fn to_responses(sites: Vec<Site>) -> Vec<SiteResponse> {
    sites.into_iter().map(SiteResponse::from).collect()
}

/// Create a new site
pub async fn create_site(
    State(state): State<AppState>,
    Json(request): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<SiteResponse>)> {
    request.check()?;

    let uow = state.db.unit_of_work().await?;
    let site = uow.repository().create_site(request.into()).await?;
    uow.commit().await?;

    metrics::record_created("site");
    tracing::info!(site_id = site.id, country = %site.country, "Site created");

    Ok((StatusCode::CREATED, Json(site.into())))
}

/// List all sites
pub async fn list_sites(State(state): State<AppState>) -> Result<Json<Vec<SiteResponse>>> {
    let uow = state.db.read_unit_of_work().await?;
    let sites = uow.repository().list_sites().await?;
    uow.commit().await?;

    Ok(Json(to_responses(sites)))
}

/// Get a site by ID
pub async fn get_site(
    State(state): State<AppState>,
    Path(site_id): Path<i32>,
) -> Result<Json<SiteResponse>> {
    let uow = state.db.read_unit_of_work().await?;
    let site = uow
        .repository()
        .find_site_by_id(site_id)
        .await?
        .ok_or_else(|| AppError::not_found("Site", site_id))?;
    uow.commit().await?;

    Ok(Json(site.into()))
}

/// Sites located inside a bounding box, edges included
pub async fn sites_by_area(
    State(state): State<AppState>,
    Path(bbox): Path<BoundingBox>,
) -> Result<Json<Vec<SiteResponse>>> {
    bbox.validate()?;

    let uow = state.db.read_unit_of_work().await?;
    let sites = uow.repository().sites_in_bounding_box(&bbox).await?;
    uow.commit().await?;

    tracing::debug!(count = sites.len(), bbox = %bbox.to_wkt(), "Sites by area");

    let sites = require_matches(sites, || "No site found in the specified area".to_string())?;
    Ok(Json(to_responses(sites)))
}
