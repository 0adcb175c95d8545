//! Geographic helpers for site locations
//!
//! Sites are stored as PostGIS points in WGS 84 (SRID 4326) and exposed over
//! the API as GeoJSON points. Area queries take an axis-aligned bounding box
//! in plain longitude/latitude: no projection correction and no antimeridian
//! wraparound.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Spatial reference id for WGS 84 longitude/latitude
pub const WGS84_SRID: i32 = 4326;

/// GeoJSON geometry type tag; only points are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    Point,
}

/// GeoJSON Point, `coordinates` is `[longitude, latitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: PointType,
    pub coordinates: [f64; 2],
}

impl GeoJsonPoint {
    /// Create a point from longitude and latitude
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: PointType::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Build a point from nullable stored columns; both must be present
    pub fn from_columns(longitude: Option<f64>, latitude: Option<f64>) -> Option<Self> {
        Some(Self::new(longitude?, latitude?))
    }

    /// Reject coordinates outside the WGS 84 range
    pub fn validate(&self) -> Result<()> {
        check_longitude("geo_location", self.longitude())?;
        check_latitude("geo_location", self.latitude())?;
        Ok(())
    }
}

/// Closed axis-aligned rectangle in longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a validated bounding box
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let bbox = Self { min_lon, min_lat, max_lon, max_lat };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check ranges and corner ordering
    pub fn validate(&self) -> Result<()> {
        check_longitude("min_lon", self.min_lon)?;
        check_longitude("max_lon", self.max_lon)?;
        check_latitude("min_lat", self.min_lat)?;
        check_latitude("max_lat", self.max_lat)?;

        if self.min_lon > self.max_lon {
            return Err(AppError::Validation {
                message: format!(
                    "min_lon {} is greater than max_lon {}",
                    self.min_lon, self.max_lon
                ),
                field: Some("min_lon".to_string()),
            });
        }

        if self.min_lat > self.max_lat {
            return Err(AppError::Validation {
                message: format!(
                    "min_lat {} is greater than max_lat {}",
                    self.min_lat, self.max_lat
                ),
                field: Some("min_lat".to_string()),
            });
        }

        Ok(())
    }

    /// Corners counter-clockwise from the south-west corner, closed back to it
    pub fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.min_lon, self.min_lat),
            (self.max_lon, self.min_lat),
            (self.max_lon, self.max_lat),
            (self.min_lon, self.max_lat),
            (self.min_lon, self.min_lat),
        ]
    }

    /// Well-known text polygon for `ST_GeomFromText`
    pub fn to_wkt(&self) -> String {
        let points = self
            .ring()
            .iter()
            .map(|(lon, lat)| format!("{} {}", lon, lat))
            .collect::<Vec<_>>()
            .join(", ");

        format!("POLYGON(({}))", points)
    }
}

fn check_longitude(field: &str, value: f64) -> Result<()> {
    check_range(field, value, 180.0)
}

fn check_latitude(field: &str, value: f64) -> Result<()> {
    check_range(field, value, 90.0)
}

fn check_range(field: &str, value: f64, limit: f64) -> Result<()> {
    if !value.is_finite() || value < -limit || value > limit {
        return Err(AppError::Validation {
            message: format!("{} must be within [-{limit}, {limit}], got {}", field, value),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}
