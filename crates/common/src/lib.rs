//! VOC Atlas Common Library
//!
//! Shared code for the VOC Atlas catalog service including:
//! - Database entities, unit of work and repository
//! - VOC subclass hierarchy and ancestor resolution
//! - Subclass membership filters
//! - Bounding boxes and GeoJSON points
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod geo;
pub mod hierarchy;
pub mod membership;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository, UnitOfWork};
pub use hierarchy::{AncestorResolver, SubclassForest, SubclassId};
pub use membership::{CatalogStore, MembershipFilters};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default upper bound on subclass hierarchy depth
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 64;
