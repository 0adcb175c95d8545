//! Repository pattern for database operations
//!
//! Provides a clean interface for all catalog data access. A repository
//! borrows the connection it runs on, normally the transaction of a
//! [`UnitOfWork`](crate::db::UnitOfWork), so every statement of one request
//! commits or rolls back together.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::geo::{BoundingBox, GeoJsonPoint, WGS84_SRID};
use crate::hierarchy::SubclassId;
use crate::membership::CatalogStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

/// Site to insert
#[derive(Debug, Clone)]
pub struct NewSite {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: String,
    pub typology: Option<String>,
    pub geo_location: Option<GeoJsonPoint>,
}

/// VOC measured by a new dataset
#[derive(Debug, Clone)]
pub struct VocLink {
    pub voc_id: i32,
    pub instrument: Option<String>,
}

/// Dataset to insert, together with its link rows
#[derive(Debug, Clone, Default)]
pub struct NewDataset {
    pub site_id: Option<i32>,
    pub sampling_period_begin: Option<NaiveDate>,
    pub sampling_period_end: Option<NaiveDate>,
    pub time_resolution_unit: Option<TimeResolutionUnit>,
    pub time_resolution_interval: Option<i32>,
    pub data_type: Option<String>,
    pub link_to_dataset: Option<String>,
    pub vocs: Vec<VocLink>,
    pub voc_subclass_ids: Vec<i32>,
    pub contact_ids: Vec<i32>,
    pub publication_ids: Vec<i32>,
}

/// Repository for data access operations
pub struct Repository<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> Repository<'c, C> {
    /// Create a repository running on the given connection or transaction
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Site Operations
    // ========================================================================

    /// Create a new site
    pub async fn create_site(&self, site: NewSite) -> Result<Site> {
        let (longitude, latitude) = match site.geo_location {
            Some(point) => (Some(point.longitude()), Some(point.latitude())),
            None => (None, None),
        };

        let model = SiteActiveModel {
            name: Set(site.name),
            region: Set(site.region),
            country: Set(site.country),
            typology: Set(site.typology),
            longitude: Set(longitude),
            latitude: Set(latitude),
            ..Default::default()
        };

        model.insert(self.conn).await.map_err(AppError::from_insert)
    }

    /// List all sites
    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        SiteEntity::find()
            .order_by_asc(SiteColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Find site by ID
    pub async fn find_site_by_id(&self, id: i32) -> Result<Option<Site>> {
        SiteEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Sites whose location lies inside or on the edge of the box
    pub async fn sites_in_bounding_box(&self, bbox: &BoundingBox) -> Result<Vec<Site>> {
        SiteEntity::find()
            .filter(covered_by(bbox))
            .order_by_asc(SiteColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Dataset Operations
    // ========================================================================

    /// Create a dataset and all of its link rows
    pub async fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset> {
        let model = DatasetActiveModel {
            site_id: Set(dataset.site_id),
            sampling_period_begin: Set(dataset.sampling_period_begin),
            sampling_period_end: Set(dataset.sampling_period_end),
            time_resolution_unit: Set(dataset.time_resolution_unit),
            time_resolution_interval: Set(dataset.time_resolution_interval),
            data_type: Set(dataset.data_type),
            link_to_dataset: Set(dataset.link_to_dataset),
            ..Default::default()
        };

        let created = model.insert(self.conn).await.map_err(AppError::from_insert)?;

        for voc in dataset.vocs {
            DatasetVocActiveModel {
                dataset_id: Set(created.id),
                voc_id: Set(voc.voc_id),
                instrument: Set(voc.instrument),
            }
            .insert(self.conn)
            .await
            .map_err(AppError::from_insert)?;
        }

        for voc_subclass_id in dataset.voc_subclass_ids {
            DatasetVocSubclassActiveModel {
                dataset_id: Set(created.id),
                voc_subclass_id: Set(voc_subclass_id),
            }
            .insert(self.conn)
            .await
            .map_err(AppError::from_insert)?;
        }

        for contact_id in dataset.contact_ids {
            DatasetContactActiveModel {
                dataset_id: Set(created.id),
                contact_id: Set(contact_id),
            }
            .insert(self.conn)
            .await
            .map_err(AppError::from_insert)?;
        }

        for publication_id in dataset.publication_ids {
            DatasetPublicationActiveModel {
                dataset_id: Set(created.id),
                publication_id: Set(publication_id),
            }
            .insert(self.conn)
            .await
            .map_err(AppError::from_insert)?;
        }

        Ok(created)
    }

    /// List all datasets
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        DatasetEntity::find()
            .order_by_asc(DatasetColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Find dataset by ID
    pub async fn find_dataset_by_id(&self, id: i32) -> Result<Option<Dataset>> {
        DatasetEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Datasets collected at a site
    pub async fn datasets_by_site(&self, site_id: i32) -> Result<Vec<Dataset>> {
        DatasetEntity::find()
            .filter(DatasetColumn::SiteId.eq(site_id))
            .order_by_asc(DatasetColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Datasets whose site is in the given country
    pub async fn datasets_by_country(&self, country: &str) -> Result<Vec<Dataset>> {
        DatasetEntity::find()
            .inner_join(SiteEntity)
            .filter(SiteColumn::Country.eq(country))
            .order_by_asc(DatasetColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Datasets whose site lies inside or on the edge of the box.
    ///
    /// Datasets without a site never match.
    pub async fn datasets_in_bounding_box(&self, bbox: &BoundingBox) -> Result<Vec<Dataset>> {
        DatasetEntity::find()
            .inner_join(SiteEntity)
            .filter(covered_by(bbox))
            .order_by_asc(DatasetColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // VOC Operations
    // ========================================================================

    /// Create a new VOC
    pub async fn create_voc(&self, name: String, voc_subclass_id: Option<i32>) -> Result<Voc> {
        let model = VocActiveModel {
            name: Set(name),
            voc_subclass_id: Set(voc_subclass_id),
            ..Default::default()
        };

        model.insert(self.conn).await.map_err(AppError::from_insert)
    }

    /// List all VOCs
    pub async fn list_vocs(&self) -> Result<Vec<Voc>> {
        VocEntity::find()
            .order_by_asc(VocColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Find VOC by ID
    pub async fn find_voc_by_id(&self, id: i32) -> Result<Option<Voc>> {
        VocEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // VOC Subclass Operations
    // ========================================================================

    /// Create a new VOC subclass; an unknown parent is rejected by the store
    pub async fn create_voc_subclass(&self, name: String, parent_id: Option<i32>) -> Result<VocSubclass> {
        let model = VocSubclassActiveModel {
            name: Set(name),
            parent_id: Set(parent_id),
            ..Default::default()
        };

        model.insert(self.conn).await.map_err(AppError::from_insert)
    }

    /// List all VOC subclasses
    pub async fn list_voc_subclasses(&self) -> Result<Vec<VocSubclass>> {
        VocSubclassEntity::find()
            .order_by_asc(VocSubclassColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Find VOC subclass by its unique name
    pub async fn find_voc_subclass_by_name(&self, name: &str) -> Result<Option<VocSubclass>> {
        VocSubclassEntity::find()
            .filter(VocSubclassColumn::Name.eq(name))
            .one(self.conn)
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Contact Operations
    // ========================================================================

    /// Create a new contact
    pub async fn create_contact(
        &self,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Contact> {
        let model = ContactActiveModel {
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            ..Default::default()
        };

        model.insert(self.conn).await.map_err(AppError::from_insert)
    }

    /// List all contacts
    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        ContactEntity::find()
            .order_by_asc(ContactColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Contacts linked to a dataset; the dataset must exist
    pub async fn contacts_for_dataset(&self, dataset_id: i32) -> Result<Vec<Contact>> {
        let dataset = self
            .find_dataset_by_id(dataset_id)
            .await?
            .ok_or_else(|| AppError::not_found("Dataset", dataset_id))?;

        dataset
            .find_related(ContactEntity)
            .order_by_asc(ContactColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Publication Operations
    // ========================================================================

    /// Create a new publication
    pub async fn create_publication(&self, link: String) -> Result<Publication> {
        let model = PublicationActiveModel {
            link: Set(link),
            ..Default::default()
        };

        model.insert(self.conn).await.map_err(AppError::from_insert)
    }

    /// List all publications
    pub async fn list_publications(&self) -> Result<Vec<Publication>> {
        PublicationEntity::find()
            .order_by_asc(PublicationColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    /// Publications linked to a dataset; the dataset must exist
    pub async fn publications_for_dataset(&self, dataset_id: i32) -> Result<Vec<Publication>> {
        let dataset = self
            .find_dataset_by_id(dataset_id)
            .await?
            .ok_or_else(|| AppError::not_found("Dataset", dataset_id))?;

        dataset
            .find_related(PublicationEntity)
            .order_by_asc(PublicationColumn::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }
}

/// `sites.geo_location` covered by the box, boundary included
fn covered_by(bbox: &BoundingBox) -> SimpleExpr {
    Expr::cust_with_values(
        format!(
            r#"ST_Covers(ST_GeomFromText($1, {}), "sites"."geo_location")"#,
            WGS84_SRID
        ),
        [bbox.to_wkt()],
    )
}

#[async_trait]
impl<'c, C> CatalogStore for Repository<'c, C>
where
    C: ConnectionTrait + Sync,
{
    async fn subclass_by_name(&self, name: &str) -> Result<Option<VocSubclass>> {
        self.find_voc_subclass_by_name(name).await
    }

    async fn subclasses(&self) -> Result<Vec<VocSubclass>> {
        self.list_voc_subclasses().await
    }

    async fn voc_by_id(&self, id: i32) -> Result<Option<Voc>> {
        self.find_voc_by_id(id).await
    }

    async fn vocs(&self) -> Result<Vec<Voc>> {
        self.list_vocs().await
    }

    async fn datasets(&self) -> Result<Vec<Dataset>> {
        self.list_datasets().await
    }

    async fn dataset_subclass_tags(&self) -> Result<Vec<(i32, SubclassId)>> {
        let links = DatasetVocSubclassEntity::find().all(self.conn).await?;

        Ok(links
            .into_iter()
            .map(|link| (link.dataset_id, link.voc_subclass_id))
            .collect())
    }

    async fn dataset_voc_subclass_tags(&self) -> Result<Vec<(i32, Option<SubclassId>)>> {
        let links = DatasetVocEntity::find()
            .find_also_related(VocEntity)
            .all(self.conn)
            .await?;

        Ok(links
            .into_iter()
            .map(|(link, voc)| (link.dataset_id, voc.and_then(|v| v.voc_subclass_id)))
            .collect())
    }
}
