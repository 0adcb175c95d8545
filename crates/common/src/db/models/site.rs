//! Site entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Research site where datasets are collected.
///
/// The PostGIS `geo_location` column is generated from `longitude` and
/// `latitude` by the database and is only touched through raw predicates.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub region: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub typology: Option<String>,

    #[sea_orm(column_type = "Double", nullable)]
    pub longitude: Option<f64>,

    #[sea_orm(column_type = "Double", nullable)]
    pub latitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dataset::Entity")]
    Datasets,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
