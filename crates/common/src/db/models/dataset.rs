//! Dataset entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unit of the sampling time resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum TimeResolutionUnit {
    #[sea_orm(string_value = "second")]
    Second,
    #[sea_orm(string_value = "hour")]
    Hour,
    #[sea_orm(string_value = "day")]
    Day,
    #[sea_orm(string_value = "week")]
    Week,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub site_id: Option<i32>,

    pub sampling_period_begin: Option<Date>,

    /// Must be after `sampling_period_begin` (check constraint)
    pub sampling_period_end: Option<Date>,

    pub time_resolution_unit: Option<TimeResolutionUnit>,

    pub time_resolution_interval: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub data_type: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub link_to_dataset: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::voc::Entity> for Entity {
    fn to() -> RelationDef {
        super::dataset_voc::Relation::Voc.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::dataset_voc::Relation::Dataset.def().rev())
    }
}

impl Related<super::voc_subclass::Entity> for Entity {
    fn to() -> RelationDef {
        super::dataset_voc_subclass::Relation::VocSubclass.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::dataset_voc_subclass::Relation::Dataset.def().rev())
    }
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        super::dataset_contact::Relation::Contact.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::dataset_contact::Relation::Dataset.def().rev())
    }
}

impl Related<super::publication::Entity> for Entity {
    fn to() -> RelationDef {
        super::dataset_publication::Relation::Publication.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::dataset_publication::Relation::Dataset.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
