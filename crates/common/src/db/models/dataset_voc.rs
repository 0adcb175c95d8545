//! Dataset <-> VOC link entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dataset_vocs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dataset_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub voc_id: i32,

    /// Instrument used to measure the VOC in this dataset
    #[sea_orm(column_type = "Text", nullable)]
    pub instrument: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::DatasetId",
        to = "super::dataset::Column::Id",
        on_delete = "Cascade"
    )]
    Dataset,

    #[sea_orm(
        belongs_to = "super::voc::Entity",
        from = "Column::VocId",
        to = "super::voc::Column::Id",
        on_delete = "Cascade"
    )]
    Voc,
}

impl Related<super::voc::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voc.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
