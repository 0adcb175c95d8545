//! Dataset <-> VOC subclass link entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dataset_voc_subclasses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dataset_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub voc_subclass_id: i32,
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
        belongs_to = "super::voc_subclass::Entity",
        from = "Column::VocSubclassId",
        to = "super::voc_subclass::Column::Id",
        on_delete = "Cascade"
    )]
    VocSubclass,
}

impl ActiveModelBehavior for ActiveModel {}
