//! VOC entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Volatile organic compound, tagged with at most one subclass
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vocs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub voc_subclass_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::voc_subclass::Entity",
        from = "Column::VocSubclassId",
        to = "super::voc_subclass::Column::Id"
    )]
    VocSubclass,
}

impl Related<super::voc_subclass::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VocSubclass.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
