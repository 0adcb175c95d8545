//! SeaORM entity models
//!
//! Database entities for the VOC Atlas catalog

mod site;
mod dataset;
mod voc;
mod voc_subclass;
mod contact;
mod publication;
mod dataset_voc;
mod dataset_voc_subclass;
mod dataset_contact;
mod dataset_publication;

pub use site::{
    Entity as SiteEntity,
    Model as Site,
    ActiveModel as SiteActiveModel,
    Column as SiteColumn,
};

pub use dataset::{
    Entity as DatasetEntity,
    Model as Dataset,
    ActiveModel as DatasetActiveModel,
    Column as DatasetColumn,
    TimeResolutionUnit,
};

pub use voc::{
    Entity as VocEntity,
    Model as Voc,
    ActiveModel as VocActiveModel,
    Column as VocColumn,
};

pub use voc_subclass::{
    Entity as VocSubclassEntity,
    Model as VocSubclass,
    ActiveModel as VocSubclassActiveModel,
    Column as VocSubclassColumn,
};

pub use contact::{
    Entity as ContactEntity,
    Model as Contact,
    ActiveModel as ContactActiveModel,
    Column as ContactColumn,
};

pub use publication::{
    Entity as PublicationEntity,
    Model as Publication,
    ActiveModel as PublicationActiveModel,
    Column as PublicationColumn,
};

pub use dataset_voc::{
    Entity as DatasetVocEntity,
    Model as DatasetVoc,
    ActiveModel as DatasetVocActiveModel,
    Column as DatasetVocColumn,
};

pub use dataset_voc_subclass::{
    Entity as DatasetVocSubclassEntity,
    Model as DatasetVocSubclass,
    ActiveModel as DatasetVocSubclassActiveModel,
    Column as DatasetVocSubclassColumn,
};

pub use dataset_contact::{
    Entity as DatasetContactEntity,
    Model as DatasetContact,
    ActiveModel as DatasetContactActiveModel,
    Column as DatasetContactColumn,
};

pub use dataset_publication::{
    Entity as DatasetPublicationEntity,
    Model as DatasetPublication,
    ActiveModel as DatasetPublicationActiveModel,
    Column as DatasetPublicationColumn,
};
