//! `sea-orm` entity for the `posts` table.

use crate::model::post::Post;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub active: Option<bool>,
    pub created: DateTimeUtc,
    pub created_by: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub display_order: i32,
    pub is_deleted: bool,
    pub file_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            active: model.active,
            created: model.created,
            created_by: model.created_by,
            name: model.name,
            title: model.title,
            category: model.category,
            display_order: model.display_order,
            is_deleted: model.is_deleted,
            file_name: model.file_name,
        }
    }
}
