//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub mood: String,
    /// JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub date_created: String,
    pub date_edited: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        let tags = match model.tags {
            Json::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            id: model.id,
            title: model.title,
            text: model.text,
            mood: model.mood,
            tags,
            date_created: model.date_created,
            date_edited: model.date_edited,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            text: Set(post.text),
            mood: Set(post.mood),
            tags: Set(Json::from(post.tags)),
            date_created: Set(post.date_created),
            date_edited: Set(post.date_edited),
        }
    }
}
