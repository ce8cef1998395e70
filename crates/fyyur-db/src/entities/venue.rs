use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "venue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    /// Comma-joined genre tags, see [`crate::genres`]
    pub genres: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub website_link: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub seeking_description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::show::Entity")]
    Show,
}

impl Related<super::show::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Show.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
