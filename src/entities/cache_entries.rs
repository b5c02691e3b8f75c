use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cache_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub location_key: String,

    /// `current`, `forecast` or `location`
    pub data_type: String,

    /// Serialized response body, returned verbatim on a hit
    #[sea_orm(column_type = "Text")]
    pub payload: String,

    pub created_at: String,

    /// RFC 3339 UTC with millisecond precision, compared as text
    pub expires_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
