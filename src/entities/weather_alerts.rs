use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "weather_alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub location_key: String,

    /// `weather` or `farming`
    pub alert_type: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// `low`, `medium` or `high`
    pub severity: String,

    pub is_active: bool,

    pub created_at: String,

    pub expires_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
