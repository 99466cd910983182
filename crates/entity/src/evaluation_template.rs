use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Scored items are stored as `[{id, name, weight}]`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "evaluation_template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub items: Json,
    #[sea_orm(column_type = "Decimal(Some((3, 1)))")]
    pub max_score: Decimal,
    #[sea_orm(column_type = "Decimal(Some((3, 1)))")]
    pub min_score: Decimal,
    pub weight_total: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
