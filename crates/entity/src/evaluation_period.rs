use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "evaluation_period")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub year: i32,
    pub period_type: PeriodType,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub evaluation_start: Date,
    pub evaluation_end: Date,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum PeriodType {
    #[sea_orm(string_value = "FIRST_HALF")]
    FirstHalf,
    #[sea_orm(string_value = "SECOND_HALF")]
    SecondHalf,
    #[sea_orm(string_value = "ANNUAL")]
    Annual,
    #[sea_orm(string_value = "QUARTERLY")]
    Quarterly,
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
}

impl Model {
    pub fn is_evaluation_open(&self, today: NaiveDate) -> bool {
        self.evaluation_start <= today && today <= self.evaluation_end
    }
}

impl ActiveModelBehavior for ActiveModel {}
