use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "work_schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub date: Date,
    pub schedule_type: ScheduleType,
    pub start_time: Time,
    pub end_time: Time,
    pub break_start: Option<Time>,
    pub break_end: Option<Time>,
    pub is_flexible: bool,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::EmployeeId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum ScheduleType {
    #[sea_orm(string_value = "REGULAR")]
    Regular,
    #[sea_orm(string_value = "HOLIDAY")]
    Holiday,
    #[sea_orm(string_value = "NIGHT")]
    Night,
    #[sea_orm(string_value = "SPECIAL")]
    Special,
}

impl ActiveModelBehavior for ActiveModel {}
