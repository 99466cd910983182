use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "education")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub school_name: String,
    pub major: Option<String>,
    pub degree: Degree,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((4, 2)))", nullable)]
    pub gpa: Option<Decimal>,
    pub status: Status,
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
pub enum Degree {
    #[sea_orm(string_value = "HIGH_SCHOOL")]
    HighSchool,
    #[sea_orm(string_value = "ASSOCIATE")]
    Associate,
    #[sea_orm(string_value = "BACHELOR")]
    Bachelor,
    #[sea_orm(string_value = "MASTER")]
    Master,
    #[sea_orm(string_value = "DOCTORATE")]
    Doctorate,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "GRADUATED")]
    Graduated,
    #[sea_orm(string_value = "ENROLLED")]
    Enrolled,
    #[sea_orm(string_value = "DROPPED_OUT")]
    DroppedOut,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

impl ActiveModelBehavior for ActiveModel {}
