use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "certificate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub certificate_type: CertificateType,
    pub name: String,
    pub issuer: String,
    pub certificate_number: Option<String>,
    pub issue_date: Date,
    pub expiry_date: Option<Date>,
    pub attachment: Option<String>,
    pub is_verified: bool,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTimeWithTimeZone>,
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
pub enum CertificateType {
    #[sea_orm(string_value = "CERTIFICATE")]
    Certificate,
    #[sea_orm(string_value = "COMPLETION")]
    Completion,
    #[sea_orm(string_value = "COURSE")]
    Course,
    #[sea_orm(string_value = "LICENSE")]
    License,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl Model {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.map_or(false, |expiry| expiry < today)
    }
}

impl ActiveModelBehavior for ActiveModel {}
