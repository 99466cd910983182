use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// Appointment of an employee to an organization unit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "employee_organization")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub organization_id: Uuid,
    pub position_id: Option<Uuid>,
    pub job_title_id: Option<Uuid>,
    pub appointment_type: AppointmentType,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub base_salary: Option<i64>,
    pub allowances: Json,
    pub is_primary: bool,
    pub is_active: bool,
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
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum AppointmentType {
    #[sea_orm(string_value = "HIRE")]
    Hire,
    #[sea_orm(string_value = "PROMOTION")]
    Promotion,
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    #[sea_orm(string_value = "CONCURRENT")]
    Concurrent,
    #[sea_orm(string_value = "DISPATCH")]
    Dispatch,
    #[sea_orm(string_value = "RETURN")]
    Return,
    #[sea_orm(string_value = "RESIGNATION")]
    Resignation,
}

impl Model {
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.is_active && self.end_date.map_or(true, |end| end >= today)
    }

    pub fn duration_months(&self, today: NaiveDate) -> i32 {
        products_hr::calendar::duration_months(self.start_date, self.end_date, today)
    }
}

impl ActiveModelBehavior for ActiveModel {}
