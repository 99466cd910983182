use products_hr::payroll::sum_prefixed;
use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

/// Monthly pay line for one employee; (employee, year, month) is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "payroll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub salary_grade_id: Option<Uuid>,
    pub base_salary: i64,
    pub total_allowances: i64,
    pub total_deductions: i64,
    pub gross_pay: i64,
    pub net_pay: i64,
    pub allowances_detail: Json,
    pub deductions_detail: Json,
    pub payment_date: Option<Date>,
    pub payment_method: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub status: Status,
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
        belongs_to = "super::salary_grade::Entity",
        from = "Column::SalaryGradeId",
        to = "super::salary_grade::Column::Id",
        on_delete = "SetNull"
    )]
    SalaryGrade,
}

impl Related<super::salary_grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalaryGrade.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "payroll";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Status::Draft, Status::Confirmed)
                | (Status::Confirmed, Status::Paid)
                | (Status::Draft, Status::Cancelled)
                | (Status::Confirmed, Status::Cancelled)
        )
    }
}

impl Model {
    pub fn tax_amount(&self) -> i64 {
        sum_prefixed(&self.deductions_detail, "tax_")
    }

    pub fn insurance_amount(&self) -> i64 {
        sum_prefixed(&self.deductions_detail, "insurance_")
    }
}

impl ActiveModelBehavior for ActiveModel {}
