use products_hr::payroll::pension_payout;
use products_hr::{HrResult, PensionPlan};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "retirement_pension")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub pension_type: PensionType,
    pub start_date: Date,
    pub monthly_contribution: i64,
    pub total_contribution: i64,
    pub payout_amount: Option<i64>,
    pub payout_method: PayoutMethod,
    pub status: Status,
    pub retirement_date: Option<Date>,
    pub payout_date: Option<Date>,
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
pub enum PensionType {
    #[sea_orm(string_value = "DB")]
    DefinedBenefit,
    #[sea_orm(string_value = "DC")]
    DefinedContribution,
    #[sea_orm(string_value = "IRP")]
    Individual,
}

impl From<PensionType> for PensionPlan {
    fn from(value: PensionType) -> Self {
        match value {
            PensionType::DefinedBenefit => PensionPlan::DefinedBenefit,
            PensionType::DefinedContribution => PensionPlan::DefinedContribution,
            PensionType::Individual => PensionPlan::Individual,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum PayoutMethod {
    #[sea_orm(string_value = "LUMP_SUM")]
    LumpSum,
    #[sea_orm(string_value = "ANNUITY")]
    Annuity,
    #[sea_orm(string_value = "MIXED")]
    Mixed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "CALCULATING")]
    Calculating,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

impl Model {
    pub fn calculate_payout(&self) -> HrResult<i64> {
        pension_payout(self.pension_type.into(), self.total_contribution)
    }
}

impl ActiveModelBehavior for ActiveModel {}
