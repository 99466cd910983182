use products_hr::payroll::{AllowanceMethod, AllowanceRule};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "allowance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub allowance_type: AllowanceType,
    pub calculation_method: CalculationMethod,
    pub default_amount: i64,
    pub is_taxable: bool,
    pub is_mandatory: bool,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum AllowanceType {
    #[sea_orm(string_value = "BASIC")]
    Basic,
    #[sea_orm(string_value = "DUTY")]
    Duty,
    #[sea_orm(string_value = "PERFORMANCE")]
    Performance,
    #[sea_orm(string_value = "WELFARE")]
    Welfare,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum CalculationMethod {
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "BASE_RATIO")]
    BaseRatio,
    #[sea_orm(string_value = "HOURLY")]
    Hourly,
    #[sea_orm(string_value = "DAILY")]
    Daily,
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
}

impl Model {
    pub fn rule(&self) -> AllowanceRule {
        let method = match self.calculation_method {
            CalculationMethod::Fixed => AllowanceMethod::Fixed,
            CalculationMethod::BaseRatio => AllowanceMethod::BaseRatio,
            CalculationMethod::Hourly => AllowanceMethod::Hourly,
            CalculationMethod::Daily => AllowanceMethod::Daily,
            CalculationMethod::Monthly => AllowanceMethod::Monthly,
        };
        AllowanceRule {
            code: self.code.clone(),
            method,
            amount: self.default_amount,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
