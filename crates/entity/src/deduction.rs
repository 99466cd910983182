use products_hr::payroll::{DeductionMethod, DeductionRule};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "deduction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub deduction_type: DeductionType,
    pub calculation_method: CalculationMethod,
    /// Percentage points.
    #[sea_orm(column_type = "Decimal(Some((6, 3)))")]
    pub rate: Decimal,
    pub default_amount: i64,
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
pub enum DeductionType {
    #[sea_orm(string_value = "STATUTORY")]
    Statutory,
    #[sea_orm(string_value = "VOLUNTARY")]
    Voluntary,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum CalculationMethod {
    #[sea_orm(string_value = "RATE")]
    Rate,
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "BASE_RATIO")]
    BaseRatio,
}

impl Model {
    pub fn rule(&self) -> DeductionRule {
        let method = match self.calculation_method {
            CalculationMethod::Rate => DeductionMethod::Rate,
            CalculationMethod::Fixed => DeductionMethod::Fixed,
            CalculationMethod::BaseRatio => DeductionMethod::BaseRatio,
        };
        DeductionRule {
            code: self.code.clone(),
            method,
            rate: self.rate,
            amount: self.default_amount,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
