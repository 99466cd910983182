use products_hr::payroll::SalarySheet;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;

use crate::workflow::current;

/// Simple monthly salary sheet kept next to the payroll engine.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "salary")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub year: i32,
    pub month: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub base_salary: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub overtime_pay: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub meal_allowance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub childcare_allowance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub car_allowance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_salary: Decimal,
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

impl Model {
    pub fn sheet(&self) -> SalarySheet {
        SalarySheet {
            base_salary: self.base_salary,
            overtime_pay: self.overtime_pay,
            meal_allowance: self.meal_allowance,
            childcare_allowance: self.childcare_allowance,
            car_allowance: self.car_allowance,
        }
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let sheet = match (
            current(&self.base_salary),
            current(&self.overtime_pay),
            current(&self.meal_allowance),
            current(&self.childcare_allowance),
            current(&self.car_allowance),
        ) {
            (Some(base), Some(overtime), Some(meal), Some(childcare), Some(car)) => SalarySheet {
                base_salary: *base,
                overtime_pay: *overtime,
                meal_allowance: *meal,
                childcare_allowance: *childcare,
                car_allowance: *car,
            },
            _ => return Ok(self),
        };
        let total = sheet.total().map_err(|err| DbErr::Custom(err.to_string()))?;
        self.total_salary = ActiveValue::Set(total);
        Ok(self)
    }
}
