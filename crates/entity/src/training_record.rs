use products_hr::{HrError, HrResult};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "training_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub training_type: TrainingType,
    pub title: String,
    pub provider: Option<String>,
    pub start_date: Date,
    pub end_date: Date,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub hours: Decimal,
    pub training_cost: i64,
    pub company_cost: i64,
    pub personal_cost: i64,
    pub completion_status: CompletionStatus,
    pub satisfaction_rating: Option<i32>,
    pub effectiveness_rating: Option<i32>,
    pub certificate_file: Option<String>,
    pub is_approved: bool,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
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
pub enum TrainingType {
    #[sea_orm(string_value = "INTERNAL")]
    Internal,
    #[sea_orm(string_value = "EXTERNAL")]
    External,
    #[sea_orm(string_value = "ONLINE")]
    Online,
    #[sea_orm(string_value = "WORKSHOP")]
    Workshop,
    #[sea_orm(string_value = "SEMINAR")]
    Seminar,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum CompletionStatus {
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "EXPECTED")]
    Expected,
    #[sea_orm(string_value = "INCOMPLETE")]
    Incomplete,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Model {
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Ratings run from 1 to 5.
pub fn validate_rating(field: &str, rating: Option<i32>) -> HrResult<()> {
    match rating {
        Some(value) if !(1..=5).contains(&value) => Err(HrError::out_of_range(field, 1, 5)),
        _ => Ok(()),
    }
}

/// The company and employee shares cannot exceed the course price.
pub fn validate_costs(training_cost: i64, company_cost: i64, personal_cost: i64) -> HrResult<()> {
    if [training_cost, company_cost, personal_cost].iter().any(|c| *c < 0) {
        return Err(HrError::Validation("training costs cannot be negative".into()));
    }
    if company_cost + personal_cost > training_cost {
        return Err(HrError::Validation(format!(
            "company ({}) and personal ({}) costs exceed the training cost ({})",
            company_cost, personal_cost, training_cost
        )));
    }
    Ok(())
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_outside_one_to_five_fail() {
        assert!(validate_rating("satisfaction", Some(0)).is_err());
        assert!(validate_rating("satisfaction", Some(6)).is_err());
        assert!(validate_rating("satisfaction", Some(5)).is_ok());
        assert!(validate_rating("satisfaction", None).is_ok());
    }

    #[test]
    fn cost_shares_are_capped() {
        assert!(validate_costs(1_000, 600, 400).is_ok());
        assert!(validate_costs(1_000, 700, 400).is_err());
    }
}
