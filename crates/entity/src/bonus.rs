use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bonus")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub bonus_type: BonusType,
    pub year: i32,
    pub quarter: Option<i32>,
    pub amount: i64,
    pub reason: Option<String>,
    pub status: Status,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub payment_date: Option<Date>,
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
pub enum BonusType {
    #[sea_orm(string_value = "PERFORMANCE")]
    Performance,
    #[sea_orm(string_value = "HOLIDAY")]
    Holiday,
    #[sea_orm(string_value = "SPECIAL")]
    Special,
    #[sea_orm(string_value = "RETIREMENT")]
    Retirement,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "REQUESTED")]
    Requested,
    #[sea_orm(string_value = "UNDER_REVIEW")]
    UnderReview,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "bonus";

    fn allows(self, next: Self) -> bool {
        match (self, next) {
            (Status::Requested, Status::UnderReview)
            | (Status::Requested, Status::Approved)
            | (Status::UnderReview, Status::Approved)
            | (Status::Approved, Status::Paid) => true,
            (from, Status::Cancelled) => !matches!(from, Status::Paid | Status::Cancelled),
            _ => false,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonuses_can_skip_review() {
        assert!(Status::Requested.advance(Status::Approved).is_ok());
        assert!(Status::UnderReview.advance(Status::Paid).is_err());
        assert!(Status::Approved.advance(Status::Cancelled).is_ok());
        assert!(Status::Paid.advance(Status::Cancelled).is_err());
    }
}
