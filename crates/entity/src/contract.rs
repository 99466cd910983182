use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "contract")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub contract_type: ContractType,
    pub title: String,
    pub counterparty: String,
    pub content: Option<String>,
    pub key_terms: Json,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub contract_amount: Option<i64>,
    pub employee_signature: Option<String>,
    pub company_signature: Option<String>,
    pub status: Status,
    pub signed_at: Option<DateTimeWithTimeZone>,
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
pub enum ContractType {
    #[sea_orm(string_value = "EMPLOYMENT")]
    Employment,
    #[sea_orm(string_value = "BUSINESS")]
    Business,
    #[sea_orm(string_value = "NDA")]
    Nda,
    #[sea_orm(string_value = "NON_COMPETE")]
    NonCompete,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "UNDER_REVIEW")]
    UnderReview,
    #[sea_orm(string_value = "SIGNED")]
    Signed,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "ENDED")]
    Ended,
    #[sea_orm(string_value = "TERMINATED")]
    Terminated,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "contract";

    /// Whether both signatures are present for SIGNED is checked by the caller.
    fn allows(self, next: Self) -> bool {
        match next {
            Status::Draft => self == Status::UnderReview,
            Status::UnderReview => self == Status::Draft,
            Status::Signed => matches!(self, Status::Draft | Status::UnderReview),
            Status::Active => self == Status::Signed,
            Status::Ended => self == Status::Active,
            Status::Terminated => !matches!(self, Status::Ended | Status::Terminated),
        }
    }
}

impl Model {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        products_hr::calendar::within(self.start_date, self.end_date, today)
    }

    pub fn is_fully_signed(&self) -> bool {
        self.employee_signature.is_some() && self.company_signature.is_some()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contracts_move_forward_to_a_final_state() {
        assert!(Status::Draft.advance(Status::UnderReview).is_ok());
        assert!(Status::UnderReview.advance(Status::Draft).is_ok());
        assert!(Status::Signed.advance(Status::Active).is_ok());
        assert!(Status::Active.advance(Status::Ended).is_ok());
        assert!(Status::Active.advance(Status::Terminated).is_ok());

        assert!(Status::Draft.advance(Status::Active).is_err());
        assert!(Status::Signed.advance(Status::Draft).is_err());
        assert!(Status::Ended.advance(Status::Terminated).is_err());
        assert!(Status::Terminated.advance(Status::Active).is_err());
    }
}
