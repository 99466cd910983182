use sea_orm::entity::prelude::*;

use super::document_template::DocumentType;
use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "document_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub document_type: DocumentType,
    pub title: String,
    pub purpose: String,
    pub quantity: i32,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub additional_info: Json,
    #[sea_orm(indexed)]
    pub status: Status,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub issued_by: Option<Uuid>,
    pub issued_at: Option<DateTimeWithTimeZone>,
    pub rendered_content: Option<String>,
    pub document_file: Option<String>,
    pub received_at: Option<DateTimeWithTimeZone>,
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

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
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
    #[sea_orm(string_value = "ISSUED")]
    Issued,
    #[sea_orm(string_value = "RECEIVED")]
    Received,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Status {
    fn is_open(self) -> bool {
        matches!(self, Status::Requested | Status::UnderReview)
    }
}

impl Workflow for Status {
    const SUBJECT: &'static str = "document request";

    /// Issuing straight from an open request is allowed here; whether the
    /// template demands approval first is checked by the caller.
    fn allows(self, next: Self) -> bool {
        match next {
            Status::UnderReview => self == Status::Requested,
            Status::Approved | Status::Rejected => self.is_open(),
            Status::Issued => self.is_open() || self == Status::Approved,
            Status::Received => self == Status::Issued,
            Status::Cancelled => self.is_open() || self == Status::Approved,
            Status::Requested => false,
        }
    }
}

impl Model {
    pub fn is_approved(&self) -> bool {
        self.status == Status::Approved
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Received
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_documents_can_only_be_received() {
        assert!(Status::Issued.advance(Status::Received).is_ok());
        assert!(Status::Issued.advance(Status::Cancelled).is_err());
        assert!(Status::Received.advance(Status::Issued).is_err());
    }

    #[test]
    fn rejection_needs_an_open_request() {
        assert!(Status::UnderReview.advance(Status::Rejected).is_ok());
        assert!(Status::Approved.advance(Status::Rejected).is_err());
    }
}
