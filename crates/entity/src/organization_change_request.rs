use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "organization_change_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub change_type: ChangeType,
    pub title: String,
    pub target_organization_id: Option<Uuid>,
    pub new_parent_id: Option<Uuid>,
    pub details: Json,
    pub reason: Option<String>,
    pub effective_date: Date,
    pub status: Status,
    pub requester_id: Option<Uuid>,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub implemented_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::TargetOrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "SetNull"
    )]
    Target,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum ChangeType {
    #[sea_orm(string_value = "CREATE")]
    Create,
    #[sea_orm(string_value = "ABOLISH")]
    Abolish,
    #[sea_orm(string_value = "MOVE")]
    Move,
    #[sea_orm(string_value = "MERGE")]
    Merge,
    #[sea_orm(string_value = "SPLIT")]
    Split,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "UNDER_REVIEW")]
    UnderReview,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "IMPLEMENTED")]
    Implemented,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "organization change";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Status::Draft, Status::UnderReview)
                | (Status::UnderReview, Status::Approved)
                | (Status::UnderReview, Status::Rejected)
                | (Status::Approved, Status::Implemented)
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
