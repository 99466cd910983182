use products_hr::LeaveBucket;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "leave_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Date,
    #[sea_orm(column_type = "Decimal(Some((4, 1)))")]
    pub days_requested: Decimal,
    pub reason: String,
    pub emergency_contact: Option<String>,
    #[sea_orm(indexed)]
    pub status: Status,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub approval_notes: Option<String>,
    pub attachment: Option<String>,
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
        belongs_to = "super::user::Entity",
        from = "Column::ApproverId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Approver,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum LeaveType {
    #[sea_orm(string_value = "ANNUAL")]
    Annual,
    #[sea_orm(string_value = "HALF_DAY")]
    HalfDay,
    #[sea_orm(string_value = "SICK")]
    Sick,
    #[sea_orm(string_value = "BEREAVEMENT")]
    Bereavement,
    #[sea_orm(string_value = "MATERNITY")]
    Maternity,
    #[sea_orm(string_value = "PARENTAL")]
    Parental,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl LeaveType {
    /// Usage column charged when a request of this type is approved.
    pub fn bucket(self) -> LeaveBucket {
        match self {
            LeaveType::Annual | LeaveType::HalfDay => LeaveBucket::Annual,
            LeaveType::Sick => LeaveBucket::Sick,
            _ => LeaveBucket::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "leave request";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Approved)
                | (Status::Pending, Status::Rejected)
                | (Status::Pending, Status::Cancelled)
                | (Status::Approved, Status::Cancelled)
        )
    }
}

impl Model {
    pub fn is_approved(&self) -> bool {
        self.status == Status::Approved
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn is_rejected(&self) -> bool {
        self.status == Status::Rejected
    }
}

impl ActiveModelBehavior for ActiveModel {}
