use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "one_on_one_meeting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub manager_id: Uuid,
    pub meeting_type: MeetingType,
    pub status: Status,
    pub scheduled_at: DateTimeWithTimeZone,
    pub duration_minutes: i32,
    pub agenda: Option<String>,
    pub discussion_points: Json,
    pub action_items: Json,
    pub employee_feedback: Option<String>,
    pub manager_notes: Option<String>,
    pub next_meeting_date: Option<Date>,
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
pub enum MeetingType {
    #[sea_orm(string_value = "REGULAR")]
    Regular,
    #[sea_orm(string_value = "SITUATIONAL")]
    Situational,
    #[sea_orm(string_value = "PERFORMANCE")]
    Performance,
    #[sea_orm(string_value = "CAREER")]
    Career,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "one-on-one meeting";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Status::Scheduled, Status::InProgress)
                | (Status::Scheduled, Status::Completed)
                | (Status::Scheduled, Status::Cancelled)
                | (Status::InProgress, Status::Completed)
                | (Status::InProgress, Status::Cancelled)
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
