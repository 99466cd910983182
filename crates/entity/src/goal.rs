use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "goal")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub period_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub priority: super::feedback::Priority,
    pub start_date: Date,
    pub target_date: Date,
    pub completed_date: Option<Date>,
    pub progress: i32,
    pub status: Status,
    pub achievement: Option<Achievement>,
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
pub enum GoalType {
    #[sea_orm(string_value = "WORK")]
    Work,
    #[sea_orm(string_value = "PERSONAL")]
    Personal,
    #[sea_orm(string_value = "DEVELOPMENT")]
    Development,
    #[sea_orm(string_value = "ORGANIZATION")]
    Organization,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "ON_HOLD")]
    OnHold,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "goal";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Status::InProgress, Status::Completed)
                | (Status::InProgress, Status::OnHold)
                | (Status::InProgress, Status::Cancelled)
                | (Status::OnHold, Status::InProgress)
                | (Status::OnHold, Status::Cancelled)
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Achievement {
    #[sea_orm(string_value = "EXCEEDED")]
    Exceeded,
    #[sea_orm(string_value = "ACHIEVED")]
    Achieved,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "NOT_ACHIEVED")]
    NotAchieved,
}

impl Model {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == Status::InProgress && self.target_date < today
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        if self.status != Status::InProgress {
            return 0;
        }
        products_hr::calendar::days_until(self.target_date, today)
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn goal(status: Status) -> Model {
        let now = Utc::now().fixed_offset();
        Model {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            manager_id: None,
            period_id: None,
            title: "Ship v2".into(),
            description: None,
            goal_type: GoalType::Work,
            priority: super::super::feedback::Priority::High,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            target_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            completed_date: None,
            progress: 40,
            status,
            achievement: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_open_goals_run_late() {
        let after = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(goal(Status::InProgress).is_overdue(after));
        assert!(!goal(Status::Completed).is_overdue(after));
        assert_eq!(goal(Status::InProgress).days_remaining(after), -1);
    }

    #[test]
    fn closed_goals_have_no_days_left() {
        let before = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        assert_eq!(goal(Status::InProgress).days_remaining(before), 10);
        assert_eq!(goal(Status::OnHold).days_remaining(before), 0);
    }
}
