use products_hr::attendance::work_hours;
use products_hr::WorkPolicy;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;

use crate::workflow::current;

/// One row per employee and calendar date.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub date: Date,
    pub check_in_time: Option<DateTimeWithTimeZone>,
    pub check_in_ip: Option<String>,
    pub check_in_location: Option<String>,
    pub check_out_time: Option<DateTimeWithTimeZone>,
    pub check_out_ip: Option<String>,
    pub check_out_location: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub work_hours: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub overtime_hours: Decimal,
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub break_hours: Decimal,
    pub status: Status,
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

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "NORMAL")]
    Normal,
    #[sea_orm(string_value = "LATE")]
    Late,
    #[sea_orm(string_value = "EARLY_LEAVE")]
    EarlyLeave,
    #[sea_orm(string_value = "ABSENT")]
    Absent,
    #[sea_orm(string_value = "ON_LEAVE")]
    OnLeave,
    #[sea_orm(string_value = "FIELD_WORK")]
    FieldWork,
    #[sea_orm(string_value = "REMOTE")]
    Remote,
}

impl Model {
    pub fn is_late(&self, policy: &WorkPolicy) -> bool {
        self.status == Status::Late
            || self
                .check_in_time
                .as_ref()
                .map_or(false, |at| policy.is_late_arrival(at))
    }

    pub fn is_early_leave(&self, policy: &WorkPolicy) -> bool {
        self.status == Status::EarlyLeave
            || self
                .check_out_time
                .as_ref()
                .map_or(false, |at| policy.is_early_departure(at))
    }

    pub fn calculate_work_hours(&self) -> Decimal {
        work_hours(
            self.check_in_time.as_ref(),
            self.check_out_time.as_ref(),
            self.break_hours,
        )
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Keep `work_hours` in step with the punch times.
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let check_in = current(&self.check_in_time).cloned().flatten();
        let check_out = current(&self.check_out_time).cloned().flatten();
        if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
            let break_hours = current(&self.break_hours).copied().unwrap_or_default();
            let hours = work_hours(Some(&check_in), Some(&check_out), break_hours);
            self.work_hours = ActiveValue::Set(Some(hours));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    fn row(check_in: (u32, u32), check_out: Option<(u32, u32)>, status: Status) -> Model {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let at = |(h, m): (u32, u32)| tz.with_ymd_and_hms(2024, 4, 1, h, m, 0).unwrap();
        Model {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            check_in_time: Some(at(check_in)),
            check_in_ip: None,
            check_in_location: None,
            check_out_time: check_out.map(at),
            check_out_ip: None,
            check_out_location: None,
            work_hours: None,
            overtime_hours: Decimal::ZERO,
            break_hours: Decimal::ONE,
            status,
            notes: None,
            created_at: at(check_in),
            updated_at: at(check_in),
        }
    }

    #[test]
    fn lateness_follows_status_or_clock() {
        let policy = WorkPolicy::default();
        assert!(row((9, 5), None, Status::Normal).is_late(&policy));
        assert!(!row((8, 55), None, Status::Normal).is_late(&policy));
        assert!(row((8, 55), None, Status::Late).is_late(&policy));
    }

    #[test]
    fn early_leave_needs_a_checkout() {
        let policy = WorkPolicy::default();
        assert!(!row((9, 0), None, Status::Normal).is_early_leave(&policy));
        assert!(row((9, 0), Some((17, 0)), Status::Normal).is_early_leave(&policy));
        assert!(!row((9, 0), Some((18, 0)), Status::Normal).is_early_leave(&policy));
    }

    #[test]
    fn hours_exclude_the_break() {
        assert_eq!(
            row((9, 0), Some((18, 0)), Status::Normal).calculate_work_hours(),
            Decimal::from(8)
        );
        assert_eq!(
            row((9, 0), None, Status::Normal).calculate_work_hours(),
            Decimal::ZERO
        );
    }
}
