//! Work-day policy and hour arithmetic for attendance rows.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::{HrError, HrResult};

/// Office hours used to classify check-ins and check-outs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkPolicy {
    pub utc_offset: FixedOffset,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub standard_hours: Decimal,
}

impl Default for WorkPolicy {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(9 * 3600).unwrap_or_else(|| Utc.fix()),
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            standard_hours: Decimal::from(8),
        }
    }
}

impl WorkPolicy {
    pub fn new(
        offset_hours: i32,
        day_start: NaiveTime,
        day_end: NaiveTime,
        standard_hours: Decimal,
    ) -> HrResult<Self> {
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| HrError::out_of_range("utc offset hours", -23, 23))?;
        if day_end <= day_start {
            return Err(HrError::Validation(
                "work day must end after it starts".into(),
            ));
        }
        Ok(Self {
            utc_offset,
            day_start,
            day_end,
            standard_hours,
        })
    }

    pub fn local_time<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> NaiveTime {
        at.with_timezone(&self.utc_offset).time()
    }

    pub fn local_date<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    /// Arrival strictly after the start of the day.
    pub fn is_late_arrival<Tz: TimeZone>(&self, check_in: &DateTime<Tz>) -> bool {
        self.local_time(check_in) > self.day_start
    }

    /// Departure strictly before the end of the day.
    pub fn is_early_departure<Tz: TimeZone>(&self, check_out: &DateTime<Tz>) -> bool {
        self.local_time(check_out) < self.day_end
    }

    pub fn overtime(&self, work_hours: Decimal) -> Decimal {
        (work_hours - self.standard_hours).max(Decimal::ZERO)
    }
}

/// Hours between check-in and check-out minus the break, to two decimals.
/// Returns zero until both times are known.
pub fn work_hours(
    check_in: Option<&DateTime<FixedOffset>>,
    check_out: Option<&DateTime<FixedOffset>>,
    break_hours: Decimal,
) -> Decimal {
    let (Some(check_in), Some(check_out)) = (check_in, check_out) else {
        return Decimal::ZERO;
    };
    let seconds = (*check_out - *check_in).num_seconds();
    let hours = Decimal::from(seconds) / Decimal::from(3600);
    (hours - break_hours).round_dp(2)
}
