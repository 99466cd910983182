//! Annual leave entitlement and balance bookkeeping.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::inclusive_days;
use crate::error::{HrError, HrResult};

/// Days granted for a year given completed years of service.
pub fn annual_entitlement(tenure_years: i32) -> Decimal {
    let days = match tenure_years {
        y if y < 1 => 11,
        y if y < 3 => 15,
        y if y < 5 => 20,
        _ => 25,
    };
    Decimal::from(days)
}

/// Length of a leave request. Half days must start and end on the same date.
pub fn requested_days(start: NaiveDate, end: NaiveDate, half_day: bool) -> HrResult<Decimal> {
    let days = inclusive_days(start, end)?;
    if half_day {
        if days != 1 {
            return Err(HrError::Validation(
                "a half-day leave must start and end on the same date".into(),
            ));
        }
        return Ok(Decimal::new(5, 1));
    }
    Ok(Decimal::from(days))
}

/// Which usage column a leave type draws down.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LeaveBucket {
    Annual,
    Sick,
    Other,
}

/// In-memory view of one employee-year balance row.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaveLedger {
    pub total_days: Decimal,
    pub used_days: Decimal,
    pub remaining_days: Decimal,
    pub annual_leave_used: Decimal,
    pub sick_leave_used: Decimal,
    pub other_leave_used: Decimal,
}

impl LeaveLedger {
    pub fn new(total_days: Decimal) -> Self {
        Self {
            total_days,
            remaining_days: total_days,
            ..Self::default()
        }
    }

    pub fn available_days(&self) -> Decimal {
        self.remaining_days
    }

    /// Draw `days` from the balance. Nothing changes when the balance is short.
    pub fn use_leave(&mut self, days: Decimal, bucket: LeaveBucket) -> HrResult<()> {
        if days <= Decimal::ZERO {
            return Err(HrError::Validation("leave days must be positive".into()));
        }
        if self.remaining_days < days {
            return Err(HrError::InsufficientLeaveBalance {
                requested: days,
                remaining: self.remaining_days,
            });
        }
        self.used_days += days;
        self.remaining_days -= days;
        *self.bucket_mut(bucket) += days;
        Ok(())
    }

    /// Give back days from a cancelled, previously approved request.
    pub fn restore(&mut self, days: Decimal, bucket: LeaveBucket) {
        let slot = self.bucket_mut(bucket);
        let returned = days.min(*slot).max(Decimal::ZERO);
        *slot -= returned;
        self.used_days -= returned;
        self.remaining_days += returned;
    }

    /// Reset the entitlement and derive the remaining days from usage.
    pub fn recalculate(&mut self, total_days: Decimal) {
        self.total_days = total_days;
        self.remaining_days = total_days - self.used_days;
    }

    fn bucket_mut(&mut self, bucket: LeaveBucket) -> &mut Decimal {
        match bucket {
            LeaveBucket::Annual => &mut self.annual_leave_used,
            LeaveBucket::Sick => &mut self.sick_leave_used,
            LeaveBucket::Other => &mut self.other_leave_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn entitlement_grows_with_tenure() {
        assert_eq!(annual_entitlement(-1), Decimal::from(11));
        assert_eq!(annual_entitlement(0), Decimal::from(11));
        assert_eq!(annual_entitlement(1), Decimal::from(15));
        assert_eq!(annual_entitlement(2), Decimal::from(15));
        assert_eq!(annual_entitlement(3), Decimal::from(20));
        assert_eq!(annual_entitlement(4), Decimal::from(20));
        assert_eq!(annual_entitlement(5), Decimal::from(25));
        assert_eq!(annual_entitlement(30), Decimal::from(25));
    }

    #[test]
    fn using_leave_moves_days_into_the_right_bucket() {
        let mut ledger = LeaveLedger::new(Decimal::from(15));
        ledger.use_leave(Decimal::from(2), LeaveBucket::Annual).unwrap();
        ledger.use_leave(Decimal::new(5, 1), LeaveBucket::Sick).unwrap();
        ledger.use_leave(Decimal::from(1), LeaveBucket::Other).unwrap();
        assert_eq!(ledger.used_days, Decimal::new(35, 1));
        assert_eq!(ledger.remaining_days, Decimal::new(115, 1));
        assert_eq!(ledger.annual_leave_used, Decimal::from(2));
        assert_eq!(ledger.sick_leave_used, Decimal::new(5, 1));
        assert_eq!(ledger.other_leave_used, Decimal::from(1));
    }

    #[test]
    fn short_balance_is_rejected_without_side_effects() {
        let mut ledger = LeaveLedger::new(Decimal::from(2));
        let before = ledger.clone();
        let err = ledger
            .use_leave(Decimal::from(3), LeaveBucket::Annual)
            .unwrap_err();
        assert_eq!(
            err,
            HrError::InsufficientLeaveBalance {
                requested: Decimal::from(3),
                remaining: Decimal::from(2),
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn exact_balance_can_be_used() {
        let mut ledger = LeaveLedger::new(Decimal::from(1));
        ledger.use_leave(Decimal::from(1), LeaveBucket::Annual).unwrap();
        assert_eq!(ledger.available_days(), Decimal::ZERO);
    }

    #[test]
    fn restore_reverses_usage() {
        let mut ledger = LeaveLedger::new(Decimal::from(15));
        ledger.use_leave(Decimal::from(3), LeaveBucket::Sick).unwrap();
        ledger.restore(Decimal::from(3), LeaveBucket::Sick);
        assert_eq!(ledger, LeaveLedger::new(Decimal::from(15)));
    }

    #[test]
    fn recalculation_keeps_usage() {
        let mut ledger = LeaveLedger::new(Decimal::from(15));
        ledger.use_leave(Decimal::from(4), LeaveBucket::Annual).unwrap();
        ledger.recalculate(Decimal::from(20));
        assert_eq!(ledger.total_days, Decimal::from(20));
        assert_eq!(ledger.remaining_days, Decimal::from(16));
    }

    #[test]
    fn request_length_is_inclusive() {
        assert_eq!(
            requested_days(d(2024, 3, 4), d(2024, 3, 8), false).unwrap(),
            Decimal::from(5)
        );
        assert_eq!(
            requested_days(d(2024, 3, 4), d(2024, 3, 4), true).unwrap(),
            Decimal::new(5, 1)
        );
        assert!(requested_days(d(2024, 3, 4), d(2024, 3, 5), true).is_err());
    }
}
