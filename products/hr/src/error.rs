use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Rule violations raised by the HR slice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HrError {
    #[error("insufficient leave balance: requested {requested} day(s), {remaining} remaining")]
    InsufficientLeaveBalance {
        requested: Decimal,
        remaining: Decimal,
    },
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },
    #[error("deductions {deductions} exceed gross pay {gross}")]
    NegativeNetPay { gross: i64, deductions: i64 },
    #[error("organization {0} cannot be moved under itself or its descendants")]
    TreeCycle(Uuid),
    #[error("template variable `{0}` has no value")]
    MissingTemplateVariable(String),
    #[error("{0}")]
    Validation(String),
}

impl HrError {
    pub fn transition(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
        HrError::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn out_of_range(field: &str, min: impl ToString, max: impl ToString) -> Self {
        HrError::OutOfRange {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

pub type HrResult<T> = Result<T, HrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_mentions_both_amounts() {
        let err = HrError::InsufficientLeaveBalance {
            requested: Decimal::new(30, 1),
            remaining: Decimal::new(15, 1),
        };
        assert_eq!(
            err.to_string(),
            "insufficient leave balance: requested 3.0 day(s), 1.5 remaining"
        );
    }

    #[test]
    fn transition_helper_formats_states() {
        let err = HrError::transition("leave request", "APPROVED", "REJECTED");
        assert_eq!(err.to_string(), "leave request cannot move from APPROVED to REJECTED");
    }
}
