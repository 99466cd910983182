use products_hr::{HrError, HrResult};
use sea_orm::{ActiveEnum, ActiveValue, Value};

/// A status column with a fixed set of legal moves.
pub trait Workflow: ActiveEnum<Value = String> + Copy + PartialEq {
    /// Human name used in transition errors.
    const SUBJECT: &'static str;

    fn allows(self, next: Self) -> bool;

    fn advance(self, next: Self) -> HrResult<Self> {
        if self.allows(next) {
            Ok(next)
        } else {
            Err(HrError::transition(
                Self::SUBJECT,
                self.to_value(),
                next.to_value(),
            ))
        }
    }
}

/// Value held by an active model field, whether freshly set or loaded.
pub(crate) fn current<V>(field: &ActiveValue<V>) -> Option<&V>
where
    V: Into<Value>,
{
    match field {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}
