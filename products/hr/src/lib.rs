//! HR rules shared by the GraphQL layer and the entity helpers.
//!
//! Everything in this crate is synchronous and database-free: callers load
//! rows, hand the relevant fields to these functions and persist the result.

pub mod attendance;
pub mod calendar;
pub mod error;
pub mod evaluation;
pub mod leave;
pub mod org;
pub mod payroll;
pub mod people;
pub mod template;

pub use attendance::WorkPolicy;
pub use error::{HrError, HrResult};
pub use evaluation::GradeBand;
pub use leave::{LeaveBucket, LeaveLedger};
pub use org::{OrgNode, OrgTree};
pub use payroll::{PayrollBreakdown, PensionPlan};
