//! GraphQL surface of the HR suite: schema, sessions and demo data.

pub mod auth;
pub mod schema;
pub mod seed;

pub use auth::{AuthConfig, CurrentUser, UserRole, SESSION_COOKIE};
pub use schema::{build_schema, render_org_action, render_org_chart, AppSchema, HrSchema};
pub use seed::{seed_hr_demo, SeededHrRecords};
