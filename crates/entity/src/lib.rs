//! SeaORM entities for the HR suite, one module per table.
//!
//! Status enums carry their allowed transitions (see [`workflow::Workflow`]);
//! models expose the small derived values the API reports (tenure, expiry,
//! durations) by delegating to `products-hr`.

pub mod workflow;

pub mod allowance;
pub mod attendance;
pub mod audit_entry;
pub mod bonus;
pub mod certificate;
pub mod certification;
pub mod contract;
pub mod deduction;
pub mod department;
pub mod document_request;
pub mod document_template;
pub mod education;
pub mod emergency_contact;
pub mod employee_certification;
pub mod employee_organization;
pub mod employee_profile;
pub mod employee_skill;
pub mod evaluation;
pub mod evaluation_period;
pub mod evaluation_template;
pub mod feedback;
pub mod goal;
pub mod job_title;
pub mod leave_balance;
pub mod leave_request;
pub mod one_on_one_meeting;
pub mod organization;
pub mod organization_change_request;
pub mod payroll;
pub mod position;
pub mod retirement_pension;
pub mod salary;
pub mod salary_grade;
pub mod skill;
pub mod training_record;
pub mod user;
pub mod user_secret;
pub mod work_experience;
pub mod work_schedule;

pub use workflow::Workflow;
