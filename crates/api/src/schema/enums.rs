//! GraphQL mirrors of the stored status and category columns.

use async_graphql::Enum;

// people

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::employee_profile::EmployeeType")]
pub enum EmployeeType {
    Regular,
    Contract,
    Intern,
    Dispatched,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::employee_profile::WorkType")]
pub enum WorkType {
    FullTime,
    PartTime,
    Remote,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::employee_profile::EmploymentStatus")]
pub enum EmploymentStatus {
    Active,
    OnLeave,
    Resigned,
    Retired,
}

// competencies

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::skill::Category")]
pub enum SkillCategory {
    Technical,
    Language,
    Certificate,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::employee_skill::Proficiency")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::education::Degree")]
pub enum Degree {
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::education::Status")]
pub enum EducationStatus {
    Graduated,
    Enrolled,
    DroppedOut,
    Completed,
}

// attendance

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::attendance::Status")]
pub enum AttendanceStatus {
    Normal,
    Late,
    EarlyLeave,
    Absent,
    OnLeave,
    FieldWork,
    Remote,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::leave_request::LeaveType")]
pub enum LeaveType {
    Annual,
    HalfDay,
    Sick,
    Bereavement,
    Maternity,
    Parental,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::leave_request::Status")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::work_schedule::ScheduleType")]
pub enum ScheduleType {
    Regular,
    Holiday,
    Night,
    Special,
}

// payroll

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::allowance::AllowanceType")]
pub enum AllowanceType {
    Basic,
    Duty,
    Performance,
    Welfare,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::allowance::CalculationMethod")]
pub enum AllowanceMethod {
    Fixed,
    BaseRatio,
    Hourly,
    Daily,
    Monthly,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::deduction::DeductionType")]
pub enum DeductionType {
    Statutory,
    Voluntary,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::deduction::CalculationMethod")]
pub enum DeductionMethod {
    Rate,
    Fixed,
    BaseRatio,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::payroll::Status")]
pub enum PayrollStatus {
    Draft,
    Confirmed,
    Paid,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::bonus::BonusType")]
pub enum BonusType {
    Performance,
    Holiday,
    Special,
    Retirement,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::bonus::Status")]
pub enum BonusStatus {
    Requested,
    UnderReview,
    Approved,
    Paid,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::retirement_pension::PensionType")]
pub enum PensionType {
    #[graphql(name = "DB")]
    DefinedBenefit,
    #[graphql(name = "DC")]
    DefinedContribution,
    #[graphql(name = "IRP")]
    Individual,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::retirement_pension::PayoutMethod")]
pub enum PayoutMethod {
    LumpSum,
    Annuity,
    Mixed,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::retirement_pension::Status")]
pub enum PensionStatus {
    Calculating,
    Confirmed,
    Paid,
}

// evaluation

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::evaluation_period::PeriodType")]
pub enum PeriodType {
    FirstHalf,
    SecondHalf,
    Annual,
    Quarterly,
    Monthly,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::evaluation::Grade")]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::evaluation::Status")]
pub enum EvaluationStatus {
    Draft,
    Submitted,
    UnderReview,
    Confirmed,
    Shared,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::one_on_one_meeting::MeetingType")]
pub enum MeetingType {
    Regular,
    Situational,
    Performance,
    Career,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::one_on_one_meeting::Status")]
pub enum MeetingStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::feedback::FeedbackType")]
pub enum FeedbackType {
    Praise,
    Improvement,
    Suggestion,
    Customer,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::feedback::Priority")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::goal::GoalType")]
pub enum GoalType {
    Work,
    Personal,
    Development,
    Organization,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::goal::Status")]
pub enum GoalStatus {
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::goal::Achievement")]
pub enum Achievement {
    Exceeded,
    Achieved,
    Partial,
    NotAchieved,
}

// organization

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::organization::OrganizationType")]
pub enum OrganizationType {
    Division,
    Department,
    Team,
    Part,
    Group,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::employee_organization::AppointmentType")]
pub enum AppointmentType {
    Hire,
    Promotion,
    Transfer,
    Concurrent,
    Dispatch,
    Return,
    Resignation,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::organization_change_request::ChangeType")]
pub enum ChangeType {
    Create,
    Abolish,
    Move,
    Merge,
    Split,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::organization_change_request::Status")]
pub enum ChangeStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

// documents

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::document_template::DocumentType")]
pub enum DocumentType {
    Employment,
    Career,
    Retirement,
    PayStub,
    WithholdingReceipt,
    WithholdingLedger,
    EmploymentInsurance,
    HealthInsurance,
    NationalPension,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::document_request::Status")]
pub enum DocumentStatus {
    Requested,
    UnderReview,
    Approved,
    Issued,
    Received,
    Rejected,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::certificate::CertificateType")]
pub enum CertificateType {
    Certificate,
    Completion,
    Course,
    License,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::training_record::TrainingType")]
pub enum TrainingType {
    Internal,
    External,
    Online,
    Workshop,
    Seminar,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::training_record::CompletionStatus")]
pub enum CompletionStatus {
    Completed,
    Expected,
    Incomplete,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::contract::ContractType")]
pub enum ContractType {
    Employment,
    Business,
    Nda,
    NonCompete,
    Other,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(remote = "entity::contract::Status")]
pub enum ContractStatus {
    Draft,
    UnderReview,
    Signed,
    Active,
    Ended,
    Terminated,
}
