use products_hr::evaluation::{determine_grade, validate_scores, weighted_score, GradeBand};
use products_hr::HrResult;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::workflow::Workflow;

/// One evaluator's assessment of an employee for a period.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "evaluation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub evaluator_id: Uuid,
    pub period_id: Uuid,
    pub template_id: Uuid,
    pub scores: Json,
    pub comments: Json,
    #[sea_orm(column_type = "Decimal(Some((3, 1)))", nullable)]
    pub overall_score: Option<Decimal>,
    pub grade: Option<Grade>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub goals: Json,
    pub status: Status,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub confirmed_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(
        belongs_to = "super::evaluation_period::Entity",
        from = "Column::PeriodId",
        to = "super::evaluation_period::Column::Id",
        on_delete = "Cascade"
    )]
    Period,
    #[sea_orm(
        belongs_to = "super::evaluation_template::Entity",
        from = "Column::TemplateId",
        to = "super::evaluation_template::Column::Id",
        on_delete = "Restrict"
    )]
    Template,
}

impl Related<super::evaluation_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Period.def()
    }
}

impl Related<super::evaluation_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
pub enum Grade {
    #[sea_orm(string_value = "S")]
    S,
    #[sea_orm(string_value = "A")]
    A,
    #[sea_orm(string_value = "B")]
    B,
    #[sea_orm(string_value = "C")]
    C,
    #[sea_orm(string_value = "D")]
    D,
}

impl From<GradeBand> for Grade {
    fn from(band: GradeBand) -> Self {
        match band {
            GradeBand::S => Grade::S,
            GradeBand::A => Grade::A,
            GradeBand::B => Grade::B,
            GradeBand::C => Grade::C,
            GradeBand::D => Grade::D,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "SUBMITTED")]
    Submitted,
    #[sea_orm(string_value = "UNDER_REVIEW")]
    UnderReview,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "SHARED")]
    Shared,
}

impl Workflow for Status {
    const SUBJECT: &'static str = "evaluation";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Status::Draft, Status::Submitted)
                | (Status::Submitted, Status::UnderReview)
                | (Status::UnderReview, Status::Confirmed)
                | (Status::Confirmed, Status::Shared)
        )
    }
}

/// Score and grade after scoring against `template`. Keeps the stored values
/// when nothing can be averaged.
pub fn score(
    current: &Model,
    template: &super::evaluation_template::Model,
) -> HrResult<(Option<Decimal>, Option<Grade>)> {
    validate_scores(&current.scores, template.min_score, template.max_score)?;
    match weighted_score(&template.items, &current.scores)? {
        Some(overall) => Ok((Some(overall), determine_grade(Some(overall)).map(Grade::from))),
        None => Ok((current.overall_score, current.grade)),
    }
}

impl ActiveModelBehavior for ActiveModel {}
