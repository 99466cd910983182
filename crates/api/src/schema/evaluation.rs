use async_graphql::{ComplexObject, Context, InputObject, Json, Object, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use entity::workflow::Workflow;
use entity::{evaluation, evaluation_period, evaluation_template, feedback, goal, one_on_one_meeting};
use platform_api::ResultExt;
use products_hr::calendar::ensure_ordered;
use products_hr::evaluation::{parse_items, validate_scores};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::enums::{
    Achievement, EvaluationStatus, FeedbackType, GoalStatus, GoalType, Grade, MeetingStatus,
    MeetingType, PeriodType, Priority,
};
use super::people::required_text;
use super::{
    current_user, database, ensure_self_or_management, error_with_code, find_employee,
    find_required, now, parse_optional_uuid, parse_uuid, record_audit, require_management,
    subject_employee, to_id, today, utc, validation_error,
};
use crate::auth::CurrentUser;

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EvaluationPeriod", complex)]
pub struct EvaluationPeriodNode {
    pub id: ID,
    pub year: i32,
    pub period_type: PeriodType,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub evaluation_start: NaiveDate,
    pub evaluation_end: NaiveDate,
    pub is_active: bool,
    #[graphql(skip)]
    model: evaluation_period::Model,
}

impl From<evaluation_period::Model> for EvaluationPeriodNode {
    fn from(model: evaluation_period::Model) -> Self {
        Self {
            id: to_id(model.id),
            year: model.year,
            period_type: model.period_type.into(),
            name: model.name.clone(),
            start_date: model.start_date,
            end_date: model.end_date,
            evaluation_start: model.evaluation_start,
            evaluation_end: model.evaluation_end,
            is_active: model.is_active,
            model,
        }
    }
}

#[ComplexObject]
impl EvaluationPeriodNode {
    async fn is_evaluation_open(&self, ctx: &Context<'_>) -> bool {
        self.model.is_evaluation_open(today(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EvaluationTemplate")]
pub struct EvaluationTemplateNode {
    pub id: ID,
    pub name: String,
    pub description: Option<String>,
    pub items: Json<Value>,
    pub max_score: Decimal,
    pub min_score: Decimal,
    pub weight_total: i32,
    pub is_active: bool,
}

impl From<evaluation_template::Model> for EvaluationTemplateNode {
    fn from(model: evaluation_template::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            description: model.description,
            items: Json(model.items),
            max_score: model.max_score,
            min_score: model.min_score,
            weight_total: model.weight_total,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Evaluation")]
pub struct EvaluationNode {
    pub id: ID,
    pub employee_id: ID,
    pub evaluator_id: ID,
    pub period_id: ID,
    pub template_id: ID,
    pub scores: Json<Value>,
    pub comments: Json<Value>,
    pub overall_score: Option<Decimal>,
    pub grade: Option<Grade>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub goals: Json<Value>,
    pub status: EvaluationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<evaluation::Model> for EvaluationNode {
    fn from(model: evaluation::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            evaluator_id: to_id(model.evaluator_id),
            period_id: to_id(model.period_id),
            template_id: to_id(model.template_id),
            scores: Json(model.scores),
            comments: Json(model.comments),
            overall_score: model.overall_score,
            grade: model.grade.map(Into::into),
            strengths: model.strengths,
            improvements: model.improvements,
            goals: Json(model.goals),
            status: model.status.into(),
            submitted_at: model.submitted_at.map(utc),
            reviewed_at: model.reviewed_at.map(utc),
            confirmed_at: model.confirmed_at.map(utc),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Goal", complex)]
pub struct GoalNode {
    pub id: ID,
    pub employee_id: ID,
    pub manager_id: Option<ID>,
    pub period_id: Option<ID>,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub priority: Priority,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub completed_date: Option<NaiveDate>,
    pub progress: i32,
    pub status: GoalStatus,
    pub achievement: Option<Achievement>,
    #[graphql(skip)]
    model: goal::Model,
}

impl From<goal::Model> for GoalNode {
    fn from(model: goal::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            manager_id: model.manager_id.map(to_id),
            period_id: model.period_id.map(to_id),
            title: model.title.clone(),
            description: model.description.clone(),
            goal_type: model.goal_type.into(),
            priority: model.priority.into(),
            start_date: model.start_date,
            target_date: model.target_date,
            completed_date: model.completed_date,
            progress: model.progress,
            status: model.status.into(),
            achievement: model.achievement.map(Into::into),
            model,
        }
    }
}

#[ComplexObject]
impl GoalNode {
    async fn is_overdue(&self, ctx: &Context<'_>) -> bool {
        self.model.is_overdue(today(ctx))
    }

    async fn days_remaining(&self, ctx: &Context<'_>) -> i64 {
        self.model.days_remaining(today(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Feedback")]
pub struct FeedbackNode {
    pub id: ID,
    /// Null for anonymous feedback unless the viewer sent it.
    pub sender_id: Option<ID>,
    pub recipient_id: ID,
    pub feedback_type: FeedbackType,
    pub priority: Priority,
    pub title: String,
    pub content: String,
    pub is_anonymous: bool,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub requires_action: bool,
    pub action_taken: Option<String>,
    pub action_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackNode {
    fn for_viewer(model: feedback::Model, viewer: &CurrentUser) -> Self {
        Self {
            id: to_id(model.id),
            sender_id: model.visible_sender(viewer.user_id).map(to_id),
            recipient_id: to_id(model.recipient_id),
            feedback_type: model.feedback_type.into(),
            priority: model.priority.into(),
            title: model.title,
            content: model.content,
            is_anonymous: model.is_anonymous,
            is_read: model.is_read,
            read_at: model.read_at.map(utc),
            requires_action: model.requires_action,
            action_taken: model.action_taken,
            action_date: model.action_date,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "OneOnOneMeeting")]
pub struct OneOnOneMeetingNode {
    pub id: ID,
    pub employee_id: ID,
    pub manager_id: ID,
    pub meeting_type: MeetingType,
    pub status: MeetingStatus,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub agenda: Option<String>,
    pub discussion_points: Json<Value>,
    pub action_items: Json<Value>,
    pub employee_feedback: Option<String>,
    pub manager_notes: Option<String>,
    pub next_meeting_date: Option<NaiveDate>,
}

impl From<one_on_one_meeting::Model> for OneOnOneMeetingNode {
    fn from(model: one_on_one_meeting::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            manager_id: to_id(model.manager_id),
            meeting_type: model.meeting_type.into(),
            status: model.status.into(),
            scheduled_at: utc(model.scheduled_at),
            duration_minutes: model.duration_minutes,
            agenda: model.agenda,
            discussion_points: Json(model.discussion_points),
            action_items: Json(model.action_items),
            employee_feedback: model.employee_feedback,
            manager_notes: model.manager_notes,
            next_meeting_date: model.next_meeting_date,
        }
    }
}

#[derive(InputObject, Clone)]
pub struct EvaluationPeriodInput {
    pub year: i32,
    pub period_type: PeriodType,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub evaluation_start: NaiveDate,
    pub evaluation_end: NaiveDate,
}

#[derive(InputObject, Clone)]
pub struct EvaluationTemplateInput {
    pub name: String,
    pub description: Option<String>,
    /// `[{id, name, weight}]`
    pub items: Json<Value>,
    pub max_score: Option<Decimal>,
    pub min_score: Option<Decimal>,
    pub weight_total: Option<i32>,
}

#[derive(InputObject, Clone)]
pub struct CreateEvaluationInput {
    pub employee_id: ID,
    /// Defaults to the caller.
    pub evaluator_id: Option<ID>,
    pub period_id: ID,
    pub template_id: ID,
}

#[derive(InputObject, Clone)]
pub struct EvaluationScoresInput {
    pub id: ID,
    /// `{itemId: score}`
    pub scores: Json<Value>,
    pub comments: Option<Json<Value>>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub goals: Option<Json<Value>>,
}

#[derive(InputObject, Clone)]
pub struct GoalInput {
    pub employee_id: Option<ID>,
    pub manager_id: Option<ID>,
    pub period_id: Option<ID>,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub priority: Option<Priority>,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
}

#[derive(InputObject, Clone)]
pub struct FeedbackInput {
    pub recipient_id: ID,
    pub feedback_type: FeedbackType,
    pub priority: Option<Priority>,
    pub title: String,
    pub content: String,
    pub is_anonymous: Option<bool>,
    pub requires_action: Option<bool>,
}

#[derive(InputObject, Clone)]
pub struct ScheduleMeetingInput {
    pub employee_id: ID,
    pub meeting_type: MeetingType,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub agenda: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct MeetingOutcomeInput {
    pub id: ID,
    pub discussion_points: Option<Json<Value>>,
    pub action_items: Option<Json<Value>>,
    pub employee_feedback: Option<String>,
    pub manager_notes: Option<String>,
    pub next_meeting_date: Option<NaiveDate>,
}

#[derive(Default)]
pub struct EvaluationQuery;

#[Object]
impl EvaluationQuery {
    async fn evaluation_periods(
        &self,
        ctx: &Context<'_>,
        year: Option<i32>,
    ) -> async_graphql::Result<Vec<EvaluationPeriodNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = evaluation_period::Entity::find();
        if let Some(year) = year {
            query = query.filter(evaluation_period::Column::Year.eq(year));
        }
        let rows = query
            .order_by_desc(evaluation_period::Column::StartDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EvaluationPeriodNode::from).collect())
    }

    async fn evaluation_templates(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<EvaluationTemplateNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let rows = evaluation_template::Entity::find()
            .filter(evaluation_template::Column::IsActive.eq(true))
            .order_by_asc(evaluation_template::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EvaluationTemplateNode::from).collect())
    }

    /// Without an employee filter, management sees everything and others see
    /// evaluations about them or written by them.
    async fn evaluations(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        period_id: Option<ID>,
    ) -> async_graphql::Result<Vec<EvaluationNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = evaluation::Entity::find();
        match employee_id {
            Some(id) => {
                let id = parse_uuid(&id)?;
                ensure_self_or_management(&viewer, id)?;
                query = query.filter(evaluation::Column::EmployeeId.eq(id));
            }
            None if viewer.is_management() => {}
            None => {
                query = query.filter(
                    Condition::any()
                        .add(evaluation::Column::EmployeeId.eq(viewer.user_id))
                        .add(evaluation::Column::EvaluatorId.eq(viewer.user_id)),
                );
            }
        }
        if let Some(period_id) = parse_optional_uuid(period_id.as_ref())? {
            query = query.filter(evaluation::Column::PeriodId.eq(period_id));
        }
        let rows = query
            .order_by_desc(evaluation::Column::CreatedAt)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EvaluationNode::from).collect())
    }

    async fn evaluation(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<EvaluationNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let row =
            find_required::<evaluation::Entity, _>(db.as_ref(), parse_uuid(&id)?, "evaluation").await?;
        if !viewer.is_self(row.evaluator_id) {
            ensure_self_or_management(&viewer, row.employee_id)?;
        }
        Ok(row.into())
    }

    async fn goals(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        status: Option<GoalStatus>,
    ) -> async_graphql::Result<Vec<GoalNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = goal::Entity::find();
        match employee_id {
            Some(id) => {
                let id = parse_uuid(&id)?;
                if !viewer.is_management() && !viewer.is_self(id) {
                    // Managers of a goal may list the goals they oversee.
                    query = query.filter(goal::Column::ManagerId.eq(viewer.user_id));
                }
                query = query.filter(goal::Column::EmployeeId.eq(id));
            }
            None => query = query.filter(goal::Column::EmployeeId.eq(viewer.user_id)),
        }
        if let Some(status) = status {
            query = query.filter(goal::Column::Status.eq(goal::Status::from(status)));
        }
        let rows = query
            .order_by_asc(goal::Column::TargetDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(GoalNode::from).collect())
    }

    async fn feedback_received(
        &self,
        ctx: &Context<'_>,
        unread_only: Option<bool>,
    ) -> async_graphql::Result<Vec<FeedbackNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let mut query =
            feedback::Entity::find().filter(feedback::Column::RecipientId.eq(viewer.user_id));
        if unread_only.unwrap_or(false) {
            query = query.filter(feedback::Column::IsRead.eq(false));
        }
        let rows = query
            .order_by_desc(feedback::Column::CreatedAt)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows
            .into_iter()
            .map(|row| FeedbackNode::for_viewer(row, &viewer))
            .collect())
    }

    async fn feedback_sent(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<FeedbackNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let rows = feedback::Entity::find()
            .filter(feedback::Column::SenderId.eq(viewer.user_id))
            .order_by_desc(feedback::Column::CreatedAt)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows
            .into_iter()
            .map(|row| FeedbackNode::for_viewer(row, &viewer))
            .collect())
    }

    async fn one_on_one_meetings(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<OneOnOneMeetingNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = one_on_one_meeting::Entity::find();
        match employee_id {
            Some(id) if viewer.is_management() => {
                query = query.filter(one_on_one_meeting::Column::EmployeeId.eq(parse_uuid(&id)?));
            }
            Some(id) => {
                query = query
                    .filter(one_on_one_meeting::Column::EmployeeId.eq(parse_uuid(&id)?))
                    .filter(participant(viewer.user_id));
            }
            None => query = query.filter(participant(viewer.user_id)),
        }
        let rows = query
            .order_by_desc(one_on_one_meeting::Column::ScheduledAt)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(OneOnOneMeetingNode::from).collect())
    }
}

#[derive(Default)]
pub struct EvaluationMutation;

#[Object]
impl EvaluationMutation {
    async fn create_evaluation_period(
        &self,
        ctx: &Context<'_>,
        input: EvaluationPeriodInput,
    ) -> async_graphql::Result<EvaluationPeriodNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        ensure_ordered(input.start_date, input.end_date).api()?;
        ensure_ordered(input.evaluation_start, input.evaluation_end).api()?;
        let period_type = evaluation_period::PeriodType::from(input.period_type);

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let taken = evaluation_period::Entity::find()
            .filter(evaluation_period::Column::Year.eq(input.year))
            .filter(evaluation_period::Column::PeriodType.eq(period_type))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Evaluation period already exists"));
        }
        let at = now();
        let row = evaluation_period::ActiveModel {
            id: Set(Uuid::new_v4()),
            year: Set(input.year),
            period_type: Set(period_type),
            name: Set(name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            evaluation_start: Set(input.evaluation_start),
            evaluation_end: Set(input.evaluation_end),
            is_active: Set(true),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "evaluation_period",
            row.id,
            "create",
            json!({ "year": row.year, "periodType": row.period_type.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_evaluation_template(
        &self,
        ctx: &Context<'_>,
        input: EvaluationTemplateInput,
    ) -> async_graphql::Result<EvaluationTemplateNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        let items = input.items.0;
        if parse_items(&items).api()?.is_empty() {
            return Err(validation_error("a template needs at least one item"));
        }
        let max_score = input.max_score.unwrap_or(Decimal::new(50, 1));
        let min_score = input.min_score.unwrap_or(Decimal::ONE);
        if min_score >= max_score {
            return Err(validation_error("minScore must be below maxScore"));
        }

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let at = now();
        let row = evaluation_template::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(input.description),
            items: Set(items),
            max_score: Set(max_score),
            min_score: Set(min_score),
            weight_total: Set(input.weight_total.unwrap_or(100)),
            is_active: Set(true),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "evaluation_template",
            row.id,
            "create",
            json!({ "name": row.name }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_evaluation(
        &self,
        ctx: &Context<'_>,
        input: CreateEvaluationInput,
    ) -> async_graphql::Result<EvaluationNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        let evaluator_id = parse_optional_uuid(input.evaluator_id.as_ref())?.unwrap_or(viewer.user_id);
        let period_id = parse_uuid(&input.period_id)?;
        let template_id = parse_uuid(&input.template_id)?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        find_employee(&txn, evaluator_id).await?;
        find_required::<evaluation_period::Entity, _>(&txn, period_id, "evaluation period").await?;
        find_required::<evaluation_template::Entity, _>(&txn, template_id, "evaluation template").await?;
        let taken = evaluation::Entity::find()
            .filter(evaluation::Column::EmployeeId.eq(employee_id))
            .filter(evaluation::Column::EvaluatorId.eq(evaluator_id))
            .filter(evaluation::Column::PeriodId.eq(period_id))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code(
                "CONFLICT",
                "This evaluator already evaluates the employee for the period",
            ));
        }
        let at = now();
        let row = evaluation::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            evaluator_id: Set(evaluator_id),
            period_id: Set(period_id),
            template_id: Set(template_id),
            scores: Set(json!({})),
            comments: Set(json!({})),
            overall_score: Set(None),
            grade: Set(None),
            strengths: Set(None),
            improvements: Set(None),
            goals: Set(json!([])),
            status: Set(evaluation::Status::Draft),
            submitted_at: Set(None),
            reviewed_at: Set(None),
            confirmed_at: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "evaluation",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "evaluatorId": evaluator_id }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Evaluators edit their own drafts; scores must fit the template range.
    async fn update_evaluation_scores(
        &self,
        ctx: &Context<'_>,
        input: EvaluationScoresInput,
    ) -> async_graphql::Result<EvaluationNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<evaluation::Entity, _>(&txn, parse_uuid(&input.id)?, "evaluation").await?;
        if !viewer.is_self(row.evaluator_id) {
            return Err(error_with_code("FORBIDDEN", "Only the evaluator can edit scores"));
        }
        if row.status != evaluation::Status::Draft {
            return Err(error_with_code(
                "INVALID_TRANSITION",
                format!("scores are locked once the evaluation is {}", row.status.to_value()),
            ));
        }
        let template =
            find_required::<evaluation_template::Entity, _>(&txn, row.template_id, "evaluation template")
                .await?;
        let scores = input.scores.0;
        validate_scores(&scores, template.min_score, template.max_score).api()?;

        let mut active = row.into_active_model();
        active.scores = Set(scores.clone());
        if let Some(comments) = input.comments {
            active.comments = Set(comments.0);
        }
        if let Some(goals) = input.goals {
            active.goals = Set(goals.0);
        }
        if input.strengths.is_some() {
            active.strengths = Set(input.strengths);
        }
        if input.improvements.is_some() {
            active.improvements = Set(input.improvements);
        }
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "evaluation",
            row.id,
            "update_scores",
            json!({ "scores": scores }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Submit a draft while the period's window is open; this fixes the
    /// overall score and grade.
    async fn submit_evaluation(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<EvaluationNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let id = parse_uuid(&id)?;
        let today = today(ctx);
        let span = info_span!("hr.evaluation.submit", evaluation_id = %id, evaluator = %viewer.user_id);
        async move {
            let txn = db.begin().await.api()?;
            let row = find_required::<evaluation::Entity, _>(&txn, id, "evaluation").await?;
            if !viewer.is_self(row.evaluator_id) {
                return Err(error_with_code("FORBIDDEN", "Only the evaluator can submit"));
            }
            let status = row.status.advance(evaluation::Status::Submitted).api()?;
            let period =
                find_required::<evaluation_period::Entity, _>(&txn, row.period_id, "evaluation period")
                    .await?;
            if !period.is_evaluation_open(today) {
                return Err(validation_error(format!(
                    "the evaluation window runs from {} to {}",
                    period.evaluation_start, period.evaluation_end
                )));
            }
            let template = find_required::<evaluation_template::Entity, _>(
                &txn,
                row.template_id,
                "evaluation template",
            )
            .await?;
            let (overall, grade) = evaluation::score(&row, &template).api()?;

            let mut active = row.into_active_model();
            active.status = Set(status);
            active.overall_score = Set(overall);
            active.grade = Set(grade);
            active.submitted_at = Set(Some(now()));
            active.updated_at = Set(now());
            let row = active.update(&txn).await.api()?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "evaluation",
                row.id,
                "submit",
                json!({
                    "overallScore": row.overall_score.map(|s| s.to_string()),
                    "grade": row.grade.map(|g| g.to_value()),
                }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            info!(grade = ?row.grade, "evaluation submitted");
            Ok(row.into())
        }
        .instrument(span)
        .await
    }

    async fn review_evaluation(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<EvaluationNode> {
        move_evaluation(ctx, id, evaluation::Status::UnderReview).await
    }

    async fn confirm_evaluation(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<EvaluationNode> {
        move_evaluation(ctx, id, evaluation::Status::Confirmed).await
    }

    async fn share_evaluation(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<EvaluationNode> {
        move_evaluation(ctx, id, evaluation::Status::Shared).await
    }

    async fn create_goal(&self, ctx: &Context<'_>, input: GoalInput) -> async_graphql::Result<GoalNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let manager_id = parse_optional_uuid(input.manager_id.as_ref())?;
        let period_id = parse_optional_uuid(input.period_id.as_ref())?;
        let title = required_text("title", &input.title)?;
        ensure_ordered(input.start_date, input.target_date).api()?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        if let Some(manager_id) = manager_id {
            find_employee(&txn, manager_id).await?;
        }
        if let Some(period_id) = period_id {
            find_required::<evaluation_period::Entity, _>(&txn, period_id, "evaluation period").await?;
        }
        let at = now();
        let row = goal::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            manager_id: Set(manager_id),
            period_id: Set(period_id),
            title: Set(title),
            description: Set(input.description),
            goal_type: Set(input.goal_type.into()),
            priority: Set(input
                .priority
                .map(Into::into)
                .unwrap_or(feedback::Priority::Medium)),
            start_date: Set(input.start_date),
            target_date: Set(input.target_date),
            completed_date: Set(None),
            progress: Set(0),
            status: Set(goal::Status::InProgress),
            achievement: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "goal",
            row.id,
            "create",
            json!({ "title": row.title, "targetDate": row.target_date }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn update_goal_progress(
        &self,
        ctx: &Context<'_>,
        id: ID,
        progress: i32,
    ) -> async_graphql::Result<GoalNode> {
        let viewer = current_user(ctx)?;
        if !(0..=100).contains(&progress) {
            return Err(validation_error("progress must be between 0 and 100"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<goal::Entity, _>(&txn, parse_uuid(&id)?, "goal").await?;
        ensure_goal_access(&viewer, &row)?;
        if row.status != goal::Status::InProgress {
            return Err(error_with_code(
                "INVALID_TRANSITION",
                format!("progress cannot change on a {} goal", row.status.to_value()),
            ));
        }
        let mut active = row.into_active_model();
        active.progress = Set(progress);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "goal",
            row.id,
            "progress",
            json!({ "progress": progress }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn complete_goal(
        &self,
        ctx: &Context<'_>,
        id: ID,
        achievement: Achievement,
    ) -> async_graphql::Result<GoalNode> {
        let viewer = current_user(ctx)?;
        let today = today(ctx);
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<goal::Entity, _>(&txn, parse_uuid(&id)?, "goal").await?;
        ensure_goal_access(&viewer, &row)?;
        let status = row.status.advance(goal::Status::Completed).api()?;
        let mut active = row.into_active_model();
        active.status = Set(status);
        active.progress = Set(100);
        active.completed_date = Set(Some(today));
        active.achievement = Set(Some(achievement.into()));
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "goal",
            row.id,
            "complete",
            json!({ "achievement": row.achievement.map(|a| a.to_value()) }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn set_goal_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: GoalStatus,
    ) -> async_graphql::Result<GoalNode> {
        let viewer = current_user(ctx)?;
        let next = goal::Status::from(status);
        if next == goal::Status::Completed {
            return Err(validation_error("use completeGoal to complete a goal"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<goal::Entity, _>(&txn, parse_uuid(&id)?, "goal").await?;
        ensure_goal_access(&viewer, &row)?;
        let status = row.status.advance(next).api()?;
        let mut active = row.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "goal",
            row.id,
            "transition",
            json!({ "status": status.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn send_feedback(
        &self,
        ctx: &Context<'_>,
        input: FeedbackInput,
    ) -> async_graphql::Result<FeedbackNode> {
        let viewer = current_user(ctx)?;
        let recipient_id = parse_uuid(&input.recipient_id)?;
        if viewer.is_self(recipient_id) {
            return Err(validation_error("feedback cannot be sent to yourself"));
        }
        let title = required_text("title", &input.title)?;
        let content = required_text("content", &input.content)?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, recipient_id).await?;
        let at = now();
        let row = feedback::ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(viewer.user_id),
            recipient_id: Set(recipient_id),
            feedback_type: Set(input.feedback_type.into()),
            priority: Set(input
                .priority
                .map(Into::into)
                .unwrap_or(feedback::Priority::Medium)),
            title: Set(title),
            content: Set(content),
            is_anonymous: Set(input.is_anonymous.unwrap_or(false)),
            is_read: Set(false),
            read_at: Set(None),
            requires_action: Set(input.requires_action.unwrap_or(false)),
            action_taken: Set(None),
            action_date: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        let actor = if row.is_anonymous { None } else { Some(viewer.user_id) };
        record_audit(
            &txn,
            actor,
            "feedback",
            row.id,
            "create",
            json!({ "recipientId": recipient_id }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(FeedbackNode::for_viewer(row, &viewer))
    }

    async fn mark_feedback_read(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<FeedbackNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<feedback::Entity, _>(&txn, parse_uuid(&id)?, "feedback").await?;
        if !viewer.is_self(row.recipient_id) {
            return Err(error_with_code("FORBIDDEN", "Only the recipient can mark feedback read"));
        }
        if row.is_read {
            txn.commit().await.api()?;
            return Ok(FeedbackNode::for_viewer(row, &viewer));
        }
        let mut active = row.into_active_model();
        active.is_read = Set(true);
        active.read_at = Set(Some(now()));
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(&txn, Some(viewer.user_id), "feedback", row.id, "read", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(FeedbackNode::for_viewer(row, &viewer))
    }

    async fn record_feedback_action(
        &self,
        ctx: &Context<'_>,
        id: ID,
        action_taken: String,
    ) -> async_graphql::Result<FeedbackNode> {
        let viewer = current_user(ctx)?;
        let action_taken = required_text("actionTaken", &action_taken)?;
        let today = today(ctx);
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<feedback::Entity, _>(&txn, parse_uuid(&id)?, "feedback").await?;
        ensure_self_or_management(&viewer, row.recipient_id)?;
        let mut active = row.into_active_model();
        active.action_taken = Set(Some(action_taken.clone()));
        active.action_date = Set(Some(today));
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "feedback",
            row.id,
            "action",
            json!({ "actionTaken": action_taken }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(FeedbackNode::for_viewer(row, &viewer))
    }

    /// The caller becomes the meeting's manager.
    async fn schedule_one_on_one(
        &self,
        ctx: &Context<'_>,
        input: ScheduleMeetingInput,
    ) -> async_graphql::Result<OneOnOneMeetingNode> {
        let viewer = current_user(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        if viewer.is_self(employee_id) {
            return Err(validation_error("a one-on-one needs two people"));
        }
        let duration = input.duration_minutes.unwrap_or(30);
        if duration <= 0 {
            return Err(validation_error("durationMinutes must be positive"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = one_on_one_meeting::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            manager_id: Set(viewer.user_id),
            meeting_type: Set(input.meeting_type.into()),
            status: Set(one_on_one_meeting::Status::Scheduled),
            scheduled_at: Set(input.scheduled_at.fixed_offset()),
            duration_minutes: Set(duration),
            agenda: Set(input.agenda),
            discussion_points: Set(json!([])),
            action_items: Set(json!([])),
            employee_feedback: Set(None),
            manager_notes: Set(None),
            next_meeting_date: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "one_on_one_meeting",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "scheduledAt": input.scheduled_at }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn set_meeting_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: MeetingStatus,
    ) -> async_graphql::Result<OneOnOneMeetingNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row =
            find_required::<one_on_one_meeting::Entity, _>(&txn, parse_uuid(&id)?, "meeting").await?;
        ensure_meeting_manager(&viewer, &row)?;
        let status = row.status.advance(status.into()).api()?;
        let mut active = row.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "one_on_one_meeting",
            row.id,
            "transition",
            json!({ "status": status.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Notes and follow-ups. The employee may only leave their own feedback.
    async fn record_meeting_outcome(
        &self,
        ctx: &Context<'_>,
        input: MeetingOutcomeInput,
    ) -> async_graphql::Result<OneOnOneMeetingNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row =
            find_required::<one_on_one_meeting::Entity, _>(&txn, parse_uuid(&input.id)?, "meeting")
                .await?;
        let is_manager = viewer.is_self(row.manager_id) || viewer.is_management();
        let is_employee = viewer.is_self(row.employee_id);
        if !is_manager && !is_employee {
            return Err(error_with_code("FORBIDDEN", "Insufficient permissions"));
        }
        let manager_fields = input.discussion_points.is_some()
            || input.action_items.is_some()
            || input.manager_notes.is_some()
            || input.next_meeting_date.is_some();
        if manager_fields && !is_manager {
            return Err(error_with_code("FORBIDDEN", "Only the manager can record outcomes"));
        }

        let mut active = row.into_active_model();
        if let Some(points) = input.discussion_points {
            active.discussion_points = Set(points.0);
        }
        if let Some(items) = input.action_items {
            active.action_items = Set(items.0);
        }
        if input.employee_feedback.is_some() {
            active.employee_feedback = Set(input.employee_feedback);
        }
        if input.manager_notes.is_some() {
            active.manager_notes = Set(input.manager_notes);
        }
        if input.next_meeting_date.is_some() {
            active.next_meeting_date = Set(input.next_meeting_date);
        }
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "one_on_one_meeting",
            row.id,
            "outcome",
            json!({ "nextMeetingDate": row.next_meeting_date }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }
}

async fn move_evaluation(
    ctx: &Context<'_>,
    id: ID,
    next: evaluation::Status,
) -> async_graphql::Result<EvaluationNode> {
    let viewer = require_management(ctx)?;
    let db = database(ctx)?;
    let txn = db.begin().await.api()?;
    let row = find_required::<evaluation::Entity, _>(&txn, parse_uuid(&id)?, "evaluation").await?;
    let status = row.status.advance(next).api()?;
    let at = now();
    let mut active = row.into_active_model();
    active.status = Set(status);
    match status {
        evaluation::Status::UnderReview => active.reviewed_at = Set(Some(at)),
        evaluation::Status::Confirmed => active.confirmed_at = Set(Some(at)),
        _ => {}
    }
    active.updated_at = Set(at);
    let row = active.update(&txn).await.api()?;
    record_audit(
        &txn,
        Some(viewer.user_id),
        "evaluation",
        row.id,
        "transition",
        json!({ "status": status.to_value() }),
    )
    .await
    .api()?;
    txn.commit().await.api()?;
    Ok(row.into())
}

fn participant(user_id: Uuid) -> Condition {
    Condition::any()
        .add(one_on_one_meeting::Column::EmployeeId.eq(user_id))
        .add(one_on_one_meeting::Column::ManagerId.eq(user_id))
}

fn ensure_goal_access(viewer: &CurrentUser, goal: &goal::Model) -> async_graphql::Result<()> {
    if goal.manager_id.map_or(false, |m| viewer.is_self(m)) {
        return Ok(());
    }
    ensure_self_or_management(viewer, goal.employee_id)
}

fn ensure_meeting_manager(
    viewer: &CurrentUser,
    meeting: &one_on_one_meeting::Model,
) -> async_graphql::Result<()> {
    if viewer.is_self(meeting.manager_id) || viewer.is_management() {
        Ok(())
    } else {
        Err(error_with_code("FORBIDDEN", "Only the meeting's manager can do that"))
    }
}
