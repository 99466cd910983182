use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Error, ErrorExtensions, MergedObject, Object, Schema, ID,
};
use chrono::{DateTime, NaiveDate, Utc};
use entity::{audit_entry, user};
use platform_api::{ApiError, ResultExt};
use products_hr::WorkPolicy;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PrimaryKeyTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{AuthConfig, CurrentUser, UserRole};

mod attendance;
mod audit;
mod competencies;
mod documents;
pub mod enums;
mod evaluation;
mod organization;
mod payroll;
mod people;

pub use organization::{render_org_action, render_org_chart};

pub type HrSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub struct AppSchema(pub HrSchema);

pub fn build_schema(
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthConfig>,
    policy: WorkPolicy,
) -> AppSchema {
    let schema = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .data(auth)
        .data(policy)
        .finish();
    AppSchema(schema)
}

pub struct QueryRoot;
pub struct MutationRoot;

#[derive(MergedObject, Default)]
pub struct HrQuery(
    people::PeopleQuery,
    competencies::CompetencyQuery,
    attendance::AttendanceQuery,
    payroll::PayrollQuery,
    evaluation::EvaluationQuery,
    organization::OrganizationQuery,
    documents::DocumentQuery,
    audit::AuditQuery,
);

#[derive(MergedObject, Default)]
pub struct HrMutation(
    people::PeopleMutation,
    competencies::CompetencyMutation,
    attendance::AttendanceMutation,
    payroll::PayrollMutation,
    evaluation::EvaluationMutation,
    organization::OrganizationMutation,
    documents::DocumentMutation,
);

#[Object]
impl QueryRoot {
    async fn hr(&self) -> HrQuery {
        HrQuery::default()
    }
}

#[Object]
impl MutationRoot {
    async fn hr(&self) -> HrMutation {
        HrMutation::default()
    }
}

const MAX_PAGE: i32 = 100;

pub(crate) fn database(ctx: &Context<'_>) -> async_graphql::Result<Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing database connection"))
}

pub(crate) fn auth_config(ctx: &Context<'_>) -> async_graphql::Result<Arc<AuthConfig>> {
    ctx.data::<Arc<AuthConfig>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing auth configuration"))
}

pub(crate) fn work_policy(ctx: &Context<'_>) -> WorkPolicy {
    ctx.data_opt::<WorkPolicy>().copied().unwrap_or_default()
}

/// Calendar date in the office time zone.
pub(crate) fn today(ctx: &Context<'_>) -> NaiveDate {
    work_policy(ctx).local_date(&Utc::now())
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

pub(crate) fn current_user(ctx: &Context<'_>) -> async_graphql::Result<CurrentUser> {
    ctx.data::<CurrentUser>()
        .cloned()
        .map_err(|_| error_with_code("UNAUTHENTICATED", "Login required"))
}

pub(crate) fn require_role(
    ctx: &Context<'_>,
    role: UserRole,
) -> async_graphql::Result<CurrentUser> {
    let user = current_user(ctx)?;
    if user.has_role(role) {
        Ok(user)
    } else {
        Err(error_with_code("FORBIDDEN", "Insufficient permissions"))
    }
}

pub(crate) fn require_management(ctx: &Context<'_>) -> async_graphql::Result<CurrentUser> {
    require_role(ctx, UserRole::HrManager)
}

pub(crate) fn ensure_self_or_management(
    viewer: &CurrentUser,
    employee_id: Uuid,
) -> async_graphql::Result<()> {
    if viewer.is_self(employee_id) || viewer.is_management() {
        Ok(())
    } else {
        Err(error_with_code("FORBIDDEN", "Insufficient permissions"))
    }
}

/// Employee a self-service call acts on: the caller unless another id is
/// given, which only management may do.
pub(crate) fn subject_employee(
    viewer: &CurrentUser,
    employee_id: Option<&ID>,
) -> async_graphql::Result<Uuid> {
    let id = match employee_id {
        Some(id) => parse_uuid(id)?,
        None => viewer.user_id,
    };
    ensure_self_or_management(viewer, id)?;
    Ok(id)
}

pub(crate) fn parse_uuid(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| error_with_code("VALIDATION", "Invalid ID"))
}

pub(crate) fn parse_optional_uuid(id: Option<&ID>) -> async_graphql::Result<Option<Uuid>> {
    id.map(parse_uuid).transpose()
}

pub(crate) fn to_id(id: Uuid) -> ID {
    ID::from(id.to_string())
}

pub(crate) fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn error_with_code(code: &'static str, message: impl Into<String>) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", code))
}

pub(crate) fn validation_error(message: impl Into<String>) -> Error {
    ApiError::validation(message).extend()
}

pub(crate) fn not_found(what: &'static str) -> Error {
    ApiError::NotFound(what).extend()
}

/// `(limit, offset)` for a page request.
pub(crate) fn page(first: Option<i32>, offset: Option<i32>) -> async_graphql::Result<(u64, u64)> {
    let first = first.unwrap_or(50);
    if first > MAX_PAGE {
        return Err(ApiError::LimitExceeded(format!("first must be at most {}", MAX_PAGE)).extend());
    }
    if first < 1 || offset.unwrap_or(0) < 0 {
        return Err(validation_error("first must be positive and offset non-negative"));
    }
    Ok((first as u64, offset.unwrap_or(0) as u64))
}

pub(crate) async fn find_required<E, C>(
    conn: &C,
    id: Uuid,
    what: &'static str,
) -> async_graphql::Result<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id)
        .one(conn)
        .await
        .api()?
        .ok_or_else(|| not_found(what))
}

pub(crate) async fn find_employee<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> async_graphql::Result<user::Model> {
    find_required::<user::Entity, _>(conn, id, "employee").await
}

/// Append one audit row. Callers pass the open transaction so the entry
/// commits or rolls back with the change it describes.
pub(crate) async fn record_audit<C: ConnectionTrait>(
    conn: &C,
    actor: Option<Uuid>,
    entity_type: &str,
    entity_id: Uuid,
    action: &str,
    changes: Value,
) -> Result<(), DbErr> {
    audit_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id),
        action: Set(action.to_string()),
        actor_id: Set(actor),
        changes: Set(changes),
        created_at: Set(now()),
    }
    .insert(conn)
    .await
    .map(|_| ())
}
