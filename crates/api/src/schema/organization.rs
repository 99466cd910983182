use std::collections::BTreeSet;
use std::fmt::Write as _;

use async_graphql::{ComplexObject, Context, InputObject, Json, Object, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use entity::workflow::Workflow;
use entity::{
    employee_organization, job_title, organization, organization_change_request, position, user,
};
use platform_api::ResultExt;
use products_hr::org::level_for_parent;
use products_hr::OrgTree;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::enums::{AppointmentType, ChangeStatus, ChangeType, OrganizationType};
use super::people::{required_text, UserNode};
use super::{
    current_user, database, error_with_code, find_employee, find_required, not_found, now,
    parse_optional_uuid, parse_uuid, record_audit, require_management, subject_employee, to_id,
    today, utc, validation_error,
};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Organization", complex)]
pub struct OrganizationNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub parent_id: Option<ID>,
    pub level: i32,
    pub organization_type: OrganizationType,
    pub manager_id: Option<ID>,
    pub assistant_manager_id: Option<ID>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub floor: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub employee_count: i32,
    pub established_date: Option<NaiveDate>,
    #[graphql(skip)]
    model: organization::Model,
}

impl From<organization::Model> for OrganizationNode {
    fn from(model: organization::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name.clone(),
            code: model.code.clone(),
            parent_id: model.parent_id.map(to_id),
            level: model.level,
            organization_type: model.organization_type.into(),
            manager_id: model.manager_id.map(to_id),
            assistant_manager_id: model.assistant_manager_id.map(to_id),
            description: model.description.clone(),
            location: model.location.clone(),
            floor: model.floor.clone(),
            phone: model.phone.clone(),
            email: model.email.clone(),
            is_active: model.is_active,
            employee_count: model.employee_count,
            established_date: model.established_date,
            model,
        }
    }
}

#[ComplexObject]
impl OrganizationNode {
    /// `Root > Division > Team`, ending with this unit.
    async fn full_path(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let db = database(ctx)?;
        let tree = load_tree(db.as_ref()).await?;
        Ok(tree
            .full_path(self.model.id)
            .unwrap_or_else(|| self.model.name.clone()))
    }

    async fn ancestor_names(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        let db = database(ctx)?;
        let tree = load_tree(db.as_ref()).await?;
        Ok(tree.ancestor_names(self.model.id))
    }

    async fn parent(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<OrganizationNode>> {
        let Some(parent_id) = self.model.parent_id else {
            return Ok(None);
        };
        let db = database(ctx)?;
        let parent = organization::Entity::find_by_id(parent_id)
            .one(db.as_ref())
            .await
            .api()?;
        Ok(parent.map(OrganizationNode::from))
    }

    /// Active child units in name order.
    async fn children(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<OrganizationNode>> {
        let db = database(ctx)?;
        let rows = organization::Entity::find()
            .filter(organization::Column::ParentId.eq(self.model.id))
            .filter(organization::Column::IsActive.eq(true))
            .order_by_asc(organization::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(OrganizationNode::from).collect())
    }

    /// Employees with a current assignment here or anywhere below.
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserNode>> {
        let db = database(ctx)?;
        let tree = load_tree(db.as_ref()).await?;
        let ids = subtree_employee_ids(db.as_ref(), &tree, self.model.id, today(ctx)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(UserNode::from).collect())
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Position")]
pub struct PositionNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub level: i32,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<position::Model> for PositionNode {
    fn from(model: position::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            code: model.code,
            level: model.level,
            description: model.description,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "JobTitle")]
pub struct JobTitleNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<job_title::Model> for JobTitleNode {
    fn from(model: job_title::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            code: model.code,
            description: model.description,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EmployeeOrganization", complex)]
pub struct EmployeeOrganizationNode {
    pub id: ID,
    pub employee_id: ID,
    pub organization_id: ID,
    pub position_id: Option<ID>,
    pub job_title_id: Option<ID>,
    pub appointment_type: AppointmentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub base_salary: Option<i64>,
    pub allowances: Json<Value>,
    pub is_primary: bool,
    pub is_active: bool,
    pub notes: Option<String>,
    #[graphql(skip)]
    model: employee_organization::Model,
}

impl From<employee_organization::Model> for EmployeeOrganizationNode {
    fn from(model: employee_organization::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            organization_id: to_id(model.organization_id),
            position_id: model.position_id.map(to_id),
            job_title_id: model.job_title_id.map(to_id),
            appointment_type: model.appointment_type.into(),
            start_date: model.start_date,
            end_date: model.end_date,
            base_salary: model.base_salary,
            allowances: Json(model.allowances.clone()),
            is_primary: model.is_primary,
            is_active: model.is_active,
            notes: model.notes.clone(),
            model,
        }
    }
}

#[ComplexObject]
impl EmployeeOrganizationNode {
    async fn is_current(&self, ctx: &Context<'_>) -> bool {
        self.model.is_current(today(ctx))
    }

    async fn duration_months(&self, ctx: &Context<'_>) -> i32 {
        self.model.duration_months(today(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "OrganizationChangeRequest")]
pub struct ChangeRequestNode {
    pub id: ID,
    pub change_type: ChangeType,
    pub title: String,
    pub target_organization_id: Option<ID>,
    pub new_parent_id: Option<ID>,
    pub details: Json<Value>,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub status: ChangeStatus,
    pub requester_id: Option<ID>,
    pub approver_id: Option<ID>,
    pub approved_at: Option<DateTime<Utc>>,
    pub implemented_at: Option<DateTime<Utc>>,
}

impl From<organization_change_request::Model> for ChangeRequestNode {
    fn from(model: organization_change_request::Model) -> Self {
        Self {
            id: to_id(model.id),
            change_type: model.change_type.into(),
            title: model.title,
            target_organization_id: model.target_organization_id.map(to_id),
            new_parent_id: model.new_parent_id.map(to_id),
            details: Json(model.details),
            reason: model.reason,
            effective_date: model.effective_date,
            status: model.status.into(),
            requester_id: model.requester_id.map(to_id),
            approver_id: model.approver_id.map(to_id),
            approved_at: model.approved_at.map(utc),
            implemented_at: model.implemented_at.map(utc),
        }
    }
}

#[derive(InputObject, Clone)]
pub struct OrganizationInput {
    pub name: String,
    pub code: String,
    pub parent_id: Option<ID>,
    pub organization_type: OrganizationType,
    pub manager_id: Option<ID>,
    pub assistant_manager_id: Option<ID>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub floor: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub established_date: Option<NaiveDate>,
}

#[derive(InputObject, Clone)]
pub struct CatalogEntryInput {
    pub name: String,
    pub code: String,
    pub level: Option<i32>,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct AssignmentInput {
    pub employee_id: ID,
    pub organization_id: ID,
    pub position_id: Option<ID>,
    pub job_title_id: Option<ID>,
    pub appointment_type: AppointmentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub base_salary: Option<i64>,
    pub allowances: Option<Json<Value>>,
    pub is_primary: Option<bool>,
    pub notes: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct ChangeRequestInput {
    pub change_type: ChangeType,
    pub title: String,
    pub target_organization_id: Option<ID>,
    pub new_parent_id: Option<ID>,
    /// CREATE reads `name`, `code`, `organizationType`; SPLIT reads `units[]`.
    pub details: Option<Json<Value>>,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
}

#[derive(Default)]
pub struct OrganizationQuery;

#[Object]
impl OrganizationQuery {
    async fn organizations(
        &self,
        ctx: &Context<'_>,
        include_inactive: Option<bool>,
        parent_id: Option<ID>,
    ) -> async_graphql::Result<Vec<OrganizationNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = organization::Entity::find();
        if !include_inactive.unwrap_or(false) {
            query = query.filter(organization::Column::IsActive.eq(true));
        }
        if let Some(parent_id) = parse_optional_uuid(parent_id.as_ref())? {
            query = query.filter(organization::Column::ParentId.eq(parent_id));
        }
        let rows = query
            .order_by_asc(organization::Column::Level)
            .order_by_asc(organization::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(OrganizationNode::from).collect())
    }

    async fn organization(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<OrganizationNode> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let row = find_required::<organization::Entity, _>(db.as_ref(), parse_uuid(&id)?, "organization")
            .await?;
        Ok(row.into())
    }

    /// Active top-level units; walk `children` for the rest.
    async fn organization_roots(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<OrganizationNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let rows = active_organizations(db.as_ref()).await.api()?;
        let tree = OrgTree::new(rows.iter().map(organization::Model::node));
        let roots: Vec<Uuid> = tree.roots().into_iter().map(|n| n.id).collect();
        Ok(rows
            .into_iter()
            .filter(|row| roots.contains(&row.id))
            .map(OrganizationNode::from)
            .collect())
    }

    async fn positions(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<PositionNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let rows = position::Entity::find()
            .order_by_asc(position::Column::Level)
            .order_by_asc(position::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(PositionNode::from).collect())
    }

    async fn job_titles(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<JobTitleNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let rows = job_title::Entity::find()
            .order_by_asc(job_title::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(JobTitleNode::from).collect())
    }

    async fn employee_assignments(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<EmployeeOrganizationNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = employee_organization::Entity::find()
            .filter(employee_organization::Column::EmployeeId.eq(employee_id))
            .order_by_desc(employee_organization::Column::StartDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EmployeeOrganizationNode::from).collect())
    }

    async fn organization_change_requests(
        &self,
        ctx: &Context<'_>,
        status: Option<ChangeStatus>,
    ) -> async_graphql::Result<Vec<ChangeRequestNode>> {
        require_management(ctx)?;
        let db = database(ctx)?;
        let mut query = organization_change_request::Entity::find();
        if let Some(status) = status {
            query = query.filter(
                organization_change_request::Column::Status
                    .eq(organization_change_request::Status::from(status)),
            );
        }
        let rows = query
            .order_by_desc(organization_change_request::Column::EffectiveDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(ChangeRequestNode::from).collect())
    }
}

#[derive(Default)]
pub struct OrganizationMutation;

#[Object]
impl OrganizationMutation {
    async fn create_organization(
        &self,
        ctx: &Context<'_>,
        input: OrganizationInput,
    ) -> async_graphql::Result<OrganizationNode> {
        let viewer = require_management(ctx)?;
        let parent_id = parse_optional_uuid(input.parent_id.as_ref())?;
        let manager_id = parse_optional_uuid(input.manager_id.as_ref())?;
        let assistant_manager_id = parse_optional_uuid(input.assistant_manager_id.as_ref())?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        for id in manager_id.iter().chain(assistant_manager_id.iter()) {
            find_employee(&txn, *id).await?;
        }
        let row = insert_organization(
            &txn,
            NewOrganization {
                name: input.name,
                code: input.code,
                parent_id,
                organization_type: input.organization_type.into(),
                manager_id,
                assistant_manager_id,
                description: input.description,
                location: input.location,
                floor: input.floor,
                phone: input.phone,
                email: input.email,
                established_date: input.established_date,
            },
        )
        .await?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "organization",
            row.id,
            "create",
            json!({ "code": row.code, "parentId": row.parent_id, "level": row.level }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Reparent a unit; `parentId: null` makes it a root. Levels below it
    /// follow.
    async fn move_organization(
        &self,
        ctx: &Context<'_>,
        id: ID,
        parent_id: Option<ID>,
    ) -> async_graphql::Result<OrganizationNode> {
        let viewer = require_management(ctx)?;
        let id = parse_uuid(&id)?;
        let parent_id = parse_optional_uuid(parent_id.as_ref())?;
        let db = database(ctx)?;
        let span = info_span!("hr.org.move", organization_id = %id);
        async move {
            let txn = db.begin().await.api()?;
            let row = reparent(&txn, id, parent_id).await?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "organization",
                row.id,
                "move",
                json!({ "parentId": parent_id, "level": row.level }),
            )
            .await
            .api()?;
            refresh_counts(&txn, today(ctx)).await?;
            txn.commit().await.api()?;
            Ok(row.into())
        }
        .instrument(span)
        .await
    }

    /// Deactivate a unit that has no active children.
    async fn deactivate_organization(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<OrganizationNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<organization::Entity, _>(&txn, parse_uuid(&id)?, "organization").await?;
        let active_children = organization::Entity::find()
            .filter(organization::Column::ParentId.eq(row.id))
            .filter(organization::Column::IsActive.eq(true))
            .one(&txn)
            .await
            .api()?;
        if active_children.is_some() {
            return Err(validation_error("deactivate or move the child units first"));
        }
        let row = deactivate(&txn, row).await?;
        record_audit(&txn, Some(viewer.user_id), "organization", row.id, "deactivate", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Recount the distinct current employees of a unit and its subtree.
    async fn update_employee_count(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<OrganizationNode> {
        require_management(ctx)?;
        let id = parse_uuid(&id)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<organization::Entity, _>(&txn, id, "organization").await?;
        let tree = load_tree(&txn).await?;
        let count = subtree_employee_ids(&txn, &tree, id, today(ctx)).await?.len() as i32;
        let mut active = row.into_active_model();
        active.employee_count = Set(count);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_position(
        &self,
        ctx: &Context<'_>,
        input: CatalogEntryInput,
    ) -> async_graphql::Result<PositionNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        let code = required_text("code", &input.code)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let taken = position::Entity::find()
            .filter(
                Condition::any()
                    .add(position::Column::Name.eq(name.as_str()))
                    .add(position::Column::Code.eq(code.as_str())),
            )
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Position name or code already exists"));
        }
        let at = now();
        let row = position::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            level: Set(input.level.unwrap_or(1)),
            description: Set(input.description),
            is_active: Set(true),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(&txn, Some(viewer.user_id), "position", row.id, "create", json!({ "code": row.code }))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_job_title(
        &self,
        ctx: &Context<'_>,
        input: CatalogEntryInput,
    ) -> async_graphql::Result<JobTitleNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        let code = required_text("code", &input.code)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let taken = job_title::Entity::find()
            .filter(
                Condition::any()
                    .add(job_title::Column::Name.eq(name.as_str()))
                    .add(job_title::Column::Code.eq(code.as_str())),
            )
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Job title name or code already exists"));
        }
        let at = now();
        let row = job_title::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            description: Set(input.description),
            is_active: Set(true),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(&txn, Some(viewer.user_id), "job_title", row.id, "create", json!({ "code": row.code }))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn assign_employee(
        &self,
        ctx: &Context<'_>,
        input: AssignmentInput,
    ) -> async_graphql::Result<EmployeeOrganizationNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        let organization_id = parse_uuid(&input.organization_id)?;
        let position_id = parse_optional_uuid(input.position_id.as_ref())?;
        let job_title_id = parse_optional_uuid(input.job_title_id.as_ref())?;
        if let Some(end) = input.end_date {
            products_hr::calendar::ensure_ordered(input.start_date, end).api()?;
        }
        let is_primary = input.is_primary.unwrap_or(true);

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let org = find_required::<organization::Entity, _>(&txn, organization_id, "organization").await?;
        if !org.is_active {
            return Err(validation_error("cannot assign employees to an inactive unit"));
        }
        if let Some(id) = position_id {
            find_required::<position::Entity, _>(&txn, id, "position").await?;
        }
        if let Some(id) = job_title_id {
            find_required::<job_title::Entity, _>(&txn, id, "job title").await?;
        }
        let taken = employee_organization::Entity::find()
            .filter(employee_organization::Column::EmployeeId.eq(employee_id))
            .filter(employee_organization::Column::OrganizationId.eq(organization_id))
            .filter(employee_organization::Column::StartDate.eq(input.start_date))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code(
                "CONFLICT",
                "An appointment to this unit already starts on that date",
            ));
        }
        if is_primary {
            employee_organization::Entity::update_many()
                .col_expr(employee_organization::Column::IsPrimary, Expr::value(false))
                .filter(employee_organization::Column::EmployeeId.eq(employee_id))
                .exec(&txn)
                .await
                .api()?;
        }
        let at = now();
        let row = employee_organization::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            organization_id: Set(organization_id),
            position_id: Set(position_id),
            job_title_id: Set(job_title_id),
            appointment_type: Set(input.appointment_type.into()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            base_salary: Set(input.base_salary),
            allowances: Set(input.allowances.map(|a| a.0).unwrap_or_else(|| json!({}))),
            is_primary: Set(is_primary),
            is_active: Set(true),
            notes: Set(input.notes),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "employee_organization",
            row.id,
            "assign",
            json!({
                "employeeId": employee_id,
                "organizationId": organization_id,
                "appointmentType": row.appointment_type.to_value(),
            }),
        )
        .await
        .api()?;
        refresh_counts(&txn, today(ctx)).await?;
        txn.commit().await.api()?;
        info!(%employee_id, %organization_id, "employee assigned");
        Ok(row.into())
    }

    async fn end_assignment(
        &self,
        ctx: &Context<'_>,
        id: ID,
        end_date: NaiveDate,
    ) -> async_graphql::Result<EmployeeOrganizationNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<employee_organization::Entity, _>(&txn, parse_uuid(&id)?, "assignment")
            .await?;
        products_hr::calendar::ensure_ordered(row.start_date, end_date).api()?;
        let mut active = row.into_active_model();
        active.end_date = Set(Some(end_date));
        active.is_active = Set(false);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "employee_organization",
            row.id,
            "end",
            json!({ "endDate": end_date }),
        )
        .await
        .api()?;
        refresh_counts(&txn, today(ctx)).await?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_organization_change_request(
        &self,
        ctx: &Context<'_>,
        input: ChangeRequestInput,
    ) -> async_graphql::Result<ChangeRequestNode> {
        let viewer = require_management(ctx)?;
        let title = required_text("title", &input.title)?;
        let change_type = organization_change_request::ChangeType::from(input.change_type);
        let target = parse_optional_uuid(input.target_organization_id.as_ref())?;
        let new_parent = parse_optional_uuid(input.new_parent_id.as_ref())?;
        let details = input.details.map(|d| d.0).unwrap_or_else(|| json!({}));
        validate_change(change_type, target, new_parent, &details)?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        for id in target.iter().chain(new_parent.iter()) {
            find_required::<organization::Entity, _>(&txn, *id, "organization").await?;
        }
        let at = now();
        let row = organization_change_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            change_type: Set(change_type),
            title: Set(title),
            target_organization_id: Set(target),
            new_parent_id: Set(new_parent),
            details: Set(details),
            reason: Set(input.reason),
            effective_date: Set(input.effective_date),
            status: Set(organization_change_request::Status::Draft),
            requester_id: Set(Some(viewer.user_id)),
            approver_id: Set(None),
            approved_at: Set(None),
            implemented_at: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "organization_change_request",
            row.id,
            "create",
            json!({ "changeType": row.change_type.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn submit_organization_change(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<ChangeRequestNode> {
        move_change_request(ctx, id, organization_change_request::Status::UnderReview).await
    }

    async fn approve_organization_change(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<ChangeRequestNode> {
        move_change_request(ctx, id, organization_change_request::Status::Approved).await
    }

    async fn reject_organization_change(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<ChangeRequestNode> {
        move_change_request(ctx, id, organization_change_request::Status::Rejected).await
    }

    /// Apply an approved change to the tree and mark it implemented.
    async fn implement_organization_change(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<ChangeRequestNode> {
        let viewer = require_management(ctx)?;
        let id = parse_uuid(&id)?;
        let db = database(ctx)?;
        let today = today(ctx);
        let span = info_span!("hr.org.change.implement", change_request_id = %id);
        async move {
            let txn = db.begin().await.api()?;
            let request =
                find_required::<organization_change_request::Entity, _>(&txn, id, "change request").await?;
            let status = request
                .status
                .advance(organization_change_request::Status::Implemented)
                .api()?;
            let affected = apply_change(&txn, &request).await?;
            refresh_counts(&txn, today).await?;

            let change_type = request.change_type;
            let mut active = request.into_active_model();
            active.status = Set(status);
            active.implemented_at = Set(Some(now()));
            active.updated_at = Set(now());
            let request = active.update(&txn).await.api()?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "organization_change_request",
                request.id,
                "implement",
                json!({ "changeType": change_type.to_value(), "organizations": affected }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            info!(affected = affected.len(), "organization change implemented");
            Ok(request.into())
        }
        .instrument(span)
        .await
    }
}

struct NewOrganization {
    name: String,
    code: String,
    parent_id: Option<Uuid>,
    organization_type: organization::OrganizationType,
    manager_id: Option<Uuid>,
    assistant_manager_id: Option<Uuid>,
    description: Option<String>,
    location: Option<String>,
    floor: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    established_date: Option<NaiveDate>,
}

impl NewOrganization {
    fn named(name: String, code: String, parent_id: Option<Uuid>, kind: organization::OrganizationType) -> Self {
        Self {
            name,
            code,
            parent_id,
            organization_type: kind,
            manager_id: None,
            assistant_manager_id: None,
            description: None,
            location: None,
            floor: None,
            phone: None,
            email: None,
            established_date: None,
        }
    }
}

async fn insert_organization<C: ConnectionTrait>(
    conn: &C,
    new: NewOrganization,
) -> async_graphql::Result<organization::Model> {
    let name = required_text("name", &new.name)?;
    let code = required_text("code", &new.code)?;
    let taken = organization::Entity::find()
        .filter(organization::Column::Code.eq(code.as_str()))
        .one(conn)
        .await
        .api()?;
    if taken.is_some() {
        return Err(error_with_code(
            "CONFLICT",
            format!("Organization code {} already exists", code),
        ));
    }
    let parent_level = match new.parent_id {
        Some(parent_id) => {
            let parent = find_required::<organization::Entity, _>(conn, parent_id, "parent organization").await?;
            Some(parent.level)
        }
        None => None,
    };
    let at = now();
    organization::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        code: Set(code),
        parent_id: Set(new.parent_id),
        level: Set(level_for_parent(parent_level)),
        organization_type: Set(new.organization_type),
        manager_id: Set(new.manager_id),
        assistant_manager_id: Set(new.assistant_manager_id),
        description: Set(new.description),
        location: Set(new.location),
        floor: Set(new.floor),
        phone: Set(new.phone),
        email: Set(new.email),
        is_active: Set(true),
        employee_count: Set(0),
        established_date: Set(new.established_date),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(conn)
    .await
    .api()
}

/// Hang `id` under `new_parent` and renumber the levels of its subtree.
async fn reparent<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    new_parent: Option<Uuid>,
) -> async_graphql::Result<organization::Model> {
    let mut rows = organization::Entity::find().all(conn).await.api()?;
    let tree = OrgTree::new(rows.iter().map(organization::Model::node));
    if tree.get(id).is_none() {
        return Err(not_found("organization"));
    }
    if let Some(parent) = new_parent {
        if tree.get(parent).is_none() {
            return Err(not_found("parent organization"));
        }
    }
    tree.ensure_can_move(id, new_parent).api()?;

    for row in rows.iter_mut().filter(|row| row.id == id) {
        row.parent_id = new_parent;
    }
    let moved = OrgTree::new(rows.iter().map(organization::Model::node));
    let subtree = moved.subtree(id);
    let at = now();
    let mut target = None;
    for row in rows.into_iter().filter(|row| subtree.contains(&row.id)) {
        let level = moved.ancestors(row.id).len() as i32 + 1;
        let is_target = row.id == id;
        let mut active = row.into_active_model();
        if is_target {
            active.parent_id = Set(new_parent);
        }
        active.level = Set(level);
        active.updated_at = Set(at);
        let saved = active.update(conn).await.api()?;
        if is_target {
            target = Some(saved);
        }
    }
    target.ok_or_else(|| not_found("organization"))
}

async fn deactivate<C: ConnectionTrait>(
    conn: &C,
    row: organization::Model,
) -> async_graphql::Result<organization::Model> {
    let mut active = row.into_active_model();
    active.is_active = Set(false);
    active.updated_at = Set(now());
    active.update(conn).await.api()
}

fn validate_change(
    change_type: organization_change_request::ChangeType,
    target: Option<Uuid>,
    new_parent: Option<Uuid>,
    details: &Value,
) -> async_graphql::Result<()> {
    use organization_change_request::ChangeType;
    match change_type {
        ChangeType::Create => {
            detail_text(details, "name")?;
            detail_text(details, "code")?;
        }
        ChangeType::Abolish | ChangeType::Move => {
            target.ok_or_else(|| validation_error("targetOrganizationId is required"))?;
        }
        ChangeType::Merge => {
            target.ok_or_else(|| validation_error("targetOrganizationId is required"))?;
            new_parent.ok_or_else(|| validation_error("newParentId is required for a merge"))?;
        }
        ChangeType::Split => {
            target.ok_or_else(|| validation_error("targetOrganizationId is required"))?;
            let units = details.get("units").and_then(Value::as_array);
            if units.map_or(true, |u| u.is_empty()) {
                return Err(validation_error("details.units must list the new units"));
            }
        }
    }
    Ok(())
}

fn detail_text(details: &Value, key: &str) -> async_graphql::Result<String> {
    details
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| validation_error(format!("details.{} is required", key)))
}

fn detail_kind(details: &Value) -> async_graphql::Result<organization::OrganizationType> {
    match details.get("organizationType").and_then(Value::as_str) {
        None => Ok(organization::OrganizationType::Team),
        Some(raw) => organization::OrganizationType::try_from_value(&raw.to_string())
            .map_err(|_| validation_error(format!("unknown organizationType {}", raw))),
    }
}

/// Returns the ids of the units created or changed.
async fn apply_change<C: ConnectionTrait>(
    conn: &C,
    request: &organization_change_request::Model,
) -> async_graphql::Result<Vec<Uuid>> {
    use organization_change_request::ChangeType;
    let details = &request.details;
    let target = || {
        request
            .target_organization_id
            .ok_or_else(|| validation_error("targetOrganizationId is required"))
    };
    match request.change_type {
        ChangeType::Create => {
            let new = NewOrganization::named(
                detail_text(details, "name")?,
                detail_text(details, "code")?,
                request.new_parent_id,
                detail_kind(details)?,
            );
            Ok(vec![insert_organization(conn, new).await?.id])
        }
        ChangeType::Abolish => {
            let row = find_required::<organization::Entity, _>(conn, target()?, "organization").await?;
            Ok(vec![deactivate(conn, row).await?.id])
        }
        ChangeType::Move => {
            let row = reparent(conn, target()?, request.new_parent_id).await?;
            Ok(vec![row.id])
        }
        ChangeType::Merge => {
            let target_id = target()?;
            let into = request
                .new_parent_id
                .ok_or_else(|| validation_error("newParentId is required for a merge"))?;
            if into == target_id {
                return Err(validation_error("a unit cannot be merged into itself"));
            }
            let children = organization::Entity::find()
                .filter(organization::Column::ParentId.eq(target_id))
                .all(conn)
                .await
                .api()?;
            let mut affected = vec![target_id, into];
            for child in children {
                affected.push(reparent(conn, child.id, Some(into)).await?.id);
            }
            employee_organization::Entity::update_many()
                .col_expr(employee_organization::Column::OrganizationId, Expr::value(into))
                .col_expr(employee_organization::Column::UpdatedAt, Expr::value(now()))
                .filter(employee_organization::Column::OrganizationId.eq(target_id))
                .filter(employee_organization::Column::IsActive.eq(true))
                .exec(conn)
                .await
                .api()?;
            let row = find_required::<organization::Entity, _>(conn, target_id, "organization").await?;
            deactivate(conn, row).await?;
            Ok(affected)
        }
        ChangeType::Split => {
            let source = find_required::<organization::Entity, _>(conn, target()?, "organization").await?;
            let units = details
                .get("units")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let mut created = Vec::with_capacity(units.len());
            for unit in &units {
                let new = NewOrganization::named(
                    detail_text(unit, "name")?,
                    detail_text(unit, "code")?,
                    source.parent_id,
                    detail_kind(unit)?,
                );
                created.push(insert_organization(conn, new).await?.id);
            }
            Ok(created)
        }
    }
}

async fn move_change_request(
    ctx: &Context<'_>,
    id: ID,
    next: organization_change_request::Status,
) -> async_graphql::Result<ChangeRequestNode> {
    let viewer = require_management(ctx)?;
    let db = database(ctx)?;
    let txn = db.begin().await.api()?;
    let row = find_required::<organization_change_request::Entity, _>(&txn, parse_uuid(&id)?, "change request")
        .await?;
    let status = row.status.advance(next).api()?;
    let at = now();
    let mut active = row.into_active_model();
    active.status = Set(status);
    if matches!(
        status,
        organization_change_request::Status::Approved | organization_change_request::Status::Rejected
    ) {
        active.approver_id = Set(Some(viewer.user_id));
        active.approved_at = Set(Some(at));
    }
    active.updated_at = Set(at);
    let row = active.update(&txn).await.api()?;
    record_audit(
        &txn,
        Some(viewer.user_id),
        "organization_change_request",
        row.id,
        "transition",
        json!({ "status": status.to_value() }),
    )
    .await
    .api()?;
    txn.commit().await.api()?;
    Ok(row.into())
}

async fn load_tree<C: ConnectionTrait>(conn: &C) -> async_graphql::Result<OrgTree> {
    let rows = organization::Entity::find().all(conn).await.api()?;
    Ok(OrgTree::new(rows.iter().map(organization::Model::node)))
}

async fn active_organizations<C: ConnectionTrait>(conn: &C) -> Result<Vec<organization::Model>, DbErr> {
    organization::Entity::find()
        .filter(organization::Column::IsActive.eq(true))
        .order_by_asc(organization::Column::Name)
        .all(conn)
        .await
}

/// Distinct employees with a current assignment in `id` or below it.
async fn subtree_employee_ids<C: ConnectionTrait>(
    conn: &C,
    tree: &OrgTree,
    id: Uuid,
    today: NaiveDate,
) -> async_graphql::Result<BTreeSet<Uuid>> {
    let units = tree.subtree(id);
    let assignments = employee_organization::Entity::find()
        .filter(employee_organization::Column::OrganizationId.is_in(units))
        .filter(employee_organization::Column::IsActive.eq(true))
        .all(conn)
        .await
        .api()?;
    Ok(assignments
        .into_iter()
        .filter(|a| a.is_current(today))
        .map(|a| a.employee_id)
        .collect())
}

/// Recompute `employee_count` on every unit whose count changed.
async fn refresh_counts<C: ConnectionTrait>(conn: &C, today: NaiveDate) -> async_graphql::Result<()> {
    let rows = organization::Entity::find().all(conn).await.api()?;
    let tree = OrgTree::new(rows.iter().map(organization::Model::node));
    let assignments = employee_organization::Entity::find()
        .filter(employee_organization::Column::IsActive.eq(true))
        .all(conn)
        .await
        .api()?;
    let counts = tree.subtree_head_counts(
        assignments
            .into_iter()
            .filter(|a| a.is_current(today))
            .map(|a| (a.organization_id, a.employee_id)),
    );
    for row in rows {
        let count = counts.get(&row.id).copied().unwrap_or_default() as i32;
        if count != row.employee_count {
            let mut active = row.into_active_model();
            active.employee_count = Set(count);
            active.update(conn).await.api()?;
        }
    }
    Ok(())
}

/// Full HTML page with the active organization tree as nested lists.
pub async fn render_org_chart(db: &DatabaseConnection) -> Result<String, DbErr> {
    let rows = active_organizations(db).await?;
    let tree = OrgTree::new(rows.iter().map(organization::Model::node));
    let mut body = String::new();
    let roots: Vec<Uuid> = tree.roots().into_iter().map(|n| n.id).collect();
    render_level(&mut body, &tree, &rows, &roots);
    Ok(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Organization chart</title></head>\
         <body><h1>Organization chart</h1>{}</body></html>",
        body
    ))
}

fn render_level(out: &mut String, tree: &OrgTree, rows: &[organization::Model], ids: &[Uuid]) {
    if ids.is_empty() {
        return;
    }
    out.push_str("<ul class=\"org-tree\">");
    for id in ids {
        let Some(row) = rows.iter().find(|r| r.id == *id) else {
            continue;
        };
        let _ = write!(
            out,
            "<li data-id=\"{}\"><span class=\"org-node\">{}</span> <small>{} &middot; {}</small>",
            row.id,
            escape_html(&row.name),
            row.organization_type.to_value(),
            row.employee_count
        );
        let children: Vec<Uuid> = tree.children(*id).into_iter().map(|n| n.id).collect();
        render_level(out, tree, rows, &children);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Form fragment for an org chart action; unknown actions render nothing.
pub fn render_org_action(action: &str) -> String {
    match action {
        "create" => concat!(
            "<h2>Create unit</h2>",
            "<form data-action=\"create\">",
            "<input name=\"name\" placeholder=\"Name\" required>",
            "<input name=\"code\" placeholder=\"Code\" required>",
            "<select name=\"organizationType\">",
            "<option>DIVISION</option><option>DEPARTMENT</option><option selected>TEAM</option>",
            "<option>PART</option><option>GROUP</option></select>",
            "<input type=\"hidden\" name=\"parentId\">",
            "<button type=\"submit\">Create</button></form>"
        )
        .to_string(),
        "move" => concat!(
            "<h2>Move unit</h2>",
            "<form data-action=\"move\">",
            "<input type=\"hidden\" name=\"id\">",
            "<input name=\"parentId\" placeholder=\"New parent\">",
            "<button type=\"submit\">Move</button></form>"
        )
        .to_string(),
        "delete" => concat!(
            "<h2>Deactivate unit</h2>",
            "<p>The unit will be hidden from the chart.</p>",
            "<button type=\"submit\" data-action=\"delete\">Deactivate</button>"
        )
        .to_string(),
        "assign" => concat!(
            "<h2>Assign employee</h2>",
            "<form data-action=\"assign\">",
            "<input name=\"employeeId\" placeholder=\"Employee\" required>",
            "<input type=\"hidden\" name=\"organizationId\">",
            "<input type=\"date\" name=\"startDate\" required>",
            "<button type=\"submit\">Assign</button></form>"
        )
        .to_string(),
        _ => String::new(),
    }
}
