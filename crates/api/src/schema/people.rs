use async_graphql::{ComplexObject, Context, InputObject, Json, Object, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use entity::employee_profile::{self, append_history};
use entity::{department, user, user_secret};
use platform_api::ResultExt;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::enums::{EmployeeType, EmploymentStatus, WorkType};
use super::{
    auth_config, current_user, database, ensure_self_or_management, error_with_code,
    find_employee, find_required, now, page, parse_optional_uuid, parse_uuid, record_audit,
    require_management, subject_employee, to_id, today, utc, validation_error,
};
use crate::auth::{
    hash_password, issue_token, roles_for, session_cookie, verify_password, UserRole,
};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "User", complex)]
pub struct UserNode {
    pub id: ID,
    pub employee_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_hr_manager: bool,
    pub is_admin: bool,
    pub is_active: bool,
    pub is_management: bool,
    pub roles: Vec<String>,
    pub hire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserNode {
    fn from(model: user::Model) -> Self {
        Self {
            id: to_id(model.id),
            full_name: model.full_name(),
            is_management: model.is_management(),
            roles: roles_for(&model)
                .into_iter()
                .map(|r| r.as_str().to_string())
                .collect(),
            employee_id: model.employee_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            department: model.department,
            position: model.position,
            is_hr_manager: model.is_hr_manager,
            is_admin: model.is_admin,
            is_active: model.is_active,
            hire_date: model.hire_date,
            created_at: utc(model.created_at),
        }
    }
}

#[ComplexObject]
impl UserNode {
    async fn tenure_years(&self, ctx: &Context<'_>) -> i32 {
        products_hr::people::tenure_years(self.hire_date, today(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Department", complex)]
pub struct DepartmentNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub parent_id: Option<ID>,
    pub manager_id: Option<ID>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<department::Model> for DepartmentNode {
    fn from(model: department::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            code: model.code,
            parent_id: model.parent_id.map(to_id),
            manager_id: model.manager_id.map(to_id),
            description: model.description,
            is_active: model.is_active,
        }
    }
}

#[ComplexObject]
impl DepartmentNode {
    /// Active users whose department text matches this department's name.
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let users = user::Entity::find()
            .filter(user::Column::Department.eq(self.name.clone()))
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(users.into_iter().map(UserNode::from).collect())
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EmployeeProfile", complex)]
pub struct EmployeeProfileNode {
    pub id: ID,
    pub user_id: ID,
    pub resident_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub employee_type: EmployeeType,
    pub work_type: WorkType,
    pub position_history: Json<Value>,
    pub department_history: Json<Value>,
    pub status: EmploymentStatus,
    pub resignation_date: Option<NaiveDate>,
    pub resignation_reason: Option<String>,
}

impl From<employee_profile::Model> for EmployeeProfileNode {
    fn from(model: employee_profile::Model) -> Self {
        Self {
            id: to_id(model.id),
            user_id: to_id(model.user_id),
            resident_id: model.masked_resident_id(),
            birth_date: model.birth_date,
            address: model.address,
            employee_type: model.employee_type.into(),
            work_type: model.work_type.into(),
            position_history: Json(model.position_history),
            department_history: Json(model.department_history),
            status: model.status.into(),
            resignation_date: model.resignation_date,
            resignation_reason: model.resignation_reason,
        }
    }
}

#[ComplexObject]
impl EmployeeProfileNode {
    async fn age(&self, ctx: &Context<'_>) -> Option<i32> {
        self.birth_date
            .map(|born| products_hr::people::age(born, today(ctx)))
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserNode,
}

#[derive(InputObject, Clone)]
pub struct CreateUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_hr_manager: Option<bool>,
    pub is_admin: Option<bool>,
    pub password: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct UpdateUserInput {
    pub id: ID,
    pub employee_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_hr_manager: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(InputObject, Clone)]
pub struct CreateDepartmentInput {
    pub name: String,
    /// Generated when omitted.
    pub code: Option<String>,
    pub parent_id: Option<ID>,
    pub manager_id: Option<ID>,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct EmployeeProfileInput {
    pub user_id: ID,
    pub resident_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub employee_type: Option<EmployeeType>,
    pub work_type: Option<WorkType>,
}

#[derive(Default)]
pub struct PeopleQuery;

#[Object]
impl PeopleQuery {
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<UserNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        find_employee(db.as_ref(), viewer.user_id)
            .await
            .map(UserNode::from)
    }

    async fn users(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        offset: Option<i32>,
        search: Option<String>,
        department: Option<String>,
        include_inactive: Option<bool>,
    ) -> async_graphql::Result<Vec<UserNode>> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let (limit, offset) = page(first, offset)?;
        let span = info_span!("hr.users.list", viewer = %viewer.user_id);
        async move {
            let mut query = user::Entity::find();
            if !include_inactive.unwrap_or(false) {
                query = query.filter(user::Column::IsActive.eq(true));
            }
            if let Some(department) = department.filter(|d| !d.trim().is_empty()) {
                query = query.filter(user::Column::Department.eq(department));
            }
            if let Some(term) = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
                query = query.filter(
                    Condition::any()
                        .add(user::Column::Email.contains(&term))
                        .add(user::Column::FirstName.contains(&term))
                        .add(user::Column::LastName.contains(&term))
                        .add(user::Column::EmployeeId.contains(&term)),
                );
            }
            let users = query
                .order_by_asc(user::Column::LastName)
                .order_by_asc(user::Column::FirstName)
                .limit(limit)
                .offset(offset)
                .all(db.as_ref())
                .await
                .api()?;
            Ok(users.into_iter().map(UserNode::from).collect())
        }
        .instrument(span)
        .await
    }

    async fn user(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<UserNode> {
        let viewer = current_user(ctx)?;
        let id = parse_uuid(&id)?;
        ensure_self_or_management(&viewer, id)?;
        let db = database(ctx)?;
        find_employee(db.as_ref(), id).await.map(UserNode::from)
    }

    async fn departments(
        &self,
        ctx: &Context<'_>,
        include_inactive: Option<bool>,
    ) -> async_graphql::Result<Vec<DepartmentNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = department::Entity::find();
        if !include_inactive.unwrap_or(false) {
            query = query.filter(department::Column::IsActive.eq(true));
        }
        let rows = query
            .order_by_asc(department::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(DepartmentNode::from).collect())
    }

    async fn department(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<DepartmentNode> {
        current_user(ctx)?;
        let db = database(ctx)?;
        find_required::<department::Entity, _>(db.as_ref(), parse_uuid(&id)?, "department")
            .await
            .map(DepartmentNode::from)
    }

    async fn employee_profile(
        &self,
        ctx: &Context<'_>,
        user_id: Option<ID>,
    ) -> async_graphql::Result<Option<EmployeeProfileNode>> {
        let viewer = current_user(ctx)?;
        let user_id = subject_employee(&viewer, user_id.as_ref())?;
        let db = database(ctx)?;
        let profile = employee_profile::Entity::find()
            .filter(employee_profile::Column::UserId.eq(user_id))
            .one(db.as_ref())
            .await
            .api()?;
        Ok(profile.map(EmployeeProfileNode::from))
    }
}

#[derive(Default)]
pub struct PeopleMutation;

#[Object]
impl PeopleMutation {
    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> async_graphql::Result<AuthPayload> {
        let config = auth_config(ctx)?;
        if !config.local_auth_enabled {
            return Err(error_with_code("FORBIDDEN", "Local login is disabled"));
        }
        let db = database(ctx)?;
        let email = normalize_email(&email)?;

        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db.as_ref())
            .await
            .api()?
            .ok_or_else(invalid_credentials)?;
        if !user.is_active {
            return Err(error_with_code("FORBIDDEN", "User is inactive"));
        }
        let secret = user_secret::Entity::find_by_id(user.id)
            .one(db.as_ref())
            .await
            .api()?
            .ok_or_else(invalid_credentials)?;
        if !verify_password(&password, &secret.password_hash) {
            return Err(invalid_credentials());
        }

        let roles = roles_for(&user);
        let token = issue_token(user.id, &roles, &config)
            .map_err(|_| error_with_code("INTERNAL", "Failed to issue session token"))?;
        ctx.append_http_header(
            "Set-Cookie",
            session_cookie(&token, config.session_ttl_minutes),
        );
        info!(user_id = %user.id, "login succeeded");
        Ok(AuthPayload {
            token,
            user: user.into(),
        })
    }

    async fn logout(&self, ctx: &Context<'_>) -> bool {
        ctx.append_http_header("Set-Cookie", session_cookie("", -1));
        true
    }

    async fn create_user(
        &self,
        ctx: &Context<'_>,
        input: CreateUserInput,
    ) -> async_graphql::Result<UserNode> {
        let viewer = require_management(ctx)?;
        if input.is_admin.unwrap_or(false) && !viewer.has_role(UserRole::Admin) {
            return Err(error_with_code("FORBIDDEN", "Only admins can grant admin access"));
        }
        let db = database(ctx)?;
        let email = normalize_email(&input.email)?;
        let first_name = required_text("firstName", &input.first_name)?;
        let last_name = required_text("lastName", &input.last_name)?;
        let employee_id = input
            .employee_id
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let mut taken = Condition::any().add(user::Column::Email.eq(email.clone()));
        if let Some(number) = employee_id.clone() {
            taken = taken.add(user::Column::EmployeeId.eq(number));
        }
        let clash = user::Entity::find()
            .filter(taken)
            .one(db.as_ref())
            .await
            .api()?;
        if clash.is_some() {
            return Err(error_with_code(
                "CONFLICT",
                "A user with this email or employee number already exists",
            ));
        }
        let password_hash = match input.password.as_deref() {
            Some(password) => Some(hash_new_password(password)?),
            None => None,
        };

        let txn = db.begin().await.api()?;
        let at = now();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            email: Set(email),
            first_name: Set(first_name),
            last_name: Set(last_name),
            phone: Set(input.phone),
            department: Set(input.department),
            position: Set(input.position),
            is_hr_manager: Set(input.is_hr_manager.unwrap_or(false)),
            is_admin: Set(input.is_admin.unwrap_or(false)),
            is_active: Set(true),
            hire_date: Set(input.hire_date),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        if let Some(password_hash) = password_hash {
            user_secret::ActiveModel {
                user_id: Set(user.id),
                password_hash: Set(password_hash),
                updated_at: Set(at),
            }
            .insert(&txn)
            .await
            .api()?;
        }
        record_audit(
            &txn,
            Some(viewer.user_id),
            "user",
            user.id,
            "create",
            json!({ "email": user.email, "department": user.department }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(user.into())
    }

    async fn update_user(
        &self,
        ctx: &Context<'_>,
        input: UpdateUserInput,
    ) -> async_graphql::Result<UserNode> {
        let viewer = require_management(ctx)?;
        if input.is_admin.is_some() && !viewer.has_role(UserRole::Admin) {
            return Err(error_with_code("FORBIDDEN", "Only admins can change admin access"));
        }
        let db = database(ctx)?;
        let id = parse_uuid(&input.id)?;
        let txn = db.begin().await.api()?;
        let existing = find_employee(&txn, id).await?;
        let mut active = existing.into_active_model();
        if let Some(employee_id) = input.employee_id {
            let employee_id = Some(employee_id.trim().to_string()).filter(|e| !e.is_empty());
            if let Some(number) = employee_id.as_ref() {
                let taken = user::Entity::find()
                    .filter(user::Column::EmployeeId.eq(number.clone()))
                    .filter(user::Column::Id.ne(id))
                    .one(&txn)
                    .await
                    .api()?;
                if taken.is_some() {
                    return Err(error_with_code("CONFLICT", "Employee number already in use"));
                }
            }
            active.employee_id = Set(employee_id);
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(required_text("firstName", &first_name)?);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(required_text("lastName", &last_name)?);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(department) = input.department {
            active.department = Set(Some(department));
        }
        if let Some(position) = input.position {
            active.position = Set(Some(position));
        }
        if let Some(hire_date) = input.hire_date {
            active.hire_date = Set(Some(hire_date));
        }
        if let Some(flag) = input.is_hr_manager {
            active.is_hr_manager = Set(flag);
        }
        if let Some(flag) = input.is_admin {
            active.is_admin = Set(flag);
        }
        if let Some(flag) = input.is_active {
            active.is_active = Set(flag);
        }
        active.updated_at = Set(now());
        let user = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "user",
            user.id,
            "update",
            json!({ "isActive": user.is_active, "department": user.department }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(user.into())
    }

    async fn set_password(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        password: String,
    ) -> async_graphql::Result<bool> {
        let viewer = current_user(ctx)?;
        let user_id = parse_uuid(&user_id)?;
        ensure_self_or_management(&viewer, user_id)?;
        let db = database(ctx)?;
        let hash = hash_new_password(&password)?;

        let txn = db.begin().await.api()?;
        find_employee(&txn, user_id).await?;
        let existing = user_secret::Entity::find_by_id(user_id)
            .one(&txn)
            .await
            .api()?;
        match existing {
            Some(secret) => {
                let mut active = secret.into_active_model();
                active.password_hash = Set(hash);
                active.updated_at = Set(now());
                active.update(&txn).await.api()?;
            }
            None => {
                user_secret::ActiveModel {
                    user_id: Set(user_id),
                    password_hash: Set(hash),
                    updated_at: Set(now()),
                }
                .insert(&txn)
                .await
                .api()?;
            }
        }
        record_audit(&txn, Some(viewer.user_id), "user", user_id, "set_password", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(true)
    }

    async fn create_department(
        &self,
        ctx: &Context<'_>,
        input: CreateDepartmentInput,
    ) -> async_graphql::Result<DepartmentNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let name = required_text("name", &input.name)?;
        let code = input.code.map(|c| c.trim().to_string()).unwrap_or_default();
        let parent_id = parse_optional_uuid(input.parent_id.as_ref())?;
        let manager_id = parse_optional_uuid(input.manager_id.as_ref())?;

        let txn = db.begin().await.api()?;
        if !code.is_empty() {
            let taken = department::Entity::find()
                .filter(department::Column::Code.eq(code.clone()))
                .one(&txn)
                .await
                .api()?;
            if taken.is_some() {
                return Err(error_with_code("CONFLICT", "Department code already in use"));
            }
        }
        if let Some(parent_id) = parent_id {
            find_required::<department::Entity, _>(&txn, parent_id, "parent department").await?;
        }
        if let Some(manager_id) = manager_id {
            find_employee(&txn, manager_id).await?;
        }
        let at = now();
        let department = department::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            parent_id: Set(parent_id),
            manager_id: Set(manager_id),
            description: Set(input.description),
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
            "department",
            department.id,
            "create",
            json!({ "name": department.name, "code": department.code }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(department.into())
    }

    async fn upsert_employee_profile(
        &self,
        ctx: &Context<'_>,
        input: EmployeeProfileInput,
    ) -> async_graphql::Result<EmployeeProfileNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let user_id = parse_uuid(&input.user_id)?;

        let txn = db.begin().await.api()?;
        find_employee(&txn, user_id).await?;
        let existing = employee_profile::Entity::find()
            .filter(employee_profile::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .api()?;
        let is_new = existing.is_none();
        let mut active = match existing {
            Some(profile) => profile.into_active_model(),
            None => new_profile(user_id),
        };
        if let Some(resident_id) = input.resident_id {
            active.resident_id = Set(Some(resident_id));
        }
        if let Some(birth_date) = input.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(employee_type) = input.employee_type {
            active.employee_type = Set(employee_type.into());
        }
        if let Some(work_type) = input.work_type {
            active.work_type = Set(work_type.into());
        }
        active.updated_at = Set(now());
        let profile = if is_new {
            active.insert(&txn).await.api()?
        } else {
            active.update(&txn).await.api()?
        };
        record_audit(
            &txn,
            Some(viewer.user_id),
            "employee_profile",
            profile.id,
            if is_new { "create" } else { "update" },
            json!({ "userId": user_id }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(profile.into())
    }

    async fn resign_employee(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        date: NaiveDate,
        reason: Option<String>,
    ) -> async_graphql::Result<EmployeeProfileNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let user_id = parse_uuid(&user_id)?;

        let txn = db.begin().await.api()?;
        let profile = profile_for(&txn, user_id).await?;
        let mut active = profile.into_active_model();
        active.status = Set(employee_profile::EmploymentStatus::Resigned);
        active.resignation_date = Set(Some(date));
        active.resignation_reason = Set(reason);
        active.updated_at = Set(now());
        let profile = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "employee_profile",
            profile.id,
            "resign",
            json!({ "date": date }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(profile.into())
    }

    /// Move an employee to a new position and/or department, keeping the
    /// change in the profile history.
    async fn record_appointment(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        date: NaiveDate,
        position: Option<String>,
        department: Option<String>,
    ) -> async_graphql::Result<EmployeeProfileNode> {
        let viewer = require_management(ctx)?;
        if position.is_none() && department.is_none() {
            return Err(validation_error("position or department is required"));
        }
        let db = database(ctx)?;
        let user_id = parse_uuid(&user_id)?;

        let txn = db.begin().await.api()?;
        let user = find_employee(&txn, user_id).await?;
        let existing = employee_profile::Entity::find()
            .filter(employee_profile::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .api()?;
        let is_new = existing.is_none();
        let (position_history, department_history, mut active) = match existing {
            Some(profile) => (
                profile.position_history.clone(),
                profile.department_history.clone(),
                profile.into_active_model(),
            ),
            None => (json!([]), json!([]), new_profile(user_id)),
        };
        let mut user_active = user.into_active_model();
        if let Some(position) = position.as_deref() {
            active.position_history = Set(append_history(&position_history, date, "position", position));
            user_active.position = Set(Some(position.to_string()));
        }
        if let Some(department) = department.as_deref() {
            active.department_history = Set(append_history(
                &department_history,
                date,
                "department",
                department,
            ));
            user_active.department = Set(Some(department.to_string()));
        }
        active.updated_at = Set(now());
        user_active.updated_at = Set(now());
        let profile = if is_new {
            active.insert(&txn).await.api()?
        } else {
            active.update(&txn).await.api()?
        };
        user_active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "employee_profile",
            profile.id,
            "appointment",
            json!({ "date": date, "position": position, "department": department }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(profile.into())
    }
}

fn new_profile(user_id: Uuid) -> employee_profile::ActiveModel {
    let at = now();
    employee_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        resident_id: Set(None),
        birth_date: Set(None),
        address: Set(None),
        employee_type: Set(employee_profile::EmployeeType::Regular),
        work_type: Set(employee_profile::WorkType::FullTime),
        position_history: Set(json!([])),
        department_history: Set(json!([])),
        status: Set(employee_profile::EmploymentStatus::Active),
        resignation_date: Set(None),
        resignation_reason: Set(None),
        created_at: Set(at),
        updated_at: Set(at),
    }
}

async fn profile_for<C: sea_orm::ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> async_graphql::Result<employee_profile::Model> {
    employee_profile::Entity::find()
        .filter(employee_profile::Column::UserId.eq(user_id))
        .one(conn)
        .await
        .api()?
        .ok_or_else(|| super::not_found("employee profile"))
}

fn invalid_credentials() -> async_graphql::Error {
    error_with_code("UNAUTHENTICATED", "Invalid credentials")
}

fn hash_new_password(password: &str) -> async_graphql::Result<String> {
    if password.chars().count() < 8 {
        return Err(validation_error("Password must be at least 8 characters"));
    }
    hash_password(password).map_err(|_| error_with_code("INTERNAL", "Failed to hash password"))
}

fn normalize_email(value: &str) -> async_graphql::Result<String> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(validation_error("Invalid email address"));
    }
    Ok(trimmed)
}

pub(crate) fn required_text(field: &str, value: &str) -> async_graphql::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(validation_error(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
