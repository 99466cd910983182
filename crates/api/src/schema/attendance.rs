use async_graphql::{ComplexObject, Context, InputObject, Object, SimpleObject, ID};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use entity::workflow::Workflow;
use entity::{attendance, leave_balance, leave_request, user, work_schedule};
use platform_api::ResultExt;
use products_hr::attendance::work_hours;
use products_hr::leave::{annual_entitlement, requested_days};
use products_hr::{LeaveLedger, WorkPolicy};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::json;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::enums::{AttendanceStatus, LeaveStatus, LeaveType, ScheduleType};
use super::people::required_text;
use super::{
    current_user, database, ensure_self_or_management, error_with_code, find_employee,
    find_required, now, parse_uuid, record_audit, require_management, subject_employee, to_id,
    today, utc, validation_error, work_policy,
};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Attendance", complex)]
pub struct AttendanceNode {
    pub id: ID,
    pub employee_id: ID,
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_in_ip: Option<String>,
    pub check_in_location: Option<String>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_out_ip: Option<String>,
    pub check_out_location: Option<String>,
    pub work_hours: Option<Decimal>,
    pub overtime_hours: Decimal,
    pub break_hours: Decimal,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    #[graphql(skip)]
    model: attendance::Model,
}

impl From<attendance::Model> for AttendanceNode {
    fn from(model: attendance::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            date: model.date,
            check_in_time: model.check_in_time.map(utc),
            check_in_ip: model.check_in_ip.clone(),
            check_in_location: model.check_in_location.clone(),
            check_out_time: model.check_out_time.map(utc),
            check_out_ip: model.check_out_ip.clone(),
            check_out_location: model.check_out_location.clone(),
            work_hours: model.work_hours,
            overtime_hours: model.overtime_hours,
            break_hours: model.break_hours,
            status: model.status.into(),
            notes: model.notes.clone(),
            model,
        }
    }
}

#[ComplexObject]
impl AttendanceNode {
    async fn is_late(&self, ctx: &Context<'_>) -> bool {
        self.model.is_late(&work_policy(ctx))
    }

    async fn is_early_leave(&self, ctx: &Context<'_>) -> bool {
        self.model.is_early_leave(&work_policy(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "LeaveRequest")]
pub struct LeaveRequestNode {
    pub id: ID,
    pub employee_id: ID,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: Decimal,
    pub reason: String,
    pub emergency_contact: Option<String>,
    pub status: LeaveStatus,
    pub approver_id: Option<ID>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub attachment: Option<String>,
    pub is_approved: bool,
    pub is_pending: bool,
    pub is_rejected: bool,
    pub created_at: DateTime<Utc>,
}

impl From<leave_request::Model> for LeaveRequestNode {
    fn from(model: leave_request::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            leave_type: model.leave_type.into(),
            start_date: model.start_date,
            end_date: model.end_date,
            days_requested: model.days_requested,
            is_approved: model.is_approved(),
            is_pending: model.is_pending(),
            is_rejected: model.is_rejected(),
            reason: model.reason,
            emergency_contact: model.emergency_contact,
            status: model.status.into(),
            approver_id: model.approver_id.map(to_id),
            approved_at: model.approved_at.map(utc),
            approval_notes: model.approval_notes,
            attachment: model.attachment,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "LeaveBalance")]
pub struct LeaveBalanceNode {
    pub id: ID,
    pub employee_id: ID,
    pub year: i32,
    pub total_days: Decimal,
    pub used_days: Decimal,
    pub remaining_days: Decimal,
    pub available_days: Decimal,
    pub annual_leave_used: Decimal,
    pub sick_leave_used: Decimal,
    pub other_leave_used: Decimal,
}

impl From<leave_balance::Model> for LeaveBalanceNode {
    fn from(model: leave_balance::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            year: model.year,
            available_days: model.available_days(),
            total_days: model.total_days,
            used_days: model.used_days,
            remaining_days: model.remaining_days,
            annual_leave_used: model.annual_leave_used,
            sick_leave_used: model.sick_leave_used,
            other_leave_used: model.other_leave_used,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "WorkSchedule")]
pub struct WorkScheduleNode {
    pub id: ID,
    pub employee_id: ID,
    pub date: NaiveDate,
    pub schedule_type: ScheduleType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub is_flexible: bool,
    pub notes: Option<String>,
}

impl From<work_schedule::Model> for WorkScheduleNode {
    fn from(model: work_schedule::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            date: model.date,
            schedule_type: model.schedule_type.into(),
            start_time: model.start_time,
            end_time: model.end_time,
            break_start: model.break_start,
            break_end: model.break_end,
            is_flexible: model.is_flexible,
            notes: model.notes,
        }
    }
}

#[derive(InputObject, Clone)]
pub struct RecordAttendanceInput {
    pub employee_id: ID,
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub break_hours: Option<Decimal>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct LeaveRequestInput {
    pub employee_id: Option<ID>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Defaults to the inclusive day count (0.5 for a half day).
    pub days_requested: Option<Decimal>,
    pub reason: String,
    pub emergency_contact: Option<String>,
    pub attachment: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct WorkScheduleInput {
    pub employee_id: ID,
    pub date: NaiveDate,
    pub schedule_type: Option<ScheduleType>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub is_flexible: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Default)]
pub struct AttendanceQuery;

#[Object]
impl AttendanceQuery {
    async fn attendance_records(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> async_graphql::Result<Vec<AttendanceNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let span = info_span!("hr.attendance.list", employee_id = %employee_id);
        async move {
            let mut query =
                attendance::Entity::find().filter(attendance::Column::EmployeeId.eq(employee_id));
            if let Some(from) = from {
                query = query.filter(attendance::Column::Date.gte(from));
            }
            if let Some(to) = to {
                query = query.filter(attendance::Column::Date.lte(to));
            }
            let rows = query
                .order_by_desc(attendance::Column::Date)
                .all(db.as_ref())
                .await
                .api()?;
            Ok(rows.into_iter().map(AttendanceNode::from).collect())
        }
        .instrument(span)
        .await
    }

    async fn today_attendance(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Option<AttendanceNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let row = attendance_on(db.as_ref(), viewer.user_id, today(ctx)).await?;
        Ok(row.map(AttendanceNode::from))
    }

    /// Management sees every request unless filtered; employees see their own.
    async fn leave_requests(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        status: Option<LeaveStatus>,
    ) -> async_graphql::Result<Vec<LeaveRequestNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = leave_request::Entity::find();
        match employee_id {
            Some(id) => {
                let id = parse_uuid(&id)?;
                ensure_self_or_management(&viewer, id)?;
                query = query.filter(leave_request::Column::EmployeeId.eq(id));
            }
            None if viewer.is_management() => {}
            None => query = query.filter(leave_request::Column::EmployeeId.eq(viewer.user_id)),
        }
        if let Some(status) = status {
            query = query.filter(leave_request::Column::Status.eq(leave_request::Status::from(status)));
        }
        let rows = query
            .order_by_desc(leave_request::Column::StartDate)
            .order_by_desc(leave_request::Column::CreatedAt)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(LeaveRequestNode::from).collect())
    }

    async fn leave_request(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let request =
            find_required::<leave_request::Entity, _>(db.as_ref(), parse_uuid(&id)?, "leave request")
                .await?;
        ensure_self_or_management(&viewer, request.employee_id)?;
        Ok(request.into())
    }

    async fn leave_balance(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        year: Option<i32>,
    ) -> async_graphql::Result<Option<LeaveBalanceNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let year = year.unwrap_or_else(|| today(ctx).year());
        let db = database(ctx)?;
        let balance = balance_for(db.as_ref(), employee_id, year).await?;
        Ok(balance.map(LeaveBalanceNode::from))
    }

    async fn work_schedules(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> async_graphql::Result<Vec<WorkScheduleNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let mut query = work_schedule::Entity::find()
            .filter(work_schedule::Column::EmployeeId.eq(employee_id));
        if let Some(from) = from {
            query = query.filter(work_schedule::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(work_schedule::Column::Date.lte(to));
        }
        let rows = query
            .order_by_asc(work_schedule::Column::Date)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(WorkScheduleNode::from).collect())
    }
}

#[derive(Default)]
pub struct AttendanceMutation;

#[Object]
impl AttendanceMutation {
    async fn check_in(
        &self,
        ctx: &Context<'_>,
        ip: Option<String>,
        location: Option<String>,
    ) -> async_graphql::Result<AttendanceNode> {
        let viewer = current_user(ctx)?;
        let policy = work_policy(ctx);
        let db = database(ctx)?;
        let at = now();
        let date = policy.local_date(&at);

        let txn = db.begin().await.api()?;
        find_employee(&txn, viewer.user_id).await?;
        if attendance_on(&txn, viewer.user_id, date).await?.is_some() {
            return Err(error_with_code("CONFLICT", "Already checked in today"));
        }
        let status = if policy.is_late_arrival(&at) {
            attendance::Status::Late
        } else {
            attendance::Status::Normal
        };
        let row = attendance::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(viewer.user_id),
            date: Set(date),
            check_in_time: Set(Some(at)),
            check_in_ip: Set(ip),
            check_in_location: Set(location),
            check_out_time: Set(None),
            check_out_ip: Set(None),
            check_out_location: Set(None),
            work_hours: Set(None),
            overtime_hours: Set(Decimal::ZERO),
            break_hours: Set(Decimal::ZERO),
            status: Set(status),
            notes: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "attendance",
            row.id,
            "check_in",
            json!({ "date": date, "status": status_name(row.status) }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        info!(employee_id = %viewer.user_id, %date, "checked in");
        Ok(row.into())
    }

    async fn check_out(
        &self,
        ctx: &Context<'_>,
        ip: Option<String>,
        location: Option<String>,
        break_hours: Option<Decimal>,
    ) -> async_graphql::Result<AttendanceNode> {
        let viewer = current_user(ctx)?;
        let policy = work_policy(ctx);
        let db = database(ctx)?;
        let at = now();
        let date = policy.local_date(&at);
        if break_hours.map_or(false, |h| h.is_sign_negative()) {
            return Err(validation_error("breakHours cannot be negative"));
        }

        let txn = db.begin().await.api()?;
        let row = attendance_on(&txn, viewer.user_id, date)
            .await?
            .ok_or_else(|| error_with_code("NOT_FOUND", "No check-in recorded today"))?;
        if row.check_out_time.is_some() {
            return Err(error_with_code("CONFLICT", "Already checked out today"));
        }
        let break_hours = break_hours.unwrap_or(row.break_hours);
        let hours = work_hours(row.check_in_time.as_ref(), Some(&at), break_hours);
        let status = if row.status == attendance::Status::Normal && policy.is_early_departure(&at) {
            attendance::Status::EarlyLeave
        } else {
            row.status
        };
        let mut active = row.into_active_model();
        active.check_out_time = Set(Some(at));
        active.check_out_ip = Set(ip);
        active.check_out_location = Set(location);
        active.break_hours = Set(break_hours);
        active.work_hours = Set(Some(hours));
        active.overtime_hours = Set(policy.overtime(hours));
        active.status = Set(status);
        active.updated_at = Set(at);
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "attendance",
            row.id,
            "check_out",
            json!({ "workHours": hours.to_string(), "status": status_name(row.status) }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Create or overwrite an employee's row for a date.
    async fn record_attendance(
        &self,
        ctx: &Context<'_>,
        input: RecordAttendanceInput,
    ) -> async_graphql::Result<AttendanceNode> {
        let viewer = require_management(ctx)?;
        let policy = work_policy(ctx);
        let employee_id = parse_uuid(&input.employee_id)?;
        let break_hours = input.break_hours.unwrap_or(Decimal::ZERO);
        if break_hours.is_sign_negative() {
            return Err(validation_error("breakHours cannot be negative"));
        }
        if let (Some(check_in), Some(check_out)) = (input.check_in_time, input.check_out_time) {
            if check_out < check_in {
                return Err(validation_error("checkOutTime is before checkInTime"));
            }
        }
        let check_in = input.check_in_time.map(|t| t.fixed_offset());
        let check_out = input.check_out_time.map(|t| t.fixed_offset());
        let hours = match (check_in.as_ref(), check_out.as_ref()) {
            (Some(_), Some(_)) => Some(work_hours(check_in.as_ref(), check_out.as_ref(), break_hours)),
            _ => None,
        };
        let status = input
            .status
            .map(attendance::Status::from)
            .unwrap_or_else(|| derived_status(&policy, check_in.as_ref(), check_out.as_ref()));

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let existing = attendance_on(&txn, employee_id, input.date).await?;
        let at = now();
        let is_new = existing.is_none();
        let mut active = match existing {
            Some(row) => row.into_active_model(),
            None => attendance::ActiveModel {
                id: Set(Uuid::new_v4()),
                employee_id: Set(employee_id),
                date: Set(input.date),
                check_in_ip: Set(None),
                check_in_location: Set(None),
                check_out_ip: Set(None),
                check_out_location: Set(None),
                created_at: Set(at),
                ..Default::default()
            },
        };
        active.check_in_time = Set(check_in);
        active.check_out_time = Set(check_out);
        active.break_hours = Set(break_hours);
        active.work_hours = Set(hours);
        active.overtime_hours = Set(hours.map(|h| policy.overtime(h)).unwrap_or(Decimal::ZERO));
        active.status = Set(status);
        active.notes = Set(input.notes);
        active.updated_at = Set(at);
        let row = if is_new {
            active.insert(&txn).await.api()?
        } else {
            active.update(&txn).await.api()?
        };
        record_audit(
            &txn,
            Some(viewer.user_id),
            "attendance",
            row.id,
            if is_new { "create" } else { "update" },
            json!({ "employeeId": employee_id, "date": input.date, "status": status_name(row.status) }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn request_leave(
        &self,
        ctx: &Context<'_>,
        input: LeaveRequestInput,
    ) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let leave_type = leave_request::LeaveType::from(input.leave_type);
        let half_day = leave_type == leave_request::LeaveType::HalfDay;
        let counted = requested_days(input.start_date, input.end_date, half_day).api()?;
        let days = match input.days_requested {
            Some(days) if !half_day => {
                if days <= Decimal::ZERO || days > counted {
                    return Err(validation_error(format!(
                        "daysRequested must be between 0 and {}",
                        counted
                    )));
                }
                days
            }
            _ => counted,
        };
        let reason = required_text("reason", &input.reason)?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let request = leave_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            leave_type: Set(leave_type),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            days_requested: Set(days),
            reason: Set(reason),
            emergency_contact: Set(input.emergency_contact),
            status: Set(leave_request::Status::Pending),
            approver_id: Set(None),
            approved_at: Set(None),
            approval_notes: Set(None),
            attachment: Set(input.attachment),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "leave_request",
            request.id,
            "create",
            json!({ "days": days.to_string(), "startDate": input.start_date }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(request.into())
    }

    /// Approve a pending request and draw the days from the employee's
    /// balance for the year the leave starts in.
    async fn approve_leave(
        &self,
        ctx: &Context<'_>,
        id: ID,
        notes: Option<String>,
    ) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let id = parse_uuid(&id)?;
        let today = today(ctx);
        let span = info_span!("hr.leave.approve", leave_request_id = %id, approver = %viewer.user_id);
        async move {
            let txn = db.begin().await.api()?;
            let request = find_required::<leave_request::Entity, _>(&txn, id, "leave request").await?;
            let status = request.status.advance(leave_request::Status::Approved).api()?;

            let employee = find_employee(&txn, request.employee_id).await?;
            let year = request.start_date.year();
            let (balance, is_new) = match balance_for(&txn, employee.id, year).await? {
                Some(balance) => (balance, false),
                None => (opening_balance(&employee, year, today), true),
            };
            let mut ledger = balance.ledger();
            ledger
                .use_leave(request.days_requested, request.leave_type.bucket())
                .api()?;
            save_ledger(&txn, balance, is_new, &ledger).await?;

            let at = now();
            let mut active = request.into_active_model();
            active.status = Set(status);
            active.approver_id = Set(Some(viewer.user_id));
            active.approved_at = Set(Some(at));
            active.approval_notes = Set(notes);
            active.updated_at = Set(at);
            let request = active.update(&txn).await.api()?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "leave_request",
                request.id,
                "approve",
                json!({
                    "days": request.days_requested.to_string(),
                    "remaining": ledger.remaining_days.to_string(),
                }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            info!(remaining = %ledger.remaining_days, "leave approved");
            Ok(request.into())
        }
        .instrument(span)
        .await
    }

    async fn reject_leave(
        &self,
        ctx: &Context<'_>,
        id: ID,
        notes: String,
    ) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let id = parse_uuid(&id)?;
        let span = info_span!("hr.leave.reject", leave_request_id = %id, approver = %viewer.user_id);
        async move {
            let txn = db.begin().await.api()?;
            let request = find_required::<leave_request::Entity, _>(&txn, id, "leave request").await?;
            let status = request.status.advance(leave_request::Status::Rejected).api()?;
            let at = now();
            let mut active = request.into_active_model();
            active.status = Set(status);
            active.approver_id = Set(Some(viewer.user_id));
            active.approved_at = Set(Some(at));
            active.approval_notes = Set(Some(notes));
            active.updated_at = Set(at);
            let request = active.update(&txn).await.api()?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "leave_request",
                request.id,
                "reject",
                json!({ "notes": request.approval_notes }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            Ok(request.into())
        }
        .instrument(span)
        .await
    }

    /// Owners may withdraw pending requests. Management may also cancel
    /// approved ones, which returns the days to the balance.
    async fn cancel_leave(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let id = parse_uuid(&id)?;
        let span = info_span!("hr.leave.cancel", leave_request_id = %id, actor = %viewer.user_id);
        async move {
            let txn = db.begin().await.api()?;
            let request = find_required::<leave_request::Entity, _>(&txn, id, "leave request").await?;
            ensure_self_or_management(&viewer, request.employee_id)?;
            let was_approved = request.is_approved();
            if was_approved && !viewer.is_management() {
                return Err(error_with_code(
                    "FORBIDDEN",
                    "Only management can cancel an approved request",
                ));
            }
            let status = request.status.advance(leave_request::Status::Cancelled).api()?;

            if was_approved {
                if let Some(balance) =
                    balance_for(&txn, request.employee_id, request.start_date.year()).await?
                {
                    let mut ledger = balance.ledger();
                    ledger.restore(request.days_requested, request.leave_type.bucket());
                    save_ledger(&txn, balance, false, &ledger).await?;
                }
            }

            let mut active = request.into_active_model();
            active.status = Set(status);
            active.updated_at = Set(now());
            let request = active.update(&txn).await.api()?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "leave_request",
                request.id,
                "cancel",
                json!({ "restored": was_approved }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            Ok(request.into())
        }
        .instrument(span)
        .await
    }

    /// Reset the entitlement from tenure and derive the remaining days.
    async fn recalculate_leave_balance(
        &self,
        ctx: &Context<'_>,
        employee_id: ID,
        year: i32,
    ) -> async_graphql::Result<LeaveBalanceNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let employee_id = parse_uuid(&employee_id)?;
        let today = today(ctx);

        let txn = db.begin().await.api()?;
        let employee = find_employee(&txn, employee_id).await?;
        let (balance, is_new) = match balance_for(&txn, employee_id, year).await? {
            Some(balance) => (balance, false),
            None => (opening_balance(&employee, year, today), true),
        };
        let mut ledger = balance.ledger();
        ledger.recalculate(annual_entitlement(employee.tenure_years(today)));
        let balance = save_ledger(&txn, balance, is_new, &ledger).await?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "leave_balance",
            balance.id,
            "recalculate",
            json!({ "year": year, "totalDays": ledger.total_days.to_string() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(balance.into())
    }

    async fn create_work_schedule(
        &self,
        ctx: &Context<'_>,
        input: WorkScheduleInput,
    ) -> async_graphql::Result<WorkScheduleNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        let schedule_type = input
            .schedule_type
            .map(work_schedule::ScheduleType::from)
            .unwrap_or(work_schedule::ScheduleType::Regular);
        if schedule_type != work_schedule::ScheduleType::Night && input.end_time <= input.start_time {
            return Err(validation_error("endTime must be after startTime"));
        }
        match (input.break_start, input.break_end) {
            (Some(start), Some(end)) if end <= start => {
                return Err(validation_error("breakEnd must be after breakStart"));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(validation_error("breakStart and breakEnd go together"));
            }
            _ => {}
        }

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let taken = work_schedule::Entity::find()
            .filter(work_schedule::Column::EmployeeId.eq(employee_id))
            .filter(work_schedule::Column::Date.eq(input.date))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "A schedule already exists for this date"));
        }
        let at = now();
        let schedule = work_schedule::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            date: Set(input.date),
            schedule_type: Set(schedule_type),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            break_start: Set(input.break_start),
            break_end: Set(input.break_end),
            is_flexible: Set(input.is_flexible.unwrap_or(false)),
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
            "work_schedule",
            schedule.id,
            "create",
            json!({ "employeeId": employee_id, "date": input.date }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(schedule.into())
    }
}

async fn attendance_on<C: ConnectionTrait>(
    conn: &C,
    employee_id: Uuid,
    date: NaiveDate,
) -> async_graphql::Result<Option<attendance::Model>> {
    attendance::Entity::find()
        .filter(attendance::Column::EmployeeId.eq(employee_id))
        .filter(attendance::Column::Date.eq(date))
        .one(conn)
        .await
        .api()
}

pub(crate) async fn balance_for<C: ConnectionTrait>(
    conn: &C,
    employee_id: Uuid,
    year: i32,
) -> async_graphql::Result<Option<leave_balance::Model>> {
    leave_balance::Entity::find()
        .filter(leave_balance::Column::EmployeeId.eq(employee_id))
        .filter(leave_balance::Column::Year.eq(year))
        .one(conn)
        .await
        .api()
}

/// Unsaved balance for a year that has none yet, granted by tenure.
fn opening_balance(employee: &user::Model, year: i32, today: NaiveDate) -> leave_balance::Model {
    let ledger = LeaveLedger::new(annual_entitlement(employee.tenure_years(today)));
    let at = now();
    leave_balance::Model {
        id: Uuid::new_v4(),
        employee_id: employee.id,
        year,
        total_days: ledger.total_days,
        used_days: ledger.used_days,
        remaining_days: ledger.remaining_days,
        annual_leave_used: ledger.annual_leave_used,
        sick_leave_used: ledger.sick_leave_used,
        other_leave_used: ledger.other_leave_used,
        created_at: at,
        updated_at: at,
    }
}

async fn save_ledger<C: ConnectionTrait>(
    conn: &C,
    balance: leave_balance::Model,
    is_new: bool,
    ledger: &LeaveLedger,
) -> async_graphql::Result<leave_balance::Model> {
    let mut active = balance.into_active_model();
    active.apply_ledger(ledger);
    active.updated_at = Set(now());
    if is_new {
        active.insert(conn).await.api()
    } else {
        active.update(conn).await.api()
    }
}

fn derived_status(
    policy: &WorkPolicy,
    check_in: Option<&chrono::DateTime<chrono::FixedOffset>>,
    check_out: Option<&chrono::DateTime<chrono::FixedOffset>>,
) -> attendance::Status {
    match (check_in, check_out) {
        (None, _) => attendance::Status::Absent,
        (Some(at), _) if policy.is_late_arrival(at) => attendance::Status::Late,
        (_, Some(at)) if policy.is_early_departure(at) => attendance::Status::EarlyLeave,
        _ => attendance::Status::Normal,
    }
}

fn status_name(status: attendance::Status) -> String {
    use sea_orm::ActiveEnum;
    status.to_value()
}
