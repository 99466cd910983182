mod common;

use chrono::{NaiveDate, Utc};
use common::{db_error_code, error_code, number, TestContext};
use entity::{attendance, leave_balance, leave_request};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use serde_json::{json, Value};

const RECORD: &str = r#"
    mutation Record($input: RecordAttendanceInput!) {
        hr { recordAttendance(input: $input) { id status workHours overtimeHours isLate isEarlyLeave } }
    }
"#;

const REQUEST_LEAVE: &str = r#"
    mutation Request($input: LeaveRequestInput!) {
        hr { requestLeave(input: $input) { id status daysRequested isPending } }
    }
"#;

const APPROVE: &str = r#"
    mutation Approve($id: ID!) { hr { approveLeave(id: $id) { status isApproved approverId } } }
"#;

const BALANCE: &str = r#"
    query Balance($employeeId: ID, $year: Int) {
        hr { leaveBalance(employeeId: $employeeId, year: $year) { totalDays usedDays remainingDays annualLeaveUsed } }
    }
"#;

async fn request_leave(ctx: &TestContext, input: Value) -> String {
    let data = ctx.ok_as(ctx.dev(), REQUEST_LEAVE, json!({ "input": input })).await;
    assert_eq!(data["requestLeave"]["status"], json!("PENDING"));
    data["requestLeave"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn recorded_attendance_derives_hours_and_lateness() {
    let ctx = TestContext::new().await;
    let vars = json!({ "input": {
        "employeeId": ctx.dev().id,
        "date": "2025-03-03",
        "checkInTime": "2025-03-03T00:30:00Z",
        "checkOutTime": "2025-03-03T09:00:00Z",
        "breakHours": "1"
    } });
    let data = ctx.ok_as(ctx.hr(), RECORD, vars).await;
    let row = &data["recordAttendance"];
    assert_eq!(row["status"], json!("LATE"));
    assert_eq!(number(&row["workHours"]), 7.5);
    assert_eq!(number(&row["overtimeHours"]), 0.0);
    assert_eq!(row["isLate"], json!(true));
    assert_eq!(row["isEarlyLeave"], json!(false));
}

#[tokio::test]
async fn long_days_accrue_overtime_and_upsert_the_row() {
    let ctx = TestContext::new().await;
    let first = json!({ "input": {
        "employeeId": ctx.dev().id,
        "date": "2025-03-04",
        "checkInTime": "2025-03-04T00:00:00Z",
        "checkOutTime": "2025-03-04T12:00:00Z",
        "breakHours": "1"
    } });
    let data = ctx.ok_as(ctx.hr(), RECORD, first).await;
    let id = data["recordAttendance"]["id"].clone();
    assert_eq!(data["recordAttendance"]["status"], json!("NORMAL"));
    assert_eq!(number(&data["recordAttendance"]["overtimeHours"]), 3.0);

    let second = json!({ "input": {
        "employeeId": ctx.dev().id,
        "date": "2025-03-04",
        "status": "REMOTE"
    } });
    let data = ctx.ok_as(ctx.hr(), RECORD, second).await;
    assert_eq!(data["recordAttendance"]["id"], id);
    assert_eq!(data["recordAttendance"]["status"], json!("REMOTE"));
    assert_eq!(data["recordAttendance"]["workHours"], Value::Null);

    let rows = attendance::Entity::find()
        .filter(attendance::Column::EmployeeId.eq(ctx.dev().id))
        .all(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn checking_in_twice_conflicts() {
    let ctx = TestContext::new().await;
    let mutation = r#"mutation { hr { checkIn { id checkInTime } } }"#;
    let data = ctx.ok_as(ctx.ops(), mutation, json!({})).await;
    assert!(data["checkIn"]["checkInTime"].is_string());
    let resp = ctx.exec_as(ctx.ops(), mutation, json!({})).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));

    let out = r#"mutation { hr { checkOut { checkOutTime workHours } } }"#;
    let data = ctx.ok_as(ctx.ops(), out, json!({})).await;
    assert!(data["checkOut"]["checkOutTime"].is_string());
    let resp = ctx.exec_as(ctx.ops(), out, json!({})).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn approving_leave_draws_the_balance() {
    let ctx = TestContext::new().await;
    let id = request_leave(
        &ctx,
        json!({ "leaveType": "ANNUAL", "startDate": "2025-03-03", "endDate": "2025-03-05", "reason": "trip" }),
    )
    .await;

    let resp = ctx.exec_as(ctx.dev(), APPROVE, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let data = ctx.ok_as(ctx.hr(), APPROVE, json!({ "id": id })).await;
    assert_eq!(data["approveLeave"]["status"], json!("APPROVED"));
    assert_eq!(data["approveLeave"]["approverId"], json!(ctx.hr().id.to_string()));

    let data = ctx.ok_as(ctx.dev(), BALANCE, json!({ "year": 2025 })).await;
    let balance = &data["leaveBalance"];
    assert_eq!(number(&balance["usedDays"]), 3.0);
    assert_eq!(number(&balance["annualLeaveUsed"]), 3.0);
    assert_eq!(
        number(&balance["remainingDays"]),
        number(&balance["totalDays"]) - 3.0
    );

    let resp = ctx.exec_as(ctx.hr(), APPROVE, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}

#[tokio::test]
async fn short_balances_leave_the_request_pending() {
    let ctx = TestContext::new().await;
    let id = request_leave(
        &ctx,
        json!({ "leaveType": "ANNUAL", "startDate": "2025-06-01", "endDate": "2025-07-10", "reason": "sabbatical" }),
    )
    .await;
    let resp = ctx.exec_as(ctx.hr(), APPROVE, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INSUFFICIENT_BALANCE"));

    let saved = leave_request::Entity::find_by_id(uuid::Uuid::parse_str(&id).unwrap())
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.status, leave_request::Status::Pending);
    let data = ctx.ok_as(ctx.dev(), BALANCE, json!({ "year": 2025 })).await;
    assert_eq!(data["leaveBalance"], Value::Null);
}

#[tokio::test]
async fn half_days_count_as_half() {
    let ctx = TestContext::new().await;
    let data = ctx
        .ok_as(
            ctx.dev(),
            REQUEST_LEAVE,
            json!({ "input": { "leaveType": "HALF_DAY", "startDate": "2025-04-01", "endDate": "2025-04-01", "reason": "dentist" } }),
        )
        .await;
    assert_eq!(number(&data["requestLeave"]["daysRequested"]), 0.5);

    let resp = ctx
        .exec_as(
            ctx.dev(),
            REQUEST_LEAVE,
            json!({ "input": { "leaveType": "HALF_DAY", "startDate": "2025-04-01", "endDate": "2025-04-02", "reason": "dentist" } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn cancelling_an_approved_leave_restores_days() {
    let ctx = TestContext::new().await;
    let id = request_leave(
        &ctx,
        json!({ "leaveType": "SICK", "startDate": "2025-05-05", "endDate": "2025-05-06", "reason": "flu" }),
    )
    .await;
    ctx.ok_as(ctx.hr(), APPROVE, json!({ "id": id })).await;

    let cancel = r#"mutation Cancel($id: ID!) { hr { cancelLeave(id: $id) { status } } }"#;
    let resp = ctx.exec_as(ctx.dev(), cancel, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let data = ctx.ok_as(ctx.hr(), cancel, json!({ "id": id })).await;
    assert_eq!(data["cancelLeave"]["status"], json!("CANCELLED"));
    let data = ctx
        .ok_as(ctx.hr(), BALANCE, json!({ "employeeId": ctx.dev().id, "year": 2025 }))
        .await;
    assert_eq!(number(&data["leaveBalance"]["usedDays"]), 0.0);
}

#[tokio::test]
async fn rejected_requests_keep_the_notes() {
    let ctx = TestContext::new().await;
    let unknown = ctx
        .exec_as(
            ctx.dev(),
            REQUEST_LEAVE,
            json!({ "input": { "leaveType": "PERSONAL", "startDate": "2025-08-01", "endDate": "2025-08-01" } }),
        )
        .await;
    assert!(!unknown.errors.is_empty(), "unknown leave types must not be accepted");

    let id = request_leave(
        &ctx,
        json!({ "leaveType": "OTHER", "startDate": "2025-08-01", "endDate": "2025-08-01", "reason": "errand" }),
    )
    .await;
    let reject = r#"
        mutation Reject($id: ID!, $notes: String!) {
            hr { rejectLeave(id: $id, notes: $notes) { status isRejected approvalNotes } }
        }
    "#;
    let data = ctx
        .ok_as(ctx.hr(), reject, json!({ "id": id, "notes": "release week" }))
        .await;
    assert_eq!(data["rejectLeave"]["isRejected"], json!(true));
    assert_eq!(data["rejectLeave"]["approvalNotes"], json!("release week"));
}

#[tokio::test]
async fn schedules_are_unique_per_day() {
    let ctx = TestContext::new().await;
    let mutation = r#"
        mutation Schedule($input: WorkScheduleInput!) {
            hr { createWorkSchedule(input: $input) { id scheduleType } }
        }
    "#;
    let input = json!({
        "employeeId": ctx.dev().id,
        "date": "2025-03-10",
        "startTime": "09:00:00",
        "endTime": "18:00:00",
        "breakStart": "12:00:00",
        "breakEnd": "13:00:00"
    });
    let data = ctx.ok_as(ctx.hr(), mutation, json!({ "input": input.clone() })).await;
    assert_eq!(data["createWorkSchedule"]["scheduleType"], json!("REGULAR"));
    let resp = ctx.exec_as(ctx.hr(), mutation, json!({ "input": input })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));

    let reversed = json!({ "input": {
        "employeeId": ctx.dev().id,
        "date": "2025-03-11",
        "startTime": "18:00:00",
        "endTime": "09:00:00"
    } });
    let resp = ctx.exec_as(ctx.hr(), mutation, reversed).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn one_attendance_row_per_employee_and_day() {
    let ctx = TestContext::new().await;
    let row = || {
        let now = Utc::now();
        attendance::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(ctx.dev().id),
            date: Set(NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()),
            overtime_hours: Set(Decimal::ZERO),
            break_hours: Set(Decimal::ONE),
            status: Set(attendance::Status::Normal),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
    };
    row().insert(ctx.db.as_ref()).await.unwrap();
    let duplicate = row().insert(ctx.db.as_ref()).await;
    assert_eq!(db_error_code(duplicate).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn one_leave_balance_per_employee_and_year() {
    let ctx = TestContext::new().await;
    let row = || {
        let now = Utc::now();
        leave_balance::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(ctx.ops().id),
            year: Set(2031),
            total_days: Set(Decimal::from(15)),
            used_days: Set(Decimal::ZERO),
            remaining_days: Set(Decimal::from(15)),
            annual_leave_used: Set(Decimal::ZERO),
            sick_leave_used: Set(Decimal::ZERO),
            other_leave_used: Set(Decimal::ZERO),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    };
    row().insert(ctx.db.as_ref()).await.unwrap();
    let duplicate = row().insert(ctx.db.as_ref()).await;
    assert_eq!(db_error_code(duplicate).as_deref(), Some("CONFLICT"));
}
