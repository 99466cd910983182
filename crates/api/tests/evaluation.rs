mod common;

use chrono::{Duration, Utc};
use common::{error_code, number, TestContext};
use serde_json::{json, Value};

async fn period(ctx: &TestContext, open: bool) -> Value {
    let today = Utc::now().date_naive();
    let (start, end) = if open {
        (today - Duration::days(30), today + Duration::days(30))
    } else {
        (today - Duration::days(90), today - Duration::days(60))
    };
    let mutation = r#"
        mutation Period($input: EvaluationPeriodInput!) {
            hr { createEvaluationPeriod(input: $input) { id isEvaluationOpen } }
        }
    "#;
    let name = if open { "Current review" } else { "Past review" };
    let data = ctx
        .ok_as(
            ctx.hr(),
            mutation,
            json!({ "input": {
                "year": 2025, "periodType": "ANNUAL", "name": name,
                "startDate": "2025-01-01", "endDate": "2025-12-31",
                "evaluationStart": start, "evaluationEnd": end
            } }),
        )
        .await;
    assert_eq!(data["createEvaluationPeriod"]["isEvaluationOpen"], json!(open));
    data["createEvaluationPeriod"]["id"].clone()
}

async fn template(ctx: &TestContext) -> Value {
    let mutation = r#"
        mutation Template($input: EvaluationTemplateInput!) {
            hr { createEvaluationTemplate(input: $input) { id maxScore minScore } }
        }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            mutation,
            json!({ "input": {
                "name": "Engineering",
                "items": [
                    { "id": 1, "name": "Delivery", "weight": 60 },
                    { "id": 2, "name": "Teamwork", "weight": 40 }
                ]
            } }),
        )
        .await;
    assert_eq!(number(&data["createEvaluationTemplate"]["maxScore"]), 5.0);
    data["createEvaluationTemplate"]["id"].clone()
}

async fn evaluation(ctx: &TestContext, period_id: Value, template_id: Value) -> Value {
    let mutation = r#"
        mutation Create($input: CreateEvaluationInput!) {
            hr { createEvaluation(input: $input) { id status evaluatorId } }
        }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            mutation,
            json!({ "input": { "employeeId": ctx.dev().id, "periodId": period_id, "templateId": template_id } }),
        )
        .await;
    assert_eq!(data["createEvaluation"]["status"], json!("DRAFT"));
    assert_eq!(data["createEvaluation"]["evaluatorId"], json!(ctx.hr().id.to_string()));
    data["createEvaluation"]["id"].clone()
}

const SCORE: &str = r#"
    mutation Score($input: EvaluationScoresInput!) {
        hr { updateEvaluationScores(input: $input) { scores strengths } }
    }
"#;

const SUBMIT: &str = r#"
    mutation Submit($id: ID!) { hr { submitEvaluation(id: $id) { status overallScore grade } } }
"#;

#[tokio::test]
async fn submission_fixes_score_and_grade() {
    let ctx = TestContext::new().await;
    let period_id = period(&ctx, true).await;
    let template_id = template(&ctx).await;
    let id = evaluation(&ctx, period_id, template_id).await;

    let scores = json!({ "input": { "id": id, "scores": { "1": 5, "2": 3 }, "strengths": "Ships" } });
    let resp = ctx.exec_as(ctx.dev(), SCORE, scores.clone()).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.hr(), SCORE, scores).await;
    assert_eq!(data["updateEvaluationScores"]["strengths"], json!("Ships"));

    let data = ctx.ok_as(ctx.hr(), SUBMIT, json!({ "id": id })).await;
    let submitted = &data["submitEvaluation"];
    assert_eq!(submitted["status"], json!("SUBMITTED"));
    assert_eq!(number(&submitted["overallScore"]), 4.2);
    assert_eq!(submitted["grade"], json!("A"));

    let resp = ctx
        .exec_as(ctx.hr(), SCORE, json!({ "input": { "id": id, "scores": { "1": 1 } } }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}

#[tokio::test]
async fn scores_must_fit_the_template_range() {
    let ctx = TestContext::new().await;
    let period_id = period(&ctx, true).await;
    let template_id = template(&ctx).await;
    let id = evaluation(&ctx, period_id, template_id).await;
    let resp = ctx
        .exec_as(ctx.hr(), SCORE, json!({ "input": { "id": id, "scores": { "1": 6 } } }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn closed_windows_reject_submission() {
    let ctx = TestContext::new().await;
    let period_id = period(&ctx, false).await;
    let template_id = template(&ctx).await;
    let id = evaluation(&ctx, period_id, template_id).await;
    ctx.ok_as(ctx.hr(), SCORE, json!({ "input": { "id": id, "scores": { "1": 4 } } }))
        .await;
    let resp = ctx.exec_as(ctx.hr(), SUBMIT, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn reviews_move_forward_only() {
    let ctx = TestContext::new().await;
    let period_id = period(&ctx, true).await;
    let template_id = template(&ctx).await;
    let id = evaluation(&ctx, period_id.clone(), template_id.clone()).await;

    let confirm = r#"mutation Confirm($id: ID!) { hr { confirmEvaluation(id: $id) { status confirmedAt } } }"#;
    let resp = ctx.exec_as(ctx.hr(), confirm, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    ctx.ok_as(ctx.hr(), SCORE, json!({ "input": { "id": id, "scores": { "1": 3, "2": 3 } } }))
        .await;
    ctx.ok_as(ctx.hr(), SUBMIT, json!({ "id": id })).await;
    let review = r#"mutation Review($id: ID!) { hr { reviewEvaluation(id: $id) { status reviewedAt } } }"#;
    let data = ctx.ok_as(ctx.admin(), review, json!({ "id": id })).await;
    assert!(data["reviewEvaluation"]["reviewedAt"].is_string());
    let data = ctx.ok_as(ctx.admin(), confirm, json!({ "id": id })).await;
    assert_eq!(data["confirmEvaluation"]["status"], json!("CONFIRMED"));

    let mine = r#"{ hr { evaluations { id grade } } }"#;
    let data = ctx.ok_as(ctx.dev(), mine, json!({})).await;
    assert_eq!(data["evaluations"].as_array().unwrap().len(), 1);
    assert_eq!(data["evaluations"][0]["grade"], json!("B"));
    let data = ctx.ok_as(ctx.ops(), mine, json!({})).await;
    assert!(data["evaluations"].as_array().unwrap().is_empty());

    let duplicate = r#"
        mutation Create($input: CreateEvaluationInput!) { hr { createEvaluation(input: $input) { id } } }
    "#;
    let resp = ctx
        .exec_as(
            ctx.hr(),
            duplicate,
            json!({ "input": { "employeeId": ctx.dev().id, "periodId": period_id, "templateId": template_id } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn goals_lock_once_completed() {
    let ctx = TestContext::new().await;
    let create = r#"
        mutation Goal($input: GoalInput!) { hr { createGoal(input: $input) { id status priority progress } } }
    "#;
    let data = ctx
        .ok_as(
            ctx.dev(),
            create,
            json!({ "input": {
                "title": "Cut p99 latency", "goalType": "WORK",
                "startDate": "2025-01-01", "targetDate": "2025-06-30"
            } }),
        )
        .await;
    let id = data["createGoal"]["id"].clone();
    assert_eq!(data["createGoal"]["status"], json!("IN_PROGRESS"));
    assert_eq!(data["createGoal"]["priority"], json!("MEDIUM"));

    let progress = r#"
        mutation Progress($id: ID!, $progress: Int!) { hr { updateGoalProgress(id: $id, progress: $progress) { progress } } }
    "#;
    let resp = ctx
        .exec_as(ctx.dev(), progress, json!({ "id": id, "progress": 150 }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
    let resp = ctx
        .exec_as(ctx.ops(), progress, json!({ "id": id, "progress": 50 }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx
        .ok_as(ctx.dev(), progress, json!({ "id": id, "progress": 50 }))
        .await;
    assert_eq!(data["updateGoalProgress"]["progress"], json!(50));

    let complete = r#"
        mutation Complete($id: ID!) { hr { completeGoal(id: $id, achievement: EXCEEDED) { status progress achievement completedDate } } }
    "#;
    let data = ctx.ok_as(ctx.dev(), complete, json!({ "id": id })).await;
    let goal = &data["completeGoal"];
    assert_eq!(goal["status"], json!("COMPLETED"));
    assert_eq!(goal["progress"], json!(100));
    assert_eq!(goal["achievement"], json!("EXCEEDED"));
    assert!(goal["completedDate"].is_string());

    let resp = ctx
        .exec_as(ctx.dev(), progress, json!({ "id": id, "progress": 10 }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let reversed = json!({ "input": {
        "title": "Backwards", "goalType": "PERSONAL",
        "startDate": "2025-06-30", "targetDate": "2025-01-01"
    } });
    let resp = ctx.exec_as(ctx.dev(), create, reversed).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn anonymous_feedback_hides_the_sender() {
    let ctx = TestContext::new().await;
    let send = r#"
        mutation Send($input: FeedbackInput!) { hr { sendFeedback(input: $input) { id senderId } } }
    "#;
    let data = ctx
        .ok_as(
            ctx.ops(),
            send,
            json!({ "input": {
                "recipientId": ctx.dev().id, "feedbackType": "PRAISE",
                "title": "Thanks", "content": "Great incident write-up", "isAnonymous": true
            } }),
        )
        .await;
    let id = data["sendFeedback"]["id"].clone();
    assert_eq!(data["sendFeedback"]["senderId"], json!(ctx.ops().id.to_string()));

    let inbox = r#"{ hr { feedbackReceived(unreadOnly: true) { id senderId isRead } } }"#;
    let data = ctx.ok_as(ctx.dev(), inbox, json!({})).await;
    assert_eq!(data["feedbackReceived"][0]["senderId"], Value::Null);

    let read = r#"mutation Read($id: ID!) { hr { markFeedbackRead(id: $id) { isRead readAt } } }"#;
    let resp = ctx.exec_as(ctx.ops(), read, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.dev(), read, json!({ "id": id })).await;
    assert_eq!(data["markFeedbackRead"]["isRead"], json!(true));
    let data = ctx.ok_as(ctx.dev(), inbox, json!({})).await;
    assert!(data["feedbackReceived"].as_array().unwrap().is_empty());

    let to_self = json!({ "input": {
        "recipientId": ctx.dev().id, "feedbackType": "OTHER", "title": "Me", "content": "Me"
    } });
    let resp = ctx.exec_as(ctx.dev(), send, to_self).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn employees_add_feedback_but_not_manager_notes() {
    let ctx = TestContext::new().await;
    let schedule = r#"
        mutation Schedule($input: ScheduleMeetingInput!) {
            hr { scheduleOneOnOne(input: $input) { id managerId status durationMinutes } }
        }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            schedule,
            json!({ "input": { "employeeId": ctx.dev().id, "meetingType": "CAREER", "scheduledAt": "2025-04-01T01:00:00Z" } }),
        )
        .await;
    let meeting = &data["scheduleOneOnOne"];
    let id = meeting["id"].clone();
    assert_eq!(meeting["managerId"], json!(ctx.hr().id.to_string()));
    assert_eq!(meeting["durationMinutes"], json!(30));

    let outcome = r#"
        mutation Outcome($input: MeetingOutcomeInput!) {
            hr { recordMeetingOutcome(input: $input) { employeeFeedback managerNotes } }
        }
    "#;
    let resp = ctx
        .exec_as(ctx.dev(), outcome, json!({ "input": { "id": id, "managerNotes": "fine" } }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx
        .ok_as(ctx.dev(), outcome, json!({ "input": { "id": id, "employeeFeedback": "Useful" } }))
        .await;
    assert_eq!(data["recordMeetingOutcome"]["employeeFeedback"], json!("Useful"));
    let resp = ctx
        .exec_as(ctx.ops(), outcome, json!({ "input": { "id": id, "employeeFeedback": "?" } }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let status = r#"
        mutation Status($id: ID!, $status: MeetingStatus!) { hr { setMeetingStatus(id: $id, status: $status) { status } } }
    "#;
    let data = ctx
        .ok_as(ctx.hr(), status, json!({ "id": id, "status": "COMPLETED" }))
        .await;
    assert_eq!(data["setMeetingStatus"]["status"], json!("COMPLETED"));
    let resp = ctx
        .exec_as(ctx.hr(), status, json!({ "id": id, "status": "CANCELLED" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}
