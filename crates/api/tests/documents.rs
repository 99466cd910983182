mod common;

use common::{error_code, TestContext};
use serde_json::{json, Value};

const REQUEST: &str = r#"
    mutation Request($input: DocumentRequestInput!) {
        hr { requestDocument(input: $input) { id status quantity } }
    }
"#;

const ISSUE: &str = r#"
    mutation Issue($id: ID!) {
        hr { issueDocument(id: $id) { status issuedBy renderedContent isCompleted } }
    }
"#;

async fn request(ctx: &TestContext, document_type: &str) -> String {
    let vars = json!({ "input": {
        "documentType": document_type,
        "title": "For the bank",
        "purpose": "Bank loan"
    } });
    let data = ctx.ok_as(ctx.dev(), REQUEST, vars).await;
    assert_eq!(data["requestDocument"]["status"], json!("REQUESTED"));
    assert_eq!(data["requestDocument"]["quantity"], json!(1));
    data["requestDocument"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn employment_certificates_render_without_approval() {
    let ctx = TestContext::new().await;
    let id = request(&ctx, "EMPLOYMENT").await;

    let resp = ctx.exec_as(ctx.dev(), ISSUE, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let data = ctx.ok_as(ctx.hr(), ISSUE, json!({ "id": id })).await;
    let issued = &data["issueDocument"];
    assert_eq!(issued["status"], json!("ISSUED"));
    assert_eq!(issued["issuedBy"], json!(ctx.hr().id.to_string()));
    let text = issued["renderedContent"].as_str().unwrap();
    assert!(text.starts_with("This certifies that Dana Kim (E0101) of Engineering"), "{text}");
    assert!(text.contains("since 2021-03-01"), "{text}");
    assert!(text.contains("Purpose: Bank loan"), "{text}");
    assert!(!text.contains("{{"), "{text}");

    let receive = r#"mutation Receive($id: ID!) { hr { markDocumentReceived(id: $id) { status isCompleted } } }"#;
    let data = ctx.ok_as(ctx.dev(), receive, json!({ "id": id })).await;
    assert_eq!(data["markDocumentReceived"]["status"], json!("RECEIVED"));
    assert_eq!(data["markDocumentReceived"]["isCompleted"], json!(true));
}

#[tokio::test]
async fn untemplated_types_wait_for_approval() {
    let ctx = TestContext::new().await;
    let id = request(&ctx, "CAREER").await;

    let resp = ctx.exec_as(ctx.hr(), ISSUE, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let review = r#"mutation Review($id: ID!) { hr { reviewDocumentRequest(id: $id) { status } } }"#;
    let data = ctx.ok_as(ctx.hr(), review, json!({ "id": id })).await;
    assert_eq!(data["reviewDocumentRequest"]["status"], json!("UNDER_REVIEW"));

    let approve = r#"
        mutation Approve($id: ID!) { hr { approveDocumentRequest(id: $id) { status isApproved approverId } } }
    "#;
    let data = ctx.ok_as(ctx.hr(), approve, json!({ "id": id })).await;
    assert_eq!(data["approveDocumentRequest"]["isApproved"], json!(true));
    assert_eq!(data["approveDocumentRequest"]["approverId"], json!(ctx.hr().id.to_string()));

    let data = ctx.ok_as(ctx.hr(), ISSUE, json!({ "id": id })).await;
    assert_eq!(data["issueDocument"]["status"], json!("ISSUED"));
    assert_eq!(data["issueDocument"]["renderedContent"], Value::Null);
}

#[tokio::test]
async fn owners_cancel_and_managers_reject() {
    let ctx = TestContext::new().await;
    let first = request(&ctx, "CAREER").await;
    let second = request(&ctx, "CAREER").await;

    let cancel = r#"mutation Cancel($id: ID!) { hr { cancelDocumentRequest(id: $id) { status } } }"#;
    let resp = ctx.exec_as(ctx.ops(), cancel, json!({ "id": first })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.dev(), cancel, json!({ "id": first })).await;
    assert_eq!(data["cancelDocumentRequest"]["status"], json!("CANCELLED"));

    let reject = r#"
        mutation Reject($id: ID!, $reason: String!) {
            hr { rejectDocumentRequest(id: $id, reason: $reason) { status rejectionReason approverId approvedAt } }
        }
    "#;
    let resp = ctx
        .exec_as(ctx.dev(), reject, json!({ "id": second, "reason": "no" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx
        .ok_as(ctx.hr(), reject, json!({ "id": second, "reason": "duplicate request" }))
        .await;
    assert_eq!(data["rejectDocumentRequest"]["status"], json!("REJECTED"));
    assert_eq!(data["rejectDocumentRequest"]["rejectionReason"], json!("duplicate request"));
    assert_eq!(data["rejectDocumentRequest"]["approverId"], json!(ctx.hr().id.to_string()));
    assert!(data["rejectDocumentRequest"]["approvedAt"].is_string());

    let resp = ctx.exec_as(ctx.dev(), cancel, json!({ "id": second })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let list = r#"query { hr { documentRequests { id } } }"#;
    let data = ctx.ok_as(ctx.ops(), list, json!({})).await;
    assert_eq!(data["documentRequests"], json!([]));
    let data = ctx.ok_as(ctx.dev(), list, json!({})).await;
    assert_eq!(data["documentRequests"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn requests_need_at_least_one_copy() {
    let ctx = TestContext::new().await;
    let vars = json!({ "input": {
        "documentType": "EMPLOYMENT",
        "title": "Copies",
        "purpose": "Visa",
        "quantity": 0
    } });
    let resp = ctx.exec_as(ctx.dev(), REQUEST, vars).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn certificates_are_verified_once() {
    let ctx = TestContext::new().await;
    let add = r#"
        mutation Add($input: CertificateInput!) {
            hr { addCertificate(input: $input) { id employeeId isVerified isExpired } }
        }
    "#;
    let vars = json!({ "input": {
        "certificateType": "LICENSE",
        "name": "Engineer Information Processing",
        "issuer": "HRD Korea",
        "issueDate": "2018-05-01",
        "expiryDate": "2020-05-01"
    } });
    let data = ctx.ok_as(ctx.dev(), add, vars).await;
    let cert = &data["addCertificate"];
    assert_eq!(cert["employeeId"], json!(ctx.dev().id.to_string()));
    assert_eq!(cert["isVerified"], json!(false));
    assert_eq!(cert["isExpired"], json!(true));
    let id = cert["id"].as_str().unwrap().to_string();

    let verify = r#"mutation Verify($id: ID!) { hr { verifyCertificate(id: $id) { isVerified verifiedBy } } }"#;
    let resp = ctx.exec_as(ctx.dev(), verify, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.hr(), verify, json!({ "id": id })).await;
    assert_eq!(data["verifyCertificate"]["isVerified"], json!(true));
    assert_eq!(data["verifyCertificate"]["verifiedBy"], json!(ctx.hr().id.to_string()));
    let resp = ctx.exec_as(ctx.hr(), verify, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn training_costs_cannot_exceed_the_total() {
    let ctx = TestContext::new().await;
    let add = r#"
        mutation Add($input: TrainingRecordInput!) {
            hr { addTrainingRecord(input: $input) { id completionStatus durationDays isApproved } }
        }
    "#;
    let base = json!({
        "trainingType": "EXTERNAL",
        "title": "Rust in production",
        "startDate": "2025-02-03",
        "endDate": "2025-02-05",
        "hours": "21",
        "trainingCost": 900000,
        "companyCost": 700000,
        "personalCost": 300000
    });
    let resp = ctx.exec_as(ctx.dev(), add, json!({ "input": base.clone() })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));

    let mut rated = base.clone();
    rated["personalCost"] = json!(200000);
    rated["satisfactionRating"] = json!(6);
    let resp = ctx.exec_as(ctx.dev(), add, json!({ "input": rated })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));

    let mut valid = base;
    valid["personalCost"] = json!(200000);
    let data = ctx.ok_as(ctx.dev(), add, json!({ "input": valid })).await;
    let record = &data["addTrainingRecord"];
    assert_eq!(record["completionStatus"], json!("EXPECTED"));
    assert_eq!(record["durationDays"], json!(3));
    assert_eq!(record["isApproved"], json!(false));
    let id = record["id"].as_str().unwrap().to_string();

    let approve = r#"mutation Approve($id: ID!) { hr { approveTrainingRecord(id: $id) { isApproved } } }"#;
    let data = ctx.ok_as(ctx.hr(), approve, json!({ "id": id })).await;
    assert_eq!(data["approveTrainingRecord"]["isApproved"], json!(true));
    let resp = ctx.exec_as(ctx.hr(), approve, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn contracts_need_both_signatures() {
    let ctx = TestContext::new().await;
    let create = r#"
        mutation Create($input: ContractInput!) {
            hr { createContract(input: $input) { id status isFullySigned } }
        }
    "#;
    let input = json!({ "input": {
        "employeeId": ctx.dev().id,
        "contractType": "NDA",
        "title": "Confidentiality",
        "counterparty": "Dana Kim",
        "startDate": "2025-01-01"
    } });
    let resp = ctx.exec_as(ctx.dev(), create, input.clone()).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.hr(), create, input).await;
    assert_eq!(data["createContract"]["status"], json!("DRAFT"));
    let id = data["createContract"]["id"].as_str().unwrap().to_string();

    let status = r#"
        mutation Status($id: ID!, $status: ContractStatus!) {
            hr { setContractStatus(id: $id, status: $status) { status } }
        }
    "#;
    let resp = ctx
        .exec_as(ctx.hr(), status, json!({ "id": id, "status": "SIGNED" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
    let resp = ctx
        .exec_as(ctx.hr(), status, json!({ "id": id, "status": "ACTIVE" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let sign = r#"
        mutation Sign($id: ID!, $signature: String!, $isEmployee: Boolean!) {
            hr { signContract(id: $id, signature: $signature, isEmployee: $isEmployee) { status isFullySigned signedAt } }
        }
    "#;
    let resp = ctx
        .exec_as(ctx.hr(), sign, json!({ "id": id, "signature": "hr", "isEmployee": true }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let resp = ctx
        .exec_as(ctx.dev(), sign, json!({ "id": id, "signature": "dk", "isEmployee": false }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let data = ctx
        .ok_as(ctx.dev(), sign, json!({ "id": id, "signature": "dk", "isEmployee": true }))
        .await;
    assert_eq!(data["signContract"]["status"], json!("DRAFT"));
    assert_eq!(data["signContract"]["signedAt"], Value::Null);
    let data = ctx
        .ok_as(ctx.hr(), sign, json!({ "id": id, "signature": "company seal", "isEmployee": false }))
        .await;
    assert_eq!(data["signContract"]["status"], json!("SIGNED"));
    assert_eq!(data["signContract"]["isFullySigned"], json!(true));
    assert!(data["signContract"]["signedAt"].is_string());

    let resp = ctx
        .exec_as(ctx.dev(), sign, json!({ "id": id, "signature": "again", "isEmployee": true }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let resp = ctx
        .exec_as(ctx.hr(), status, json!({ "id": id, "status": "DRAFT" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
    let data = ctx
        .ok_as(ctx.hr(), status, json!({ "id": id, "status": "ACTIVE" }))
        .await;
    assert_eq!(data["setContractStatus"]["status"], json!("ACTIVE"));
    ctx.ok_as(ctx.hr(), status, json!({ "id": id, "status": "TERMINATED" }))
        .await;
    let resp = ctx
        .exec_as(ctx.hr(), status, json!({ "id": id, "status": "ACTIVE" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}
