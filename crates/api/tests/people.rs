mod common;

use api::seed::DEMO_PASSWORD;
use common::{error_code, TestContext};
use entity::{audit_entry, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

const LOGIN: &str = r#"
    mutation Login($email: String!, $password: String!) {
        hr { login(email: $email, password: $password) { token user { email roles isManagement } } }
    }
"#;

#[tokio::test]
async fn login_returns_token_and_roles() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .exec_anonymous(LOGIN, json!({ "email": "HR@hr.test", "password": DEMO_PASSWORD }))
        .await;
    assert!(resp.errors.is_empty(), "unexpected errors: {:?}", resp.errors);
    let cookie = resp.http_headers.get("set-cookie").unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("hr_session="));
    let data = resp.data.into_json().unwrap();
    let login = &data["hr"]["login"];
    assert!(!login["token"].as_str().unwrap().is_empty());
    assert_eq!(login["user"]["roles"], json!(["EMPLOYEE", "HR_MANAGER"]));
    assert_eq!(login["user"]["isManagement"], json!(true));
}

#[tokio::test]
async fn login_rejects_a_wrong_password() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .exec_anonymous(LOGIN, json!({ "email": "dev@hr.test", "password": "nope" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn anonymous_requests_need_a_session() {
    let ctx = TestContext::new().await;
    let resp = ctx.exec_anonymous("{ hr { me { id } } }", json!({})).await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn employees_cannot_create_users() {
    let ctx = TestContext::new().await;
    let mutation = r#"
        mutation Create($input: CreateUserInput!) { hr { createUser(input: $input) { id } } }
    "#;
    let vars = json!({ "input": { "email": "new@hr.test", "firstName": "New", "lastName": "Hire" } });
    let resp = ctx.exec_as(ctx.dev(), mutation, vars.clone()).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let created = ctx.ok_as(ctx.hr(), mutation, vars.clone()).await;
    let id = created["createUser"]["id"].as_str().unwrap().to_string();
    let resp = ctx.exec_as(ctx.hr(), mutation, vars).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));

    let trail = audit_entry::Entity::find()
        .filter(audit_entry::Column::EntityType.eq("user"))
        .filter(audit_entry::Column::EntityId.eq(uuid::Uuid::parse_str(&id).unwrap()))
        .all(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].actor_id, Some(ctx.hr().id));
}

#[tokio::test]
async fn hr_managers_cannot_grant_admin() {
    let ctx = TestContext::new().await;
    let mutation = r#"
        mutation Create($input: CreateUserInput!) { hr { createUser(input: $input) { id isAdmin } } }
    "#;
    let vars = json!({ "input": {
        "email": "boss@hr.test", "firstName": "Big", "lastName": "Boss", "isAdmin": true
    } });
    let resp = ctx.exec_as(ctx.hr(), mutation, vars.clone()).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.admin(), mutation, vars).await;
    assert_eq!(data["createUser"]["isAdmin"], json!(true));
}

#[tokio::test]
async fn profiles_mask_the_resident_number() {
    let ctx = TestContext::new().await;
    let mutation = r#"
        mutation Upsert($input: EmployeeProfileInput!) {
            hr { upsertEmployeeProfile(input: $input) { residentId employeeType status } }
        }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            mutation,
            json!({ "input": { "userId": ctx.dev().id, "residentId": "900101-1234567", "employeeType": "CONTRACT" } }),
        )
        .await;
    let profile = &data["upsertEmployeeProfile"];
    assert_eq!(profile["residentId"], json!("900101-*******"));
    assert_eq!(profile["employeeType"], json!("CONTRACT"));
    assert_eq!(profile["status"], json!("ACTIVE"));
}

#[tokio::test]
async fn appointments_update_user_and_history() {
    let ctx = TestContext::new().await;
    let mutation = r#"
        mutation Appoint($userId: ID!, $date: NaiveDate!, $position: String) {
            hr { recordAppointment(userId: $userId, date: $date, position: $position) { positionHistory } }
        }
    "#;
    let vars = json!({ "userId": ctx.dev().id, "date": "2025-01-02", "position": "Lead" });
    let data = ctx.ok_as(ctx.hr(), mutation, vars).await;
    assert_eq!(
        data["recordAppointment"]["positionHistory"],
        json!([{ "date": "2025-01-02", "position": "Lead" }])
    );
    let saved = user::Entity::find_by_id(ctx.dev().id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.position.as_deref(), Some("Lead"));
}

#[tokio::test]
async fn employees_only_read_themselves() {
    let ctx = TestContext::new().await;
    let query = r#"query User($id: ID!) { hr { user(id: $id) { email } } }"#;
    let resp = ctx.exec_as(ctx.dev(), query, json!({ "id": ctx.ops().id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.dev(), query, json!({ "id": ctx.dev().id })).await;
    assert_eq!(data["user"]["email"], json!("dev@hr.test"));
}
