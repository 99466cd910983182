mod common;

use api::render_org_chart;
use common::{error_code, TestContext};
use entity::{employee_organization, organization};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};

const ORG: &str = r#"
    query Org($id: ID!) {
        hr { organization(id: $id) { name level isActive employeeCount fullPath ancestorNames children { code } } }
    }
"#;

const MOVE: &str = r#"
    mutation Move($id: ID!, $parentId: ID) { hr { moveOrganization(id: $id, parentId: $parentId) { level parentId } } }
"#;

fn org_id(ctx: &TestContext, code: &str) -> String {
    ctx.seeded.organization_code(code).unwrap().id.to_string()
}

async fn org(ctx: &TestContext, code: &str) -> Value {
    let data = ctx.ok_as(ctx.dev(), ORG, json!({ "id": org_id(ctx, code) })).await;
    data["organization"].clone()
}

async fn counts(ctx: &TestContext) -> Vec<(String, i32)> {
    let mut rows: Vec<(String, i32)> = organization::Entity::find()
        .all(ctx.db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|o| (o.code, o.employee_count))
        .collect();
    rows.sort();
    rows
}

#[tokio::test]
async fn units_know_their_place_in_the_tree() {
    let ctx = TestContext::new().await;
    let backend = org(&ctx, "ENG-BE").await;
    assert_eq!(backend["fullPath"], json!("Head Office > Engineering > Backend"));
    assert_eq!(backend["ancestorNames"], json!(["Head Office", "Engineering"]));
    assert_eq!(backend["employeeCount"], json!(2));

    let head = org(&ctx, "HQ").await;
    assert_eq!(head["children"], json!([{ "code": "ENG" }, { "code": "POPS" }]));
    assert_eq!(head["employeeCount"], json!(3));

    let roots = ctx
        .ok_as(ctx.dev(), "{ hr { organizationRoots { code employees { email } } } }", json!({}))
        .await;
    assert_eq!(roots["organizationRoots"].as_array().unwrap().len(), 1);
    assert_eq!(roots["organizationRoots"][0]["employees"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn moves_cannot_create_cycles() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .exec_as(ctx.hr(), MOVE, json!({ "id": org_id(&ctx, "HQ"), "parentId": org_id(&ctx, "ENG-BE") }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
    let resp = ctx
        .exec_as(ctx.hr(), MOVE, json!({ "id": org_id(&ctx, "ENG"), "parentId": org_id(&ctx, "ENG") }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn moving_a_unit_relevels_and_recounts() {
    let ctx = TestContext::new().await;
    let data = ctx
        .ok_as(ctx.hr(), MOVE, json!({ "id": org_id(&ctx, "ENG"), "parentId": org_id(&ctx, "POPS") }))
        .await;
    assert_eq!(data["moveOrganization"]["level"], json!(3));

    let backend = org(&ctx, "ENG-BE").await;
    assert_eq!(backend["level"], json!(4));
    assert_eq!(
        backend["fullPath"],
        json!("Head Office > People Operations > Engineering > Backend")
    );
    assert_eq!(
        counts(&ctx).await,
        vec![
            ("ENG".into(), 2),
            ("ENG-BE".into(), 2),
            ("HQ".into(), 3),
            ("POPS".into(), 3)
        ]
    );

    let data = ctx
        .ok_as(ctx.hr(), MOVE, json!({ "id": org_id(&ctx, "ENG"), "parentId": null }))
        .await;
    assert_eq!(data["moveOrganization"]["level"], json!(1));
    assert_eq!(data["moveOrganization"]["parentId"], Value::Null);
}

#[tokio::test]
async fn units_with_children_stay_active() {
    let ctx = TestContext::new().await;
    let deactivate = r#"
        mutation Off($id: ID!) { hr { deactivateOrganization(id: $id) { isActive } } }
    "#;
    let resp = ctx
        .exec_as(ctx.hr(), deactivate, json!({ "id": org_id(&ctx, "ENG") }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
    let data = ctx
        .ok_as(ctx.hr(), deactivate, json!({ "id": org_id(&ctx, "ENG-BE") }))
        .await;
    assert_eq!(data["deactivateOrganization"]["isActive"], json!(false));

    let list = ctx
        .ok_as(ctx.dev(), "{ hr { organizations { code } } }", json!({}))
        .await;
    let codes: Vec<&str> = list["organizations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["HQ", "ENG", "POPS"]);
}

#[tokio::test]
async fn employees_cannot_restructure() {
    let ctx = TestContext::new().await;
    let create = r#"
        mutation Create($input: OrganizationInput!) { hr { createOrganization(input: $input) { level code } } }
    "#;
    let input = json!({ "input": {
        "name": "Frontend", "code": "ENG-FE", "parentId": org_id(&ctx, "ENG"), "organizationType": "TEAM"
    } });
    let resp = ctx.exec_as(ctx.dev(), create, input.clone()).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    let data = ctx.ok_as(ctx.hr(), create, input.clone()).await;
    assert_eq!(data["createOrganization"]["level"], json!(3));
    let resp = ctx.exec_as(ctx.hr(), create, input).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn primary_assignments_replace_each_other() {
    let ctx = TestContext::new().await;
    let assign = r#"
        mutation Assign($input: AssignmentInput!) {
            hr { assignEmployee(input: $input) { id isPrimary isCurrent } }
        }
    "#;
    let input = json!({ "input": {
        "employeeId": ctx.ops().id,
        "organizationId": org_id(&ctx, "POPS"),
        "appointmentType": "TRANSFER",
        "startDate": "2025-01-01"
    } });
    let data = ctx.ok_as(ctx.hr(), assign, input.clone()).await;
    assert_eq!(data["assignEmployee"]["isPrimary"], json!(true));
    assert_eq!(data["assignEmployee"]["isCurrent"], json!(true));
    let resp = ctx.exec_as(ctx.hr(), assign, input).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));

    let primaries = employee_organization::Entity::find()
        .filter(employee_organization::Column::EmployeeId.eq(ctx.ops().id))
        .filter(employee_organization::Column::IsPrimary.eq(true))
        .all(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].organization_id.to_string(), org_id(&ctx, "POPS"));

    // ops now sits in both units; each subtree counts them once.
    assert_eq!(
        counts(&ctx).await,
        vec![
            ("ENG".into(), 2),
            ("ENG-BE".into(), 2),
            ("HQ".into(), 3),
            ("POPS".into(), 2)
        ]
    );

    let mine = ctx
        .ok_as(ctx.ops(), "{ hr { employeeAssignments { appointmentType isPrimary } } }", json!({}))
        .await;
    assert_eq!(mine["employeeAssignments"][0]["appointmentType"], json!("TRANSFER"));
    assert_eq!(mine["employeeAssignments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn ending_an_assignment_drops_the_head_count() {
    let ctx = TestContext::new().await;
    let assignment = employee_organization::Entity::find()
        .filter(employee_organization::Column::EmployeeId.eq(ctx.dev().id))
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let end = r#"
        mutation End($id: ID!, $date: NaiveDate!) { hr { endAssignment(id: $id, endDate: $date) { isActive endDate } } }
    "#;
    let resp = ctx
        .exec_as(ctx.hr(), end, json!({ "id": assignment.id, "date": "2020-01-01" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
    let data = ctx
        .ok_as(ctx.hr(), end, json!({ "id": assignment.id, "date": "2024-12-31" }))
        .await;
    assert_eq!(data["endAssignment"]["isActive"], json!(false));
    assert_eq!(org(&ctx, "ENG-BE").await["employeeCount"], json!(1));
    assert_eq!(org(&ctx, "HQ").await["employeeCount"], json!(2));
}

const CHANGE: &str = r#"
    mutation Change($input: ChangeRequestInput!) {
        hr { createOrganizationChangeRequest(input: $input) { id status requesterId } }
    }
"#;

async fn walk_to_approved(ctx: &TestContext, id: &Value) {
    for step in ["submitOrganizationChange", "approveOrganizationChange"] {
        let mutation = format!("mutation Step($id: ID!) {{ hr {{ {step}(id: $id) {{ status }} }} }}");
        ctx.ok_as(ctx.hr(), &mutation, json!({ "id": id })).await;
    }
}

const IMPLEMENT: &str = r#"
    mutation Implement($id: ID!) {
        hr { implementOrganizationChange(id: $id) { status implementedAt approverId } }
    }
"#;

#[tokio::test]
async fn approved_creations_add_a_unit() {
    let ctx = TestContext::new().await;
    let data = ctx
        .ok_as(
            ctx.hr(),
            CHANGE,
            json!({ "input": {
                "changeType": "CREATE",
                "title": "Open a data team",
                "newParentId": org_id(&ctx, "ENG"),
                "details": { "name": "Data", "code": "ENG-DATA", "organizationType": "PART" },
                "effectiveDate": "2025-07-01"
            } }),
        )
        .await;
    let id = data["createOrganizationChangeRequest"]["id"].clone();
    assert_eq!(data["createOrganizationChangeRequest"]["status"], json!("DRAFT"));

    let resp = ctx.exec_as(ctx.hr(), IMPLEMENT, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    walk_to_approved(&ctx, &id).await;
    let data = ctx.ok_as(ctx.admin(), IMPLEMENT, json!({ "id": id })).await;
    let done = &data["implementOrganizationChange"];
    assert_eq!(done["status"], json!("IMPLEMENTED"));
    assert!(done["implementedAt"].is_string());
    assert_eq!(done["approverId"], json!(ctx.hr().id.to_string()));

    let created = organization::Entity::find()
        .filter(organization::Column::Code.eq("ENG-DATA"))
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.level, 3);
    assert_eq!(created.organization_type, organization::OrganizationType::Part);

    let pending = ctx
        .ok_as(ctx.hr(), "{ hr { organizationChangeRequests(status: IMPLEMENTED) { id } } }", json!({}))
        .await;
    assert_eq!(pending["organizationChangeRequests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn merges_move_people_and_close_the_source() {
    let ctx = TestContext::new().await;
    let data = ctx
        .ok_as(
            ctx.hr(),
            CHANGE,
            json!({ "input": {
                "changeType": "MERGE",
                "title": "Fold backend into people ops",
                "targetOrganizationId": org_id(&ctx, "ENG-BE"),
                "newParentId": org_id(&ctx, "POPS"),
                "effectiveDate": "2025-07-01"
            } }),
        )
        .await;
    let id = data["createOrganizationChangeRequest"]["id"].clone();
    walk_to_approved(&ctx, &id).await;
    ctx.ok_as(ctx.hr(), IMPLEMENT, json!({ "id": id })).await;

    assert_eq!(org(&ctx, "ENG-BE").await["isActive"], json!(false));
    assert_eq!(
        counts(&ctx).await,
        vec![
            ("ENG".into(), 0),
            ("ENG-BE".into(), 0),
            ("HQ".into(), 3),
            ("POPS".into(), 3)
        ]
    );
}

#[tokio::test]
async fn change_requests_validate_their_details() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .exec_as(
            ctx.hr(),
            CHANGE,
            json!({ "input": {
                "changeType": "SPLIT", "title": "Split", "targetOrganizationId": org_id(&ctx, "ENG"),
                "details": { "units": [] }, "effectiveDate": "2025-07-01"
            } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));

    let data = ctx
        .ok_as(
            ctx.hr(),
            CHANGE,
            json!({ "input": {
                "changeType": "ABOLISH", "title": "Close", "targetOrganizationId": org_id(&ctx, "POPS"),
                "effectiveDate": "2025-07-01"
            } }),
        )
        .await;
    let id = data["createOrganizationChangeRequest"]["id"].clone();
    ctx.ok_as(
        ctx.hr(),
        "mutation S($id: ID!) { hr { submitOrganizationChange(id: $id) { status } } }",
        json!({ "id": id }),
    )
    .await;
    let data = ctx
        .ok_as(
            ctx.hr(),
            "mutation R($id: ID!) { hr { rejectOrganizationChange(id: $id) { status approverId } } }",
            json!({ "id": id }),
        )
        .await;
    assert_eq!(data["rejectOrganizationChange"]["status"], json!("REJECTED"));
    let resp = ctx.exec_as(ctx.hr(), IMPLEMENT, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}

#[tokio::test]
async fn the_chart_nests_active_units() {
    let ctx = TestContext::new().await;
    let html = render_org_chart(ctx.db.as_ref()).await.unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    let head = html.find("Head Office").unwrap();
    let engineering = html.find("Engineering").unwrap();
    let backend = html.find("Backend").unwrap();
    assert!(head < engineering && engineering < backend);
    assert_eq!(html.matches("<ul class=\"org-tree\">").count(), 3);
}
