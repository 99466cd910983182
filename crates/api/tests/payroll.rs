mod common;

use common::{error_code, number, TestContext};
use serde_json::{json, Value};

const GENERATE: &str = r#"
    mutation Generate($input: GeneratePayrollInput!) {
        hr {
            generatePayroll(input: $input) {
                id status baseSalary totalAllowances totalDeductions grossPay netPay
                allowancesDetail deductionsDetail
            }
        }
    }
"#;

fn payroll_input(ctx: &TestContext, month: i32) -> Value {
    json!({ "input": {
        "employeeId": ctx.dev().id,
        "year": 2025,
        "month": month,
        "salaryGradeId": ctx.seeded.salary_grades[0].id,
    } })
}

#[tokio::test]
async fn mandatory_items_price_the_month() {
    let ctx = TestContext::new().await;
    let data = ctx.ok_as(ctx.hr(), GENERATE, payroll_input(&ctx, 3)).await;
    let line = &data["generatePayroll"];
    assert_eq!(line["status"], json!("DRAFT"));
    assert_eq!(line["baseSalary"], json!(3_000_000));
    assert_eq!(line["totalAllowances"], json!(200_000));
    assert_eq!(line["grossPay"], json!(3_200_000));
    assert_eq!(line["allowancesDetail"], json!({ "MEAL": 200_000 }));
    assert_eq!(
        line["deductionsDetail"],
        json!({ "EI": 28_800, "HI": 113_440, "NP": 144_000 })
    );
    assert_eq!(line["totalDeductions"], json!(286_240));
    assert_eq!(line["netPay"], json!(2_913_760));
}

#[tokio::test]
async fn drafts_regenerate_in_place_until_confirmed() {
    let ctx = TestContext::new().await;
    let first = ctx.ok_as(ctx.hr(), GENERATE, payroll_input(&ctx, 4)).await;
    let id = first["generatePayroll"]["id"].clone();

    let mut vars = payroll_input(&ctx, 4);
    vars["input"]["allowanceCodes"] = json!(["MEAL", "DUTY"]);
    vars["input"]["deductionCodes"] = json!([]);
    let second = ctx.ok_as(ctx.hr(), GENERATE, vars).await;
    assert_eq!(second["generatePayroll"]["id"], id);
    assert_eq!(second["generatePayroll"]["totalAllowances"], json!(350_000));
    assert_eq!(second["generatePayroll"]["netPay"], json!(3_350_000));

    let confirm = r#"mutation Confirm($id: ID!) { hr { confirmPayroll(id: $id) { status } } }"#;
    let data = ctx.ok_as(ctx.hr(), confirm, json!({ "id": id })).await;
    assert_eq!(data["confirmPayroll"]["status"], json!("CONFIRMED"));

    let resp = ctx.exec_as(ctx.hr(), GENERATE, payroll_input(&ctx, 4)).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}

#[tokio::test]
async fn only_confirmed_payrolls_are_paid() {
    let ctx = TestContext::new().await;
    let data = ctx.ok_as(ctx.hr(), GENERATE, payroll_input(&ctx, 5)).await;
    let id = data["generatePayroll"]["id"].clone();
    let pay = r#"
        mutation Pay($id: ID!, $date: NaiveDate!) {
            hr { markPayrollPaid(id: $id, paymentDate: $date, paymentMethod: "transfer") { status paymentDate } }
        }
    "#;
    let resp = ctx
        .exec_as(ctx.hr(), pay, json!({ "id": id, "date": "2025-05-25" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let confirm = r#"mutation Confirm($id: ID!) { hr { confirmPayroll(id: $id) { status } } }"#;
    ctx.ok_as(ctx.hr(), confirm, json!({ "id": id })).await;
    let data = ctx
        .ok_as(ctx.hr(), pay, json!({ "id": id, "date": "2025-05-25" }))
        .await;
    assert_eq!(data["markPayrollPaid"]["status"], json!("PAID"));
    assert_eq!(data["markPayrollPaid"]["paymentDate"], json!("2025-05-25"));

    let cancel = r#"mutation Cancel($id: ID!) { hr { cancelPayroll(id: $id) { status } } }"#;
    let resp = ctx.exec_as(ctx.hr(), cancel, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}

#[tokio::test]
async fn payroll_needs_a_salary_source_and_known_codes() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .exec_as(
            ctx.hr(),
            GENERATE,
            json!({ "input": { "employeeId": ctx.dev().id, "year": 2025, "month": 6 } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));

    let mut vars = payroll_input(&ctx, 6);
    vars["input"]["allowanceCodes"] = json!(["NOPE"]);
    let resp = ctx.exec_as(ctx.hr(), GENERATE, vars).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));

    let mut vars = payroll_input(&ctx, 13);
    vars["input"]["baseSalary"] = json!(1_000_000);
    let resp = ctx.exec_as(ctx.hr(), GENERATE, vars).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn oversized_salaries_are_rejected() {
    let ctx = TestContext::new().await;
    let mut vars = payroll_input(&ctx, 9);
    vars["input"]["baseSalary"] = json!(i64::MAX - 10);
    let resp = ctx.exec_as(ctx.hr(), GENERATE, vars).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));

    let record = r#"
        mutation Salary($input: SalaryInput!) { hr { recordSalary(input: $input) { totalSalary } } }
    "#;
    let huge = rust_decimal::Decimal::MAX.to_string();
    let resp = ctx
        .exec_as(
            ctx.hr(),
            record,
            json!({ "input": {
                "employeeId": ctx.ops().id, "year": 2025, "month": 9,
                "baseSalary": huge, "carAllowance": huge
            } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn employees_see_only_their_payrolls() {
    let ctx = TestContext::new().await;
    ctx.ok_as(ctx.hr(), GENERATE, payroll_input(&ctx, 7)).await;
    let resp = ctx.exec_as(ctx.dev(), GENERATE, payroll_input(&ctx, 8)).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let query = r#"{ hr { payrolls { employeeId month } } }"#;
    let mine = ctx.ok_as(ctx.dev(), query, json!({})).await;
    assert_eq!(mine["payrolls"].as_array().unwrap().len(), 1);
    let theirs = ctx.ok_as(ctx.ops(), query, json!({})).await;
    assert!(theirs["payrolls"].as_array().unwrap().is_empty());

    let other = r#"query Other($id: ID) { hr { payrolls(employeeId: $id) { id } } }"#;
    let resp = ctx.exec_as(ctx.ops(), other, json!({ "id": ctx.dev().id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
}

#[tokio::test]
async fn bonuses_follow_their_workflow() {
    let ctx = TestContext::new().await;
    let request = r#"
        mutation Bonus($input: BonusInput!) { hr { requestBonus(input: $input) { id status } } }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            request,
            json!({ "input": { "employeeId": ctx.dev().id, "bonusType": "PERFORMANCE", "year": 2025, "quarter": 2, "amount": 500_000 } }),
        )
        .await;
    let id = data["requestBonus"]["id"].clone();
    assert_eq!(data["requestBonus"]["status"], json!("REQUESTED"));

    let pay = r#"
        mutation Pay($id: ID!) { hr { payBonus(id: $id, paymentDate: "2025-07-10") { status paymentDate } } }
    "#;
    let resp = ctx.exec_as(ctx.hr(), pay, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let approve = r#"mutation Approve($id: ID!) { hr { approveBonus(id: $id) { status approverId } } }"#;
    let data = ctx.ok_as(ctx.hr(), approve, json!({ "id": id })).await;
    assert_eq!(data["approveBonus"]["approverId"], json!(ctx.hr().id.to_string()));
    let data = ctx.ok_as(ctx.hr(), pay, json!({ "id": id })).await;
    assert_eq!(data["payBonus"]["status"], json!("PAID"));

    let bad_quarter = json!({ "input": { "employeeId": ctx.dev().id, "bonusType": "SPECIAL", "year": 2025, "quarter": 5, "amount": 1 } });
    let resp = ctx.exec_as(ctx.hr(), request, bad_quarter).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn defined_benefit_pensions_pay_a_premium() {
    let ctx = TestContext::new().await;
    let create = r#"
        mutation Pension($input: RetirementPensionInput!) {
            hr { createRetirementPension(input: $input) { id status payoutMethod } }
        }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            create,
            json!({ "input": {
                "employeeId": ctx.admin().id,
                "pensionType": "DB",
                "startDate": "2015-03-01",
                "monthlyContribution": 250_000,
                "totalContribution": 1_000_005
            } }),
        )
        .await;
    let id = data["createRetirementPension"]["id"].clone();
    assert_eq!(data["createRetirementPension"]["status"], json!("CALCULATING"));
    assert_eq!(data["createRetirementPension"]["payoutMethod"], json!("LUMP_SUM"));

    let paid = r#"
        mutation Paid($id: ID!) { hr { markPensionPaid(id: $id, payoutDate: "2026-01-31") { status } } }
    "#;
    let resp = ctx.exec_as(ctx.hr(), paid, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));

    let calculate = r#"
        mutation Calc($id: ID!) { hr { calculatePensionPayout(id: $id) { status payoutAmount } } }
    "#;
    let data = ctx.ok_as(ctx.hr(), calculate, json!({ "id": id })).await;
    assert_eq!(data["calculatePensionPayout"]["status"], json!("CONFIRMED"));
    assert_eq!(data["calculatePensionPayout"]["payoutAmount"], json!(1_200_006));

    let data = ctx.ok_as(ctx.hr(), paid, json!({ "id": id })).await;
    assert_eq!(data["markPensionPaid"]["status"], json!("PAID"));
    let resp = ctx.exec_as(ctx.hr(), calculate, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("INVALID_TRANSITION"));
}

#[tokio::test]
async fn salary_sheets_total_their_parts() {
    let ctx = TestContext::new().await;
    let record = r#"
        mutation Salary($input: SalaryInput!) { hr { recordSalary(input: $input) { id totalSalary } } }
    "#;
    let data = ctx
        .ok_as(
            ctx.hr(),
            record,
            json!({ "input": {
                "employeeId": ctx.ops().id, "year": 2025, "month": 3,
                "baseSalary": "2800000", "overtimePay": "150000.50", "mealAllowance": "200000"
            } }),
        )
        .await;
    let id = data["recordSalary"]["id"].clone();
    assert_eq!(number(&data["recordSalary"]["totalSalary"]), 3_150_000.5);

    let data = ctx
        .ok_as(
            ctx.hr(),
            record,
            json!({ "input": { "employeeId": ctx.ops().id, "year": 2025, "month": 3, "baseSalary": "3000000" } }),
        )
        .await;
    assert_eq!(data["recordSalary"]["id"], id);
    assert_eq!(number(&data["recordSalary"]["totalSalary"]), 3_000_000.0);
}

#[tokio::test]
async fn catalog_codes_are_unique() {
    let ctx = TestContext::new().await;
    let create = r#"
        mutation Allowance($input: AllowanceInput!) { hr { createAllowance(input: $input) { code isTaxable } } }
    "#;
    let input = json!({ "input": {
        "name": "Meal again", "code": "MEAL", "allowanceType": "WELFARE",
        "calculationMethod": "FIXED", "defaultAmount": 1
    } });
    let resp = ctx.exec_as(ctx.hr(), create, input).await;
    assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));

    let deduction = r#"
        mutation Deduction($input: DeductionInput!) { hr { createDeduction(input: $input) { code } } }
    "#;
    let input = json!({ "input": {
        "name": "Income tax", "code": "tax_income", "deductionType": "STATUTORY",
        "calculationMethod": "RATE", "rate": "120"
    } });
    let resp = ctx.exec_as(ctx.hr(), deduction, input).await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}
