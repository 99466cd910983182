use async_graphql::{ComplexObject, Context, InputObject, Json, Object, SimpleObject, ID};
use chrono::{DateTime, Months, NaiveDate, Utc};
use entity::workflow::Workflow;
use entity::{allowance, attendance, bonus, deduction, payroll, retirement_pension, salary, salary_grade};
use platform_api::ResultExt;
use products_hr::payroll::{compute_payroll, SalarySheet, WorkSummary};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::enums::{
    AllowanceMethod, AllowanceType, BonusStatus, BonusType, DeductionMethod, DeductionType,
    PayoutMethod, PayrollStatus, PensionStatus, PensionType,
};
use super::people::required_text;
use super::{
    current_user, database, ensure_self_or_management, error_with_code, find_employee,
    find_required, now, parse_optional_uuid, parse_uuid, record_audit, require_management,
    subject_employee, to_id, utc, validation_error,
};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "SalaryGrade")]
pub struct SalaryGradeNode {
    pub id: ID,
    pub grade: String,
    pub name: String,
    pub base_salary: i64,
    pub min_salary: i64,
    pub max_salary: i64,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<salary_grade::Model> for SalaryGradeNode {
    fn from(model: salary_grade::Model) -> Self {
        Self {
            id: to_id(model.id),
            grade: model.grade,
            name: model.name,
            base_salary: model.base_salary,
            min_salary: model.min_salary,
            max_salary: model.max_salary,
            description: model.description,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Allowance")]
pub struct AllowanceNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub allowance_type: AllowanceType,
    pub calculation_method: AllowanceMethod,
    pub default_amount: i64,
    pub is_taxable: bool,
    pub is_mandatory: bool,
    pub is_active: bool,
    pub description: Option<String>,
}

impl From<allowance::Model> for AllowanceNode {
    fn from(model: allowance::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            code: model.code,
            allowance_type: model.allowance_type.into(),
            calculation_method: model.calculation_method.into(),
            default_amount: model.default_amount,
            is_taxable: model.is_taxable,
            is_mandatory: model.is_mandatory,
            is_active: model.is_active,
            description: model.description,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Deduction")]
pub struct DeductionNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub deduction_type: DeductionType,
    pub calculation_method: DeductionMethod,
    /// Percentage points.
    pub rate: Decimal,
    pub default_amount: i64,
    pub is_mandatory: bool,
    pub is_active: bool,
    pub description: Option<String>,
}

impl From<deduction::Model> for DeductionNode {
    fn from(model: deduction::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            code: model.code,
            deduction_type: model.deduction_type.into(),
            calculation_method: model.calculation_method.into(),
            rate: model.rate,
            default_amount: model.default_amount,
            is_mandatory: model.is_mandatory,
            is_active: model.is_active,
            description: model.description,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Payroll", complex)]
pub struct PayrollNode {
    pub id: ID,
    pub employee_id: ID,
    pub year: i32,
    pub month: i32,
    pub salary_grade_id: Option<ID>,
    pub base_salary: i64,
    pub total_allowances: i64,
    pub total_deductions: i64,
    pub gross_pay: i64,
    pub net_pay: i64,
    pub allowances_detail: Json<Value>,
    pub deductions_detail: Json<Value>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub status: PayrollStatus,
    pub notes: Option<String>,
    #[graphql(skip)]
    model: payroll::Model,
}

impl From<payroll::Model> for PayrollNode {
    fn from(model: payroll::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            year: model.year,
            month: model.month,
            salary_grade_id: model.salary_grade_id.map(to_id),
            base_salary: model.base_salary,
            total_allowances: model.total_allowances,
            total_deductions: model.total_deductions,
            gross_pay: model.gross_pay,
            net_pay: model.net_pay,
            allowances_detail: Json(model.allowances_detail.clone()),
            deductions_detail: Json(model.deductions_detail.clone()),
            payment_date: model.payment_date,
            payment_method: model.payment_method.clone(),
            bank_name: model.bank_name.clone(),
            account_number: model.account_number.clone(),
            status: model.status.into(),
            notes: model.notes.clone(),
            model,
        }
    }
}

#[ComplexObject]
impl PayrollNode {
    async fn tax_amount(&self) -> i64 {
        self.model.tax_amount()
    }

    async fn insurance_amount(&self) -> i64 {
        self.model.insurance_amount()
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Bonus")]
pub struct BonusNode {
    pub id: ID,
    pub employee_id: ID,
    pub bonus_type: BonusType,
    pub year: i32,
    pub quarter: Option<i32>,
    pub amount: i64,
    pub reason: Option<String>,
    pub status: BonusStatus,
    pub approver_id: Option<ID>,
    pub approved_at: Option<DateTime<Utc>>,
    pub payment_date: Option<NaiveDate>,
}

impl From<bonus::Model> for BonusNode {
    fn from(model: bonus::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            bonus_type: model.bonus_type.into(),
            year: model.year,
            quarter: model.quarter,
            amount: model.amount,
            reason: model.reason,
            status: model.status.into(),
            approver_id: model.approver_id.map(to_id),
            approved_at: model.approved_at.map(utc),
            payment_date: model.payment_date,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "RetirementPension")]
pub struct RetirementPensionNode {
    pub id: ID,
    pub employee_id: ID,
    pub pension_type: PensionType,
    pub start_date: NaiveDate,
    pub monthly_contribution: i64,
    pub total_contribution: i64,
    pub payout_amount: Option<i64>,
    pub payout_method: PayoutMethod,
    pub status: PensionStatus,
    pub retirement_date: Option<NaiveDate>,
    pub payout_date: Option<NaiveDate>,
}

impl From<retirement_pension::Model> for RetirementPensionNode {
    fn from(model: retirement_pension::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            pension_type: model.pension_type.into(),
            start_date: model.start_date,
            monthly_contribution: model.monthly_contribution,
            total_contribution: model.total_contribution,
            payout_amount: model.payout_amount,
            payout_method: model.payout_method.into(),
            status: model.status.into(),
            retirement_date: model.retirement_date,
            payout_date: model.payout_date,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Salary")]
pub struct SalaryNode {
    pub id: ID,
    pub employee_id: ID,
    pub year: i32,
    pub month: i32,
    pub base_salary: Decimal,
    pub overtime_pay: Decimal,
    pub meal_allowance: Decimal,
    pub childcare_allowance: Decimal,
    pub car_allowance: Decimal,
    pub total_salary: Decimal,
}

impl From<salary::Model> for SalaryNode {
    fn from(model: salary::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            year: model.year,
            month: model.month,
            base_salary: model.base_salary,
            overtime_pay: model.overtime_pay,
            meal_allowance: model.meal_allowance,
            childcare_allowance: model.childcare_allowance,
            car_allowance: model.car_allowance,
            total_salary: model.total_salary,
        }
    }
}

#[derive(InputObject, Clone)]
pub struct SalaryGradeInput {
    pub grade: String,
    pub name: String,
    pub base_salary: i64,
    pub min_salary: i64,
    pub max_salary: i64,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct AllowanceInput {
    pub name: String,
    pub code: String,
    pub allowance_type: AllowanceType,
    pub calculation_method: AllowanceMethod,
    pub default_amount: i64,
    pub is_taxable: Option<bool>,
    pub is_mandatory: Option<bool>,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct DeductionInput {
    pub name: String,
    pub code: String,
    pub deduction_type: DeductionType,
    pub calculation_method: DeductionMethod,
    pub rate: Option<Decimal>,
    pub default_amount: Option<i64>,
    pub is_mandatory: Option<bool>,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct GeneratePayrollInput {
    pub employee_id: ID,
    pub year: i32,
    pub month: i32,
    pub salary_grade_id: Option<ID>,
    /// Overrides the grade's base salary.
    pub base_salary: Option<i64>,
    /// Allowance codes to apply; mandatory active items when omitted.
    pub allowance_codes: Option<Vec<String>>,
    pub deduction_codes: Option<Vec<String>>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct BonusInput {
    pub employee_id: ID,
    pub bonus_type: BonusType,
    pub year: i32,
    pub quarter: Option<i32>,
    pub amount: i64,
    pub reason: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct RetirementPensionInput {
    pub employee_id: ID,
    pub pension_type: PensionType,
    pub start_date: NaiveDate,
    pub monthly_contribution: i64,
    pub total_contribution: i64,
    pub payout_method: Option<PayoutMethod>,
    pub retirement_date: Option<NaiveDate>,
}

#[derive(InputObject, Clone)]
pub struct SalaryInput {
    pub employee_id: ID,
    pub year: i32,
    pub month: i32,
    pub base_salary: Decimal,
    pub overtime_pay: Option<Decimal>,
    pub meal_allowance: Option<Decimal>,
    pub childcare_allowance: Option<Decimal>,
    pub car_allowance: Option<Decimal>,
}

#[derive(Default)]
pub struct PayrollQuery;

#[Object]
impl PayrollQuery {
    async fn salary_grades(
        &self,
        ctx: &Context<'_>,
        include_inactive: Option<bool>,
    ) -> async_graphql::Result<Vec<SalaryGradeNode>> {
        require_management(ctx)?;
        let db = database(ctx)?;
        let mut query = salary_grade::Entity::find();
        if !include_inactive.unwrap_or(false) {
            query = query.filter(salary_grade::Column::IsActive.eq(true));
        }
        let rows = query
            .order_by_asc(salary_grade::Column::Grade)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(SalaryGradeNode::from).collect())
    }

    async fn allowances(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<AllowanceNode>> {
        require_management(ctx)?;
        let db = database(ctx)?;
        let rows = allowance::Entity::find()
            .order_by_asc(allowance::Column::Code)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(AllowanceNode::from).collect())
    }

    async fn deductions(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<DeductionNode>> {
        require_management(ctx)?;
        let db = database(ctx)?;
        let rows = deduction::Entity::find()
            .order_by_asc(deduction::Column::Code)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(DeductionNode::from).collect())
    }

    /// Employees see their own pay lines; management may filter by anyone.
    async fn payrolls(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        year: Option<i32>,
        month: Option<i32>,
        status: Option<PayrollStatus>,
    ) -> async_graphql::Result<Vec<PayrollNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = payroll::Entity::find();
        match employee_id {
            Some(id) => {
                let id = parse_uuid(&id)?;
                ensure_self_or_management(&viewer, id)?;
                query = query.filter(payroll::Column::EmployeeId.eq(id));
            }
            None if viewer.is_management() => {}
            None => query = query.filter(payroll::Column::EmployeeId.eq(viewer.user_id)),
        }
        if let Some(year) = year {
            query = query.filter(payroll::Column::Year.eq(year));
        }
        if let Some(month) = month {
            query = query.filter(payroll::Column::Month.eq(month));
        }
        if let Some(status) = status {
            query = query.filter(payroll::Column::Status.eq(payroll::Status::from(status)));
        }
        let rows = query
            .order_by_desc(payroll::Column::Year)
            .order_by_desc(payroll::Column::Month)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(PayrollNode::from).collect())
    }

    async fn payroll(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<PayrollNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let row = find_required::<payroll::Entity, _>(db.as_ref(), parse_uuid(&id)?, "payroll").await?;
        ensure_self_or_management(&viewer, row.employee_id)?;
        Ok(row.into())
    }

    async fn bonuses(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        year: Option<i32>,
    ) -> async_graphql::Result<Vec<BonusNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let mut query = bonus::Entity::find().filter(bonus::Column::EmployeeId.eq(employee_id));
        if let Some(year) = year {
            query = query.filter(bonus::Column::Year.eq(year));
        }
        let rows = query
            .order_by_desc(bonus::Column::Year)
            .order_by_desc(bonus::Column::CreatedAt)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(BonusNode::from).collect())
    }

    async fn retirement_pensions(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<RetirementPensionNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = retirement_pension::Entity::find()
            .filter(retirement_pension::Column::EmployeeId.eq(employee_id))
            .order_by_desc(retirement_pension::Column::StartDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(RetirementPensionNode::from).collect())
    }

    async fn salaries(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        year: Option<i32>,
    ) -> async_graphql::Result<Vec<SalaryNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let mut query = salary::Entity::find().filter(salary::Column::EmployeeId.eq(employee_id));
        if let Some(year) = year {
            query = query.filter(salary::Column::Year.eq(year));
        }
        let rows = query
            .order_by_desc(salary::Column::Year)
            .order_by_desc(salary::Column::Month)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(SalaryNode::from).collect())
    }
}

#[derive(Default)]
pub struct PayrollMutation;

#[Object]
impl PayrollMutation {
    async fn create_salary_grade(
        &self,
        ctx: &Context<'_>,
        input: SalaryGradeInput,
    ) -> async_graphql::Result<SalaryGradeNode> {
        let viewer = require_management(ctx)?;
        let grade = required_text("grade", &input.grade)?;
        let name = required_text("name", &input.name)?;
        if input.min_salary < 0 || input.min_salary > input.max_salary {
            return Err(validation_error("minSalary must be between 0 and maxSalary"));
        }
        if input.base_salary < input.min_salary || input.base_salary > input.max_salary {
            return Err(validation_error("baseSalary must lie within the grade range"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let taken = salary_grade::Entity::find()
            .filter(salary_grade::Column::Grade.eq(grade.as_str()))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Salary grade already exists"));
        }
        let at = now();
        let row = salary_grade::ActiveModel {
            id: Set(Uuid::new_v4()),
            grade: Set(grade),
            name: Set(name),
            base_salary: Set(input.base_salary),
            min_salary: Set(input.min_salary),
            max_salary: Set(input.max_salary),
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
            "salary_grade",
            row.id,
            "create",
            json!({ "grade": row.grade, "baseSalary": row.base_salary }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_allowance(
        &self,
        ctx: &Context<'_>,
        input: AllowanceInput,
    ) -> async_graphql::Result<AllowanceNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        let code = required_text("code", &input.code)?;
        if input.default_amount < 0 {
            return Err(validation_error("defaultAmount cannot be negative"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let taken = allowance::Entity::find()
            .filter(
                Condition::any()
                    .add(allowance::Column::Name.eq(name.as_str()))
                    .add(allowance::Column::Code.eq(code.as_str())),
            )
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Allowance name or code already exists"));
        }
        let at = now();
        let row = allowance::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            allowance_type: Set(input.allowance_type.into()),
            calculation_method: Set(input.calculation_method.into()),
            default_amount: Set(input.default_amount),
            is_taxable: Set(input.is_taxable.unwrap_or(true)),
            is_mandatory: Set(input.is_mandatory.unwrap_or(false)),
            is_active: Set(true),
            description: Set(input.description),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "allowance",
            row.id,
            "create",
            json!({ "code": row.code, "method": row.calculation_method.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_deduction(
        &self,
        ctx: &Context<'_>,
        input: DeductionInput,
    ) -> async_graphql::Result<DeductionNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        let code = required_text("code", &input.code)?;
        let rate = input.rate.unwrap_or(Decimal::ZERO);
        if rate.is_sign_negative() || rate > Decimal::ONE_HUNDRED {
            return Err(validation_error("rate must be between 0 and 100"));
        }
        let default_amount = input.default_amount.unwrap_or(0);
        if default_amount < 0 {
            return Err(validation_error("defaultAmount cannot be negative"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let taken = deduction::Entity::find()
            .filter(
                Condition::any()
                    .add(deduction::Column::Name.eq(name.as_str()))
                    .add(deduction::Column::Code.eq(code.as_str())),
            )
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Deduction name or code already exists"));
        }
        let at = now();
        let row = deduction::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            deduction_type: Set(input.deduction_type.into()),
            calculation_method: Set(input.calculation_method.into()),
            rate: Set(rate),
            default_amount: Set(default_amount),
            is_mandatory: Set(input.is_mandatory.unwrap_or(false)),
            is_active: Set(true),
            description: Set(input.description),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "deduction",
            row.id,
            "create",
            json!({ "code": row.code, "method": row.calculation_method.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Price a month of pay from the catalog and the employee's attendance.
    /// A draft for the same month is recomputed in place.
    async fn generate_payroll(
        &self,
        ctx: &Context<'_>,
        input: GeneratePayrollInput,
    ) -> async_graphql::Result<PayrollNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        let grade_id = parse_optional_uuid(input.salary_grade_id.as_ref())?;
        let (first_day, last_day) = month_bounds(input.year, input.month)?;
        let db = database(ctx)?;
        let span = info_span!(
            "hr.payroll.generate",
            employee_id = %employee_id,
            year = input.year,
            month = input.month
        );
        async move {
            let txn = db.begin().await.api()?;
            find_employee(&txn, employee_id).await?;

            let grade = match grade_id {
                Some(id) => Some(find_required::<salary_grade::Entity, _>(&txn, id, "salary grade").await?),
                None => None,
            };
            let base_salary = match (input.base_salary, grade.as_ref()) {
                (Some(base), _) => base,
                (None, Some(grade)) => grade.base_salary,
                (None, None) => {
                    return Err(validation_error("baseSalary or salaryGradeId is required"));
                }
            };

            let allowances = allowance_rules(&txn, input.allowance_codes.as_deref()).await?;
            let deductions = deduction_rules(&txn, input.deduction_codes.as_deref()).await?;
            let work = work_summary(&txn, employee_id, first_day, last_day).await?;
            let breakdown = compute_payroll(base_salary, &allowances, &deductions, &work).api()?;

            let existing = payroll::Entity::find()
                .filter(payroll::Column::EmployeeId.eq(employee_id))
                .filter(payroll::Column::Year.eq(input.year))
                .filter(payroll::Column::Month.eq(input.month))
                .one(&txn)
                .await
                .api()?;
            let at = now();
            let is_new = existing.is_none();
            let mut active = match existing {
                Some(row) if row.status != payroll::Status::Draft => {
                    return Err(error_with_code(
                        "INVALID_TRANSITION",
                        format!(
                            "payroll cannot be regenerated from {}",
                            row.status.to_value()
                        ),
                    ));
                }
                Some(row) => row.into_active_model(),
                None => payroll::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    employee_id: Set(employee_id),
                    year: Set(input.year),
                    month: Set(input.month),
                    payment_date: Set(None),
                    payment_method: Set(None),
                    status: Set(payroll::Status::Draft),
                    created_at: Set(at),
                    ..Default::default()
                },
            };
            active.salary_grade_id = Set(grade.as_ref().map(|g| g.id));
            active.base_salary = Set(breakdown.base_salary);
            active.total_allowances = Set(breakdown.total_allowances);
            active.total_deductions = Set(breakdown.total_deductions);
            active.gross_pay = Set(breakdown.gross_pay);
            active.net_pay = Set(breakdown.net_pay);
            active.allowances_detail = Set(breakdown.allowances_json());
            active.deductions_detail = Set(breakdown.deductions_json());
            active.bank_name = Set(input.bank_name);
            active.account_number = Set(input.account_number);
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
                "payroll",
                row.id,
                if is_new { "generate" } else { "regenerate" },
                json!({
                    "grossPay": row.gross_pay,
                    "netPay": row.net_pay,
                    "daysWorked": work.days_worked,
                    "overtimeHours": work.overtime_hours.to_string(),
                }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            info!(net_pay = row.net_pay, "payroll generated");
            Ok(row.into())
        }
        .instrument(span)
        .await
    }

    async fn confirm_payroll(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<PayrollNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<payroll::Entity, _>(&txn, parse_uuid(&id)?, "payroll").await?;
        let status = row.status.advance(payroll::Status::Confirmed).api()?;
        let mut active = row.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(&txn, Some(viewer.user_id), "payroll", row.id, "confirm", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn mark_payroll_paid(
        &self,
        ctx: &Context<'_>,
        id: ID,
        payment_date: NaiveDate,
        payment_method: Option<String>,
    ) -> async_graphql::Result<PayrollNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<payroll::Entity, _>(&txn, parse_uuid(&id)?, "payroll").await?;
        let status = row.status.advance(payroll::Status::Paid).api()?;
        let mut active = row.into_active_model();
        active.status = Set(status);
        active.payment_date = Set(Some(payment_date));
        active.payment_method = Set(payment_method);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "payroll",
            row.id,
            "pay",
            json!({ "paymentDate": payment_date, "netPay": row.net_pay }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn cancel_payroll(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<PayrollNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<payroll::Entity, _>(&txn, parse_uuid(&id)?, "payroll").await?;
        let status = row.status.advance(payroll::Status::Cancelled).api()?;
        let mut active = row.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(&txn, Some(viewer.user_id), "payroll", row.id, "cancel", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn request_bonus(&self, ctx: &Context<'_>, input: BonusInput) -> async_graphql::Result<BonusNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        if input.amount <= 0 {
            return Err(validation_error("amount must be positive"));
        }
        if input.quarter.map_or(false, |q| !(1..=4).contains(&q)) {
            return Err(validation_error("quarter must be between 1 and 4"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = bonus::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            bonus_type: Set(input.bonus_type.into()),
            year: Set(input.year),
            quarter: Set(input.quarter),
            amount: Set(input.amount),
            reason: Set(input.reason),
            status: Set(bonus::Status::Requested),
            approver_id: Set(None),
            approved_at: Set(None),
            payment_date: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "bonus",
            row.id,
            "create",
            json!({ "amount": row.amount, "year": row.year }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn review_bonus(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<BonusNode> {
        move_bonus(ctx, id, bonus::Status::UnderReview, None).await
    }

    async fn approve_bonus(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<BonusNode> {
        move_bonus(ctx, id, bonus::Status::Approved, None).await
    }

    async fn pay_bonus(
        &self,
        ctx: &Context<'_>,
        id: ID,
        payment_date: NaiveDate,
    ) -> async_graphql::Result<BonusNode> {
        move_bonus(ctx, id, bonus::Status::Paid, Some(payment_date)).await
    }

    async fn cancel_bonus(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<BonusNode> {
        move_bonus(ctx, id, bonus::Status::Cancelled, None).await
    }

    async fn create_retirement_pension(
        &self,
        ctx: &Context<'_>,
        input: RetirementPensionInput,
    ) -> async_graphql::Result<RetirementPensionNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        if input.monthly_contribution < 0 || input.total_contribution < 0 {
            return Err(validation_error("contributions cannot be negative"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = retirement_pension::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            pension_type: Set(input.pension_type.into()),
            start_date: Set(input.start_date),
            monthly_contribution: Set(input.monthly_contribution),
            total_contribution: Set(input.total_contribution),
            payout_amount: Set(None),
            payout_method: Set(input
                .payout_method
                .map(Into::into)
                .unwrap_or(retirement_pension::PayoutMethod::LumpSum)),
            status: Set(retirement_pension::Status::Calculating),
            retirement_date: Set(input.retirement_date),
            payout_date: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "retirement_pension",
            row.id,
            "create",
            json!({ "pensionType": row.pension_type.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Fix the payout from the plan type and total contributions.
    async fn calculate_pension_payout(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<RetirementPensionNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row =
            find_required::<retirement_pension::Entity, _>(&txn, parse_uuid(&id)?, "retirement pension")
                .await?;
        if row.status == retirement_pension::Status::Paid {
            return Err(error_with_code("INVALID_TRANSITION", "pension has already been paid"));
        }
        let payout = row.calculate_payout().api()?;
        let mut active = row.into_active_model();
        active.payout_amount = Set(Some(payout));
        active.status = Set(retirement_pension::Status::Confirmed);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "retirement_pension",
            row.id,
            "calculate",
            json!({ "payoutAmount": payout }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn mark_pension_paid(
        &self,
        ctx: &Context<'_>,
        id: ID,
        payout_date: NaiveDate,
    ) -> async_graphql::Result<RetirementPensionNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row =
            find_required::<retirement_pension::Entity, _>(&txn, parse_uuid(&id)?, "retirement pension")
                .await?;
        if row.status != retirement_pension::Status::Confirmed {
            return Err(error_with_code(
                "INVALID_TRANSITION",
                format!("pension cannot move from {} to PAID", row.status.to_value()),
            ));
        }
        let mut active = row.into_active_model();
        active.status = Set(retirement_pension::Status::Paid);
        active.payout_date = Set(Some(payout_date));
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "retirement_pension",
            row.id,
            "pay",
            json!({ "payoutDate": payout_date }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Create or replace the salary sheet for a month.
    async fn record_salary(&self, ctx: &Context<'_>, input: SalaryInput) -> async_graphql::Result<SalaryNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        month_bounds(input.year, input.month)?;
        let parts = [
            input.base_salary,
            input.overtime_pay.unwrap_or(Decimal::ZERO),
            input.meal_allowance.unwrap_or(Decimal::ZERO),
            input.childcare_allowance.unwrap_or(Decimal::ZERO),
            input.car_allowance.unwrap_or(Decimal::ZERO),
        ];
        if parts.iter().any(Decimal::is_sign_negative) {
            return Err(validation_error("salary components cannot be negative"));
        }
        let [base, overtime, meal, childcare, car] = parts;
        SalarySheet {
            base_salary: base,
            overtime_pay: overtime,
            meal_allowance: meal,
            childcare_allowance: childcare,
            car_allowance: car,
        }
        .total()
        .api()?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let existing = salary::Entity::find()
            .filter(salary::Column::EmployeeId.eq(employee_id))
            .filter(salary::Column::Year.eq(input.year))
            .filter(salary::Column::Month.eq(input.month))
            .one(&txn)
            .await
            .api()?;
        let at = now();
        let is_new = existing.is_none();
        let mut active = match existing {
            Some(row) => row.into_active_model(),
            None => salary::ActiveModel {
                id: Set(Uuid::new_v4()),
                employee_id: Set(employee_id),
                year: Set(input.year),
                month: Set(input.month),
                total_salary: Set(Decimal::ZERO),
                created_at: Set(at),
                ..Default::default()
            },
        };
        active.base_salary = Set(base);
        active.overtime_pay = Set(overtime);
        active.meal_allowance = Set(meal);
        active.childcare_allowance = Set(childcare);
        active.car_allowance = Set(car);
        active.updated_at = Set(at);
        let row = if is_new {
            active.insert(&txn).await.api()?
        } else {
            active.update(&txn).await.api()?
        };
        record_audit(
            &txn,
            Some(viewer.user_id),
            "salary",
            row.id,
            if is_new { "create" } else { "update" },
            json!({ "totalSalary": row.total_salary.to_string() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }
}

async fn move_bonus(
    ctx: &Context<'_>,
    id: ID,
    next: bonus::Status,
    payment_date: Option<NaiveDate>,
) -> async_graphql::Result<BonusNode> {
    let viewer = require_management(ctx)?;
    let db = database(ctx)?;
    let txn = db.begin().await.api()?;
    let row = find_required::<bonus::Entity, _>(&txn, parse_uuid(&id)?, "bonus").await?;
    let status = row.status.advance(next).api()?;
    let mut active = row.into_active_model();
    active.status = Set(status);
    if status == bonus::Status::Approved {
        active.approver_id = Set(Some(viewer.user_id));
        active.approved_at = Set(Some(now()));
    }
    if let Some(date) = payment_date {
        active.payment_date = Set(Some(date));
    }
    active.updated_at = Set(now());
    let row = active.update(&txn).await.api()?;
    record_audit(
        &txn,
        Some(viewer.user_id),
        "bonus",
        row.id,
        "transition",
        json!({ "status": status.to_value() }),
    )
    .await
    .api()?;
    txn.commit().await.api()?;
    Ok(row.into())
}

/// First and last calendar day of a pay month.
fn month_bounds(year: i32, month: i32) -> async_graphql::Result<(NaiveDate, NaiveDate)> {
    let first = u32::try_from(month)
        .ok()
        .and_then(|m| NaiveDate::from_ymd_opt(year, m, 1))
        .ok_or_else(|| validation_error("month must be between 1 and 12"))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| validation_error("year is out of range"))?;
    Ok((first, last))
}

async fn allowance_rules<C: ConnectionTrait>(
    conn: &C,
    codes: Option<&[String]>,
) -> async_graphql::Result<Vec<products_hr::payroll::AllowanceRule>> {
    let mut query = allowance::Entity::find().filter(allowance::Column::IsActive.eq(true));
    query = match codes {
        Some(codes) => query.filter(allowance::Column::Code.is_in(codes.iter().cloned())),
        None => query.filter(allowance::Column::IsMandatory.eq(true)),
    };
    let rows = query
        .order_by_asc(allowance::Column::Code)
        .all(conn)
        .await
        .api()?;
    if let Some(codes) = codes {
        if let Some(unknown) = codes.iter().find(|c| !rows.iter().any(|r| &r.code == *c)) {
            return Err(validation_error(format!("Unknown allowance code {}", unknown)));
        }
    }
    Ok(rows.iter().map(allowance::Model::rule).collect())
}

async fn deduction_rules<C: ConnectionTrait>(
    conn: &C,
    codes: Option<&[String]>,
) -> async_graphql::Result<Vec<products_hr::payroll::DeductionRule>> {
    let mut query = deduction::Entity::find().filter(deduction::Column::IsActive.eq(true));
    query = match codes {
        Some(codes) => query.filter(deduction::Column::Code.is_in(codes.iter().cloned())),
        None => query.filter(deduction::Column::IsMandatory.eq(true)),
    };
    let rows = query
        .order_by_asc(deduction::Column::Code)
        .all(conn)
        .await
        .api()?;
    if let Some(codes) = codes {
        if let Some(unknown) = codes.iter().find(|c| !rows.iter().any(|r| &r.code == *c)) {
            return Err(validation_error(format!("Unknown deduction code {}", unknown)));
        }
    }
    Ok(rows.iter().map(deduction::Model::rule).collect())
}

/// Days with a check-in and the overtime logged between `from` and `to`.
async fn work_summary<C: ConnectionTrait>(
    conn: &C,
    employee_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> async_graphql::Result<WorkSummary> {
    let rows = attendance::Entity::find()
        .filter(attendance::Column::EmployeeId.eq(employee_id))
        .filter(attendance::Column::Date.between(from, to))
        .all(conn)
        .await
        .api()?;
    Ok(WorkSummary {
        days_worked: rows.iter().filter(|r| r.check_in_time.is_some()).count() as i64,
        overtime_hours: rows.iter().map(|r| r.overtime_hours).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn month_bounds_cover_the_whole_month() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let (_, december) = month_bounds(2025, 12).unwrap();
        assert_eq!(december.day(), 31);
        assert!(month_bounds(2025, 13).is_err());
        assert!(month_bounds(2025, 0).is_err());
    }
}
