//! Demo data for local development and the integration tests.

use chrono::{NaiveDate, Utc};
use entity::{
    allowance, deduction, document_template, employee_organization, organization, salary_grade,
    user, user_secret,
};
use products_hr::OrgTree;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::hash_password;

pub const DEMO_PASSWORD: &str = "hrdemo-pass";

#[derive(Clone, Debug)]
pub struct SeededHrRecords {
    pub users: Vec<user::Model>,
    pub organizations: Vec<organization::Model>,
    pub salary_grades: Vec<salary_grade::Model>,
    pub allowances: Vec<allowance::Model>,
    pub deductions: Vec<deduction::Model>,
    pub templates: Vec<document_template::Model>,
}

impl SeededHrRecords {
    pub fn user_email(&self, email: &str) -> Option<&user::Model> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn organization_code(&self, code: &str) -> Option<&organization::Model> {
        self.organizations.iter().find(|o| o.code == code)
    }
}

/// Insert a small company: an admin, an HR manager, two employees, a
/// three-level organization, payroll catalogs and an employment certificate
/// template. Refuses to run twice against the same database.
pub async fn seed_hr_demo(db: &DatabaseConnection) -> Result<SeededHrRecords, DbErr> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq("admin@hr.test"))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(DbErr::Custom("demo data is already present".into()));
    }
    let at: DateTimeWithTimeZone = Utc::now().into();

    let admin = insert_seed_user(db, SeedUser::new("admin@hr.test", "Ada", "Admin", "E0001", 2015).admin()).await?;
    let hr = insert_seed_user(db, SeedUser::new("hr@hr.test", "Harper", "Reed", "E0002", 2018).hr_manager())
        .await?;
    let dev = insert_seed_user(db, SeedUser::new("dev@hr.test", "Dana", "Kim", "E0101", 2021)).await?;
    let ops = insert_seed_user(db, SeedUser::new("ops@hr.test", "Omar", "Lee", "E0102", 2024)).await?;

    let company = insert_seed_org(db, "Head Office", "HQ", None, 1, organization::OrganizationType::Division, Some(admin.id)).await?;
    let engineering = insert_seed_org(
        db,
        "Engineering",
        "ENG",
        Some(company.id),
        2,
        organization::OrganizationType::Department,
        Some(hr.id),
    )
    .await?;
    let backend = insert_seed_org(
        db,
        "Backend",
        "ENG-BE",
        Some(engineering.id),
        3,
        organization::OrganizationType::Team,
        Some(dev.id),
    )
    .await?;
    let people_ops = insert_seed_org(
        db,
        "People Operations",
        "POPS",
        Some(company.id),
        2,
        organization::OrganizationType::Department,
        Some(hr.id),
    )
    .await?;

    let placements = [(&dev, &backend), (&ops, &backend), (&hr, &people_ops)];
    for (employee, org) in placements {
        employee_organization::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee.id),
            organization_id: Set(org.id),
            position_id: Set(None),
            job_title_id: Set(None),
            appointment_type: Set(employee_organization::AppointmentType::Hire),
            start_date: Set(employee.hire_date.unwrap_or_else(|| at.date_naive())),
            end_date: Set(None),
            base_salary: Set(None),
            allowances: Set(json!({})),
            is_primary: Set(true),
            is_active: Set(true),
            notes: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(db)
        .await?;
    }
    let placed: Vec<Uuid> = placements.iter().map(|(_, org)| org.id).collect();
    let organizations = recount(db, vec![company, engineering, backend, people_ops], &placed).await?;

    let grades = [("G1", "Associate", 3_000_000, 2_500_000, 3_500_000), ("G2", "Senior", 4_500_000, 4_000_000, 5_500_000)];
    let mut salary_grades = Vec::with_capacity(grades.len());
    for (grade, name, base, min, max) in grades {
        salary_grades.push(
            salary_grade::ActiveModel {
                id: Set(Uuid::new_v4()),
                grade: Set(grade.into()),
                name: Set(name.into()),
                base_salary: Set(base),
                min_salary: Set(min),
                max_salary: Set(max),
                description: Set(None),
                is_active: Set(true),
                created_at: Set(at),
                updated_at: Set(at),
            }
            .insert(db)
            .await?,
        );
    }

    let meal = allowance::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Meal allowance".into()),
        code: Set("MEAL".into()),
        allowance_type: Set(allowance::AllowanceType::Welfare),
        calculation_method: Set(allowance::CalculationMethod::Fixed),
        default_amount: Set(200_000),
        is_taxable: Set(false),
        is_mandatory: Set(true),
        is_active: Set(true),
        description: Set(None),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await?;
    let duty = allowance::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Duty allowance".into()),
        code: Set("DUTY".into()),
        allowance_type: Set(allowance::AllowanceType::Duty),
        calculation_method: Set(allowance::CalculationMethod::Fixed),
        default_amount: Set(150_000),
        is_taxable: Set(true),
        is_mandatory: Set(false),
        is_active: Set(true),
        description: Set(Some("Team leads only".into())),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await?;

    let statutory = [
        ("National pension", "NP", Decimal::new(45, 1)),
        ("Health insurance", "HI", Decimal::new(3545, 3)),
        ("Employment insurance", "EI", Decimal::new(9, 1)),
    ];
    let mut deductions = Vec::with_capacity(statutory.len());
    for (name, code, rate) in statutory {
        deductions.push(
            deduction::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.into()),
                code: Set(code.into()),
                deduction_type: Set(deduction::DeductionType::Statutory),
                calculation_method: Set(deduction::CalculationMethod::Rate),
                rate: Set(rate),
                default_amount: Set(0),
                is_mandatory: Set(true),
                is_active: Set(true),
                description: Set(None),
                created_at: Set(at),
                updated_at: Set(at),
            }
            .insert(db)
            .await?,
        );
    }

    let employment = document_template::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Certificate of employment".into()),
        document_type: Set(document_template::DocumentType::Employment),
        content: Set(concat!(
            "This certifies that {{employee_name}} ({{employee_id}}) of {{department}}, ",
            "working as {{position}} since {{hire_date}}, is employed by the company.\n",
            "Purpose: {{purpose}}\nIssued on {{issue_date}}"
        )
        .into()),
        variables: Set(json!(["employee_name", "employee_id", "department", "position", "hire_date", "issue_date", "purpose"])),
        is_active: Set(true),
        is_default: Set(true),
        requires_approval: Set(false),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await?;

    Ok(SeededHrRecords {
        users: vec![admin, hr, dev, ops],
        organizations,
        salary_grades,
        allowances: vec![meal, duty],
        deductions,
        templates: vec![employment],
    })
}

struct SeedUser {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    employee_id: &'static str,
    hired: i32,
    is_admin: bool,
    is_hr_manager: bool,
}

impl SeedUser {
    fn new(
        email: &'static str,
        first_name: &'static str,
        last_name: &'static str,
        employee_id: &'static str,
        hired: i32,
    ) -> Self {
        Self {
            email,
            first_name,
            last_name,
            employee_id,
            hired,
            is_admin: false,
            is_hr_manager: false,
        }
    }

    fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    fn hr_manager(mut self) -> Self {
        self.is_hr_manager = true;
        self
    }
}

async fn insert_seed_user(db: &DatabaseConnection, seed: SeedUser) -> Result<user::Model, DbErr> {
    let at: DateTimeWithTimeZone = Utc::now().into();
    let department = if seed.is_admin || seed.is_hr_manager { "People Operations" } else { "Engineering" };
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        employee_id: Set(Some(seed.employee_id.into())),
        email: Set(seed.email.into()),
        first_name: Set(seed.first_name.into()),
        last_name: Set(seed.last_name.into()),
        phone: Set(None),
        department: Set(Some(department.into())),
        position: Set(None),
        is_hr_manager: Set(seed.is_hr_manager),
        is_admin: Set(seed.is_admin),
        is_active: Set(true),
        hire_date: Set(NaiveDate::from_ymd_opt(seed.hired, 3, 1)),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await?;
    let hash = hash_password(DEMO_PASSWORD).map_err(|err| DbErr::Custom(err.to_string()))?;
    user_secret::ActiveModel {
        user_id: Set(model.id),
        password_hash: Set(hash),
        updated_at: Set(at),
    }
    .insert(db)
    .await?;
    Ok(model)
}

async fn insert_seed_org(
    db: &DatabaseConnection,
    name: &str,
    code: &str,
    parent_id: Option<Uuid>,
    level: i32,
    kind: organization::OrganizationType,
    manager_id: Option<Uuid>,
) -> Result<organization::Model, DbErr> {
    let at: DateTimeWithTimeZone = Utc::now().into();
    organization::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        code: Set(code.into()),
        parent_id: Set(parent_id),
        level: Set(level),
        organization_type: Set(kind),
        manager_id: Set(manager_id),
        assistant_manager_id: Set(None),
        description: Set(None),
        location: Set(None),
        floor: Set(None),
        phone: Set(None),
        email: Set(None),
        is_active: Set(true),
        employee_count: Set(0),
        established_date: Set(None),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await
}

/// Store each unit's head count, including everyone placed below it.
async fn recount(
    db: &DatabaseConnection,
    orgs: Vec<organization::Model>,
    placed: &[Uuid],
) -> Result<Vec<organization::Model>, DbErr> {
    let tree = OrgTree::new(orgs.iter().map(organization::Model::node));
    let mut out = Vec::with_capacity(orgs.len());
    for org in orgs {
        let subtree = tree.subtree(org.id);
        let count = placed.iter().filter(|id| subtree.contains(id)).count() as i32;
        let mut active: organization::ActiveModel = org.into();
        active.employee_count = Set(count);
        out.push(active.update(db).await?);
    }
    Ok(out)
}
