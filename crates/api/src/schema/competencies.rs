use async_graphql::{ComplexObject, Context, InputObject, Object, SimpleObject, ID};
use chrono::NaiveDate;
use entity::{
    certification, education, emergency_contact, employee_certification, employee_skill, skill,
    work_experience,
};
use platform_api::ResultExt;
use products_hr::calendar::ensure_ordered;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::enums::{Degree, EducationStatus, Proficiency, SkillCategory};
use super::people::required_text;
use super::{
    current_user, database, error_with_code, find_employee, find_required, now, parse_uuid,
    record_audit, require_management, subject_employee, to_id, today, validation_error,
};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Skill")]
pub struct SkillNode {
    pub id: ID,
    pub name: String,
    pub category: SkillCategory,
    pub description: Option<String>,
}

impl From<skill::Model> for SkillNode {
    fn from(model: skill::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            category: model.category.into(),
            description: model.description,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Certification")]
pub struct CertificationNode {
    pub id: ID,
    pub name: String,
    pub issuer: String,
    pub description: Option<String>,
    pub validity_months: Option<i32>,
}

impl From<certification::Model> for CertificationNode {
    fn from(model: certification::Model) -> Self {
        Self {
            id: to_id(model.id),
            name: model.name,
            issuer: model.issuer,
            description: model.description,
            validity_months: model.validity_months,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EmployeeSkill")]
pub struct EmployeeSkillNode {
    pub id: ID,
    pub employee_id: ID,
    pub skill_id: ID,
    pub proficiency: Proficiency,
    pub years_of_experience: i32,
    pub obtained_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl From<employee_skill::Model> for EmployeeSkillNode {
    fn from(model: employee_skill::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            skill_id: to_id(model.skill_id),
            proficiency: model.proficiency.into(),
            years_of_experience: model.years_of_experience,
            obtained_date: model.obtained_date,
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EmployeeCertification", complex)]
pub struct EmployeeCertificationNode {
    pub id: ID,
    pub employee_id: ID,
    pub certification_id: ID,
    pub certificate_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub attachment: Option<String>,
}

impl From<employee_certification::Model> for EmployeeCertificationNode {
    fn from(model: employee_certification::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            certification_id: to_id(model.certification_id),
            certificate_number: model.certificate_number,
            issue_date: model.issue_date,
            expiry_date: model.expiry_date,
            attachment: model.attachment,
        }
    }
}

#[ComplexObject]
impl EmployeeCertificationNode {
    async fn is_expired(&self, ctx: &Context<'_>) -> bool {
        let today = today(ctx);
        self.expiry_date.map_or(false, |expiry| expiry < today)
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "WorkExperience", complex)]
pub struct WorkExperienceNode {
    pub id: ID,
    pub employee_id: ID,
    pub company_name: String,
    pub position: String,
    pub department: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl From<work_experience::Model> for WorkExperienceNode {
    fn from(model: work_experience::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            company_name: model.company_name,
            position: model.position,
            department: model.department,
            start_date: model.start_date,
            end_date: model.end_date,
            description: model.description,
        }
    }
}

#[ComplexObject]
impl WorkExperienceNode {
    async fn duration_months(&self, ctx: &Context<'_>) -> i32 {
        products_hr::calendar::duration_months(self.start_date, self.end_date, today(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Education")]
pub struct EducationNode {
    pub id: ID,
    pub employee_id: ID,
    pub school_name: String,
    pub major: Option<String>,
    pub degree: Degree,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub gpa: Option<Decimal>,
    pub status: EducationStatus,
}

impl From<education::Model> for EducationNode {
    fn from(model: education::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            school_name: model.school_name,
            major: model.major,
            degree: model.degree.into(),
            start_date: model.start_date,
            end_date: model.end_date,
            gpa: model.gpa,
            status: model.status.into(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "EmergencyContact")]
pub struct EmergencyContactNode {
    pub id: ID,
    pub employee_id: ID,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_primary: bool,
}

impl From<emergency_contact::Model> for EmergencyContactNode {
    fn from(model: emergency_contact::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            name: model.name,
            relationship: model.relationship,
            phone: model.phone,
            email: model.email,
            address: model.address,
            is_primary: model.is_primary,
        }
    }
}

#[derive(InputObject, Clone)]
pub struct NewSkillInput {
    pub name: String,
    pub category: SkillCategory,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct NewCertificationInput {
    pub name: String,
    pub issuer: String,
    pub description: Option<String>,
    pub validity_months: Option<i32>,
}

#[derive(InputObject, Clone)]
pub struct EmployeeSkillInput {
    pub employee_id: Option<ID>,
    pub skill_id: ID,
    pub proficiency: Proficiency,
    pub years_of_experience: Option<i32>,
    pub obtained_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct EmployeeCertificationInput {
    pub employee_id: Option<ID>,
    pub certification_id: ID,
    pub certificate_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub attachment: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct WorkExperienceInput {
    pub employee_id: Option<ID>,
    pub company_name: String,
    pub position: String,
    pub department: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct EducationInput {
    pub employee_id: Option<ID>,
    pub school_name: String,
    pub major: Option<String>,
    pub degree: Degree,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub gpa: Option<Decimal>,
    pub status: EducationStatus,
}

#[derive(InputObject, Clone)]
pub struct EmergencyContactInput {
    pub employee_id: Option<ID>,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_primary: Option<bool>,
}

#[derive(Default)]
pub struct CompetencyQuery;

#[Object]
impl CompetencyQuery {
    async fn skills(
        &self,
        ctx: &Context<'_>,
        category: Option<SkillCategory>,
    ) -> async_graphql::Result<Vec<SkillNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = skill::Entity::find();
        if let Some(category) = category {
            query = query.filter(skill::Column::Category.eq(skill::Category::from(category)));
        }
        let rows = query
            .order_by_asc(skill::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(SkillNode::from).collect())
    }

    async fn certifications(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CertificationNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let rows = certification::Entity::find()
            .order_by_asc(certification::Column::Name)
            .order_by_asc(certification::Column::Issuer)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(CertificationNode::from).collect())
    }

    async fn employee_skills(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<EmployeeSkillNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = employee_skill::Entity::find()
            .filter(employee_skill::Column::EmployeeId.eq(employee_id))
            .order_by_desc(employee_skill::Column::YearsOfExperience)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EmployeeSkillNode::from).collect())
    }

    async fn employee_certifications(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<EmployeeCertificationNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = employee_certification::Entity::find()
            .filter(employee_certification::Column::EmployeeId.eq(employee_id))
            .order_by_desc(employee_certification::Column::IssueDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EmployeeCertificationNode::from).collect())
    }

    async fn work_experiences(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<WorkExperienceNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = work_experience::Entity::find()
            .filter(work_experience::Column::EmployeeId.eq(employee_id))
            .order_by_desc(work_experience::Column::StartDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(WorkExperienceNode::from).collect())
    }

    async fn educations(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<EducationNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = education::Entity::find()
            .filter(education::Column::EmployeeId.eq(employee_id))
            .order_by_desc(education::Column::EndDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EducationNode::from).collect())
    }

    async fn emergency_contacts(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<EmergencyContactNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = emergency_contact::Entity::find()
            .filter(emergency_contact::Column::EmployeeId.eq(employee_id))
            .order_by_desc(emergency_contact::Column::IsPrimary)
            .order_by_asc(emergency_contact::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(EmergencyContactNode::from).collect())
    }
}

#[derive(Default)]
pub struct CompetencyMutation;

#[Object]
impl CompetencyMutation {
    async fn create_skill(
        &self,
        ctx: &Context<'_>,
        input: NewSkillInput,
    ) -> async_graphql::Result<SkillNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let name = required_text("name", &input.name)?;
        let txn = db.begin().await.api()?;
        let taken = skill::Entity::find()
            .filter(skill::Column::Name.eq(name.clone()))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Skill already exists"));
        }
        let at = now();
        let skill = skill::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            category: Set(input.category.into()),
            description: Set(input.description),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(&txn, Some(viewer.user_id), "skill", skill.id, "create", json!({ "name": skill.name }))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(skill.into())
    }

    async fn create_certification(
        &self,
        ctx: &Context<'_>,
        input: NewCertificationInput,
    ) -> async_graphql::Result<CertificationNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let name = required_text("name", &input.name)?;
        let issuer = required_text("issuer", &input.issuer)?;
        if input.validity_months.map_or(false, |m| m < 1) {
            return Err(validation_error("validityMonths must be positive"));
        }
        let txn = db.begin().await.api()?;
        let taken = certification::Entity::find()
            .filter(certification::Column::Name.eq(name.clone()))
            .filter(certification::Column::Issuer.eq(issuer.clone()))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code(
                "CONFLICT",
                "Certification already exists for this issuer",
            ));
        }
        let at = now();
        let certification = certification::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            issuer: Set(issuer),
            description: Set(input.description),
            validity_months: Set(input.validity_months),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "certification",
            certification.id,
            "create",
            json!({ "name": certification.name, "issuer": certification.issuer }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(certification.into())
    }

    async fn add_employee_skill(
        &self,
        ctx: &Context<'_>,
        input: EmployeeSkillInput,
    ) -> async_graphql::Result<EmployeeSkillNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let skill_id = parse_uuid(&input.skill_id)?;
        let years = input.years_of_experience.unwrap_or(0);
        if years < 0 {
            return Err(validation_error("yearsOfExperience cannot be negative"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        find_required::<skill::Entity, _>(&txn, skill_id, "skill").await?;
        let taken = employee_skill::Entity::find()
            .filter(employee_skill::Column::EmployeeId.eq(employee_id))
            .filter(employee_skill::Column::SkillId.eq(skill_id))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Skill already recorded for this employee"));
        }
        let at = now();
        let row = employee_skill::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            skill_id: Set(skill_id),
            proficiency: Set(input.proficiency.into()),
            years_of_experience: Set(years),
            obtained_date: Set(input.obtained_date),
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
            "employee_skill",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "skillId": skill_id }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn add_employee_certification(
        &self,
        ctx: &Context<'_>,
        input: EmployeeCertificationInput,
    ) -> async_graphql::Result<EmployeeCertificationNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let certification_id = parse_uuid(&input.certification_id)?;
        let number = required_text("certificateNumber", &input.certificate_number)?;
        if let Some(expiry) = input.expiry_date {
            ensure_ordered(input.issue_date, expiry).api()?;
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        find_required::<certification::Entity, _>(&txn, certification_id, "certification").await?;
        let taken = employee_certification::Entity::find()
            .filter(employee_certification::Column::EmployeeId.eq(employee_id))
            .filter(employee_certification::Column::CertificationId.eq(certification_id))
            .filter(employee_certification::Column::CertificateNumber.eq(number.clone()))
            .one(&txn)
            .await
            .api()?;
        if taken.is_some() {
            return Err(error_with_code("CONFLICT", "Certificate already recorded"));
        }
        let at = now();
        let row = employee_certification::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            certification_id: Set(certification_id),
            certificate_number: Set(number),
            issue_date: Set(input.issue_date),
            expiry_date: Set(input.expiry_date),
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
            "employee_certification",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "certificationId": certification_id }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn add_work_experience(
        &self,
        ctx: &Context<'_>,
        input: WorkExperienceInput,
    ) -> async_graphql::Result<WorkExperienceNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        if let Some(end) = input.end_date {
            ensure_ordered(input.start_date, end).api()?;
        }
        let company_name = required_text("companyName", &input.company_name)?;
        let position = required_text("position", &input.position)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = work_experience::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            company_name: Set(company_name),
            position: Set(position),
            department: Set(input.department),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
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
            "work_experience",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "company": row.company_name }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn add_education(
        &self,
        ctx: &Context<'_>,
        input: EducationInput,
    ) -> async_graphql::Result<EducationNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            ensure_ordered(start, end).api()?;
        }
        if input.gpa.map_or(false, |gpa| gpa.is_sign_negative()) {
            return Err(validation_error("gpa cannot be negative"));
        }
        let school_name = required_text("schoolName", &input.school_name)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = education::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            school_name: Set(school_name),
            major: Set(input.major),
            degree: Set(input.degree.into()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            gpa: Set(input.gpa),
            status: Set(input.status.into()),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "education",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "school": row.school_name }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// A new primary contact takes the flag from the employee's other contacts.
    async fn add_emergency_contact(
        &self,
        ctx: &Context<'_>,
        input: EmergencyContactInput,
    ) -> async_graphql::Result<EmergencyContactNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let name = required_text("name", &input.name)?;
        let relationship = required_text("relationship", &input.relationship)?;
        let phone = required_text("phone", &input.phone)?;
        let is_primary = input.is_primary.unwrap_or(false);
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        if is_primary {
            emergency_contact::Entity::update_many()
                .col_expr(emergency_contact::Column::IsPrimary, Expr::value(false))
                .col_expr(emergency_contact::Column::UpdatedAt, Expr::value(now()))
                .filter(emergency_contact::Column::EmployeeId.eq(employee_id))
                .filter(emergency_contact::Column::IsPrimary.eq(true))
                .exec(&txn)
                .await
                .api()?;
        }
        let at = now();
        let row = emergency_contact::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            name: Set(name),
            relationship: Set(relationship),
            phone: Set(phone),
            email: Set(input.email),
            address: Set(input.address),
            is_primary: Set(is_primary),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "emergency_contact",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "isPrimary": is_primary }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }
}
