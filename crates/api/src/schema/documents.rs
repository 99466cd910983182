use std::collections::HashMap;

use async_graphql::{ComplexObject, Context, InputObject, Json, Object, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use entity::workflow::Workflow;
use entity::{certificate, contract, document_request, document_template, training_record, user};
use platform_api::ResultExt;
use products_hr::calendar::ensure_ordered;
use products_hr::template::render_template;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::enums::{
    CertificateType, CompletionStatus, ContractStatus, ContractType, DocumentStatus, DocumentType,
    TrainingType,
};
use super::people::required_text;
use super::{
    current_user, database, ensure_self_or_management, error_with_code, find_employee,
    find_required, now, parse_uuid, record_audit, require_management, subject_employee, to_id,
    today, utc, validation_error,
};
use crate::auth::CurrentUser;

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "DocumentTemplate")]
pub struct DocumentTemplateNode {
    pub id: ID,
    pub name: String,
    pub document_type: DocumentType,
    pub content: String,
    pub variables: Vec<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub requires_approval: bool,
}

impl From<document_template::Model> for DocumentTemplateNode {
    fn from(model: document_template::Model) -> Self {
        Self {
            id: to_id(model.id),
            variables: model.declared_variables(),
            name: model.name,
            document_type: model.document_type.into(),
            content: model.content,
            is_active: model.is_active,
            is_default: model.is_default,
            requires_approval: model.requires_approval,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "DocumentRequest")]
pub struct DocumentRequestNode {
    pub id: ID,
    pub employee_id: ID,
    pub document_type: DocumentType,
    pub title: String,
    pub purpose: String,
    pub quantity: i32,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub additional_info: Json<Value>,
    pub status: DocumentStatus,
    pub is_approved: bool,
    pub is_completed: bool,
    pub approver_id: Option<ID>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub issued_by: Option<ID>,
    pub issued_at: Option<DateTime<Utc>>,
    pub rendered_content: Option<String>,
    pub document_file: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<document_request::Model> for DocumentRequestNode {
    fn from(model: document_request::Model) -> Self {
        Self {
            id: to_id(model.id),
            is_approved: model.is_approved(),
            is_completed: model.is_completed(),
            employee_id: to_id(model.employee_id),
            document_type: model.document_type.into(),
            title: model.title,
            purpose: model.purpose,
            quantity: model.quantity,
            period_start: model.period_start,
            period_end: model.period_end,
            additional_info: Json(model.additional_info),
            status: model.status.into(),
            approver_id: model.approver_id.map(to_id),
            approved_at: model.approved_at.map(utc),
            rejection_reason: model.rejection_reason,
            issued_by: model.issued_by.map(to_id),
            issued_at: model.issued_at.map(utc),
            rendered_content: model.rendered_content,
            document_file: model.document_file,
            received_at: model.received_at.map(utc),
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Certificate", complex)]
pub struct CertificateNode {
    pub id: ID,
    pub employee_id: ID,
    pub certificate_type: CertificateType,
    pub name: String,
    pub issuer: String,
    pub certificate_number: Option<String>,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub attachment: Option<String>,
    pub is_verified: bool,
    pub verified_by: Option<ID>,
    pub verified_at: Option<DateTime<Utc>>,
    #[graphql(skip)]
    model: certificate::Model,
}

impl From<certificate::Model> for CertificateNode {
    fn from(model: certificate::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            certificate_type: model.certificate_type.into(),
            name: model.name.clone(),
            issuer: model.issuer.clone(),
            certificate_number: model.certificate_number.clone(),
            issue_date: model.issue_date,
            expiry_date: model.expiry_date,
            attachment: model.attachment.clone(),
            is_verified: model.is_verified,
            verified_by: model.verified_by.map(to_id),
            verified_at: model.verified_at.map(utc),
            model,
        }
    }
}

#[ComplexObject]
impl CertificateNode {
    async fn is_expired(&self, ctx: &Context<'_>) -> bool {
        self.model.is_expired(today(ctx))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "TrainingRecord")]
pub struct TrainingRecordNode {
    pub id: ID,
    pub employee_id: ID,
    pub training_type: TrainingType,
    pub title: String,
    pub provider: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    pub hours: Decimal,
    pub training_cost: i64,
    pub company_cost: i64,
    pub personal_cost: i64,
    pub completion_status: CompletionStatus,
    pub satisfaction_rating: Option<i32>,
    pub effectiveness_rating: Option<i32>,
    pub certificate_file: Option<String>,
    pub is_approved: bool,
    pub approved_by: Option<ID>,
    pub approved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<training_record::Model> for TrainingRecordNode {
    fn from(model: training_record::Model) -> Self {
        Self {
            id: to_id(model.id),
            duration_days: model.duration_days(),
            employee_id: to_id(model.employee_id),
            training_type: model.training_type.into(),
            title: model.title,
            provider: model.provider,
            start_date: model.start_date,
            end_date: model.end_date,
            hours: model.hours,
            training_cost: model.training_cost,
            company_cost: model.company_cost,
            personal_cost: model.personal_cost,
            completion_status: model.completion_status.into(),
            satisfaction_rating: model.satisfaction_rating,
            effectiveness_rating: model.effectiveness_rating,
            certificate_file: model.certificate_file,
            is_approved: model.is_approved,
            approved_by: model.approved_by.map(to_id),
            approved_at: model.approved_at.map(utc),
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Contract", complex)]
pub struct ContractNode {
    pub id: ID,
    pub employee_id: ID,
    pub contract_type: ContractType,
    pub title: String,
    pub counterparty: String,
    pub content: Option<String>,
    pub key_terms: Json<Value>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub contract_amount: Option<i64>,
    pub employee_signature: Option<String>,
    pub company_signature: Option<String>,
    pub status: ContractStatus,
    pub signed_at: Option<DateTime<Utc>>,
    #[graphql(skip)]
    model: contract::Model,
}

impl From<contract::Model> for ContractNode {
    fn from(model: contract::Model) -> Self {
        Self {
            id: to_id(model.id),
            employee_id: to_id(model.employee_id),
            contract_type: model.contract_type.into(),
            title: model.title.clone(),
            counterparty: model.counterparty.clone(),
            content: model.content.clone(),
            key_terms: Json(model.key_terms.clone()),
            start_date: model.start_date,
            end_date: model.end_date,
            contract_amount: model.contract_amount,
            employee_signature: model.employee_signature.clone(),
            company_signature: model.company_signature.clone(),
            status: model.status.into(),
            signed_at: model.signed_at.map(utc),
            model,
        }
    }
}

#[ComplexObject]
impl ContractNode {
    /// Within its term on the office calendar.
    async fn is_active(&self, ctx: &Context<'_>) -> bool {
        self.model.is_active(today(ctx))
    }

    async fn is_fully_signed(&self) -> bool {
        self.model.is_fully_signed()
    }
}

#[derive(InputObject, Clone)]
pub struct DocumentTemplateInput {
    pub name: String,
    pub document_type: DocumentType,
    pub content: String,
    pub variables: Option<Vec<String>>,
    pub is_default: Option<bool>,
    pub requires_approval: Option<bool>,
}

#[derive(InputObject, Clone)]
pub struct DocumentRequestInput {
    pub employee_id: Option<ID>,
    pub document_type: DocumentType,
    pub title: String,
    pub purpose: String,
    pub quantity: Option<i32>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub additional_info: Option<Json<Value>>,
}

#[derive(InputObject, Clone)]
pub struct CertificateInput {
    pub employee_id: Option<ID>,
    pub certificate_type: CertificateType,
    pub name: String,
    pub issuer: String,
    pub certificate_number: Option<String>,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub attachment: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct TrainingRecordInput {
    pub employee_id: Option<ID>,
    pub training_type: TrainingType,
    pub title: String,
    pub provider: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Option<Decimal>,
    pub training_cost: Option<i64>,
    pub company_cost: Option<i64>,
    pub personal_cost: Option<i64>,
    pub completion_status: Option<CompletionStatus>,
    pub satisfaction_rating: Option<i32>,
    pub effectiveness_rating: Option<i32>,
    pub certificate_file: Option<String>,
    pub notes: Option<String>,
}

#[derive(InputObject, Clone)]
pub struct ContractInput {
    pub employee_id: ID,
    pub contract_type: ContractType,
    pub title: String,
    pub counterparty: String,
    pub content: Option<String>,
    pub key_terms: Option<Json<Value>>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub contract_amount: Option<i64>,
}

#[derive(Default)]
pub struct DocumentQuery;

#[Object]
impl DocumentQuery {
    async fn document_templates(
        &self,
        ctx: &Context<'_>,
        document_type: Option<DocumentType>,
    ) -> async_graphql::Result<Vec<DocumentTemplateNode>> {
        current_user(ctx)?;
        let db = database(ctx)?;
        let mut query = document_template::Entity::find();
        if let Some(kind) = document_type {
            query = query.filter(
                document_template::Column::DocumentType.eq(document_template::DocumentType::from(kind)),
            );
        }
        let rows = query
            .order_by_asc(document_template::Column::DocumentType)
            .order_by_desc(document_template::Column::IsDefault)
            .order_by_asc(document_template::Column::Name)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(DocumentTemplateNode::from).collect())
    }

    /// Management sees every request unless `employeeId` narrows it.
    async fn document_requests(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
        status: Option<DocumentStatus>,
    ) -> async_graphql::Result<Vec<DocumentRequestNode>> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("hr.documents.requests", viewer = %viewer.user_id);
        async move {
            let mut query = document_request::Entity::find();
            if employee_id.is_some() || !viewer.is_management() {
                let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
                query = query.filter(document_request::Column::EmployeeId.eq(employee_id));
            }
            if let Some(status) = status {
                query = query
                    .filter(document_request::Column::Status.eq(document_request::Status::from(status)));
            }
            let rows = query
                .order_by_desc(document_request::Column::CreatedAt)
                .all(db.as_ref())
                .await
                .api()?;
            Ok(rows.into_iter().map(DocumentRequestNode::from).collect())
        }
        .instrument(span)
        .await
    }

    async fn document_request(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = current_user(ctx)?;
        let db = database(ctx)?;
        let row =
            find_required::<document_request::Entity, _>(db.as_ref(), parse_uuid(&id)?, "document request")
                .await?;
        ensure_self_or_management(&viewer, row.employee_id)?;
        Ok(row.into())
    }

    async fn certificates(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<CertificateNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = certificate::Entity::find()
            .filter(certificate::Column::EmployeeId.eq(employee_id))
            .order_by_desc(certificate::Column::IssueDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(CertificateNode::from).collect())
    }

    async fn training_records(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<TrainingRecordNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = training_record::Entity::find()
            .filter(training_record::Column::EmployeeId.eq(employee_id))
            .order_by_desc(training_record::Column::StartDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(TrainingRecordNode::from).collect())
    }

    async fn contracts(
        &self,
        ctx: &Context<'_>,
        employee_id: Option<ID>,
    ) -> async_graphql::Result<Vec<ContractNode>> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, employee_id.as_ref())?;
        let db = database(ctx)?;
        let rows = contract::Entity::find()
            .filter(contract::Column::EmployeeId.eq(employee_id))
            .order_by_desc(contract::Column::StartDate)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(ContractNode::from).collect())
    }
}

#[derive(Default)]
pub struct DocumentMutation;

#[Object]
impl DocumentMutation {
    /// A new default template demotes the previous default of its type.
    async fn create_document_template(
        &self,
        ctx: &Context<'_>,
        input: DocumentTemplateInput,
    ) -> async_graphql::Result<DocumentTemplateNode> {
        let viewer = require_management(ctx)?;
        let name = required_text("name", &input.name)?;
        let content = required_text("content", &input.content)?;
        let document_type = document_template::DocumentType::from(input.document_type);
        let variables: Vec<String> = input
            .variables
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        let is_default = input.is_default.unwrap_or(false);

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        if is_default {
            document_template::Entity::update_many()
                .col_expr(document_template::Column::IsDefault, Expr::value(false))
                .filter(document_template::Column::DocumentType.eq(document_type))
                .exec(&txn)
                .await
                .api()?;
        }
        let at = now();
        let row = document_template::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            document_type: Set(document_type),
            content: Set(content),
            variables: Set(json!(variables)),
            is_active: Set(true),
            is_default: Set(is_default),
            requires_approval: Set(input.requires_approval.unwrap_or(true)),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "document_template",
            row.id,
            "create",
            json!({ "documentType": document_type.to_value(), "isDefault": is_default }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn request_document(
        &self,
        ctx: &Context<'_>,
        input: DocumentRequestInput,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let title = required_text("title", &input.title)?;
        let purpose = required_text("purpose", &input.purpose)?;
        let quantity = input.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(validation_error("quantity must be at least 1"));
        }
        if let (Some(start), Some(end)) = (input.period_start, input.period_end) {
            ensure_ordered(start, end).api()?;
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = document_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            document_type: Set(input.document_type.into()),
            title: Set(title),
            purpose: Set(purpose),
            quantity: Set(quantity),
            period_start: Set(input.period_start),
            period_end: Set(input.period_end),
            additional_info: Set(input.additional_info.map(|i| i.0).unwrap_or_else(|| json!({}))),
            status: Set(document_request::Status::Requested),
            approver_id: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            issued_by: Set(None),
            issued_at: Set(None),
            rendered_content: Set(None),
            document_file: Set(None),
            received_at: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "document_request",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "documentType": row.document_type.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn review_document_request(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = require_management(ctx)?;
        move_request(ctx, &viewer, id, document_request::Status::UnderReview, None).await
    }

    async fn approve_document_request(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = require_management(ctx)?;
        move_request(ctx, &viewer, id, document_request::Status::Approved, None).await
    }

    async fn reject_document_request(
        &self,
        ctx: &Context<'_>,
        id: ID,
        reason: String,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = require_management(ctx)?;
        let reason = required_text("reason", &reason)?;
        move_request(ctx, &viewer, id, document_request::Status::Rejected, Some(reason)).await
    }

    /// Render the default template for the request's type and mark it issued.
    async fn issue_document(
        &self,
        ctx: &Context<'_>,
        id: ID,
        document_file: Option<String>,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = require_management(ctx)?;
        let id = parse_uuid(&id)?;
        let db = database(ctx)?;
        let issue_date = today(ctx);
        let span = info_span!("hr.documents.issue", request_id = %id);
        async move {
            let txn = db.begin().await.api()?;
            let request = find_required::<document_request::Entity, _>(&txn, id, "document request").await?;
            let template = default_template(&txn, request.document_type).await?;
            let needs_approval = template.as_ref().map_or(true, |t| t.requires_approval);
            if needs_approval && request.status != document_request::Status::Approved {
                return Err(error_with_code(
                    "INVALID_TRANSITION",
                    "document request must be approved before it is issued",
                ));
            }
            let status = request.status.advance(document_request::Status::Issued).api()?;
            let rendered = match &template {
                Some(template) => {
                    let employee = find_employee(&txn, request.employee_id).await?;
                    let values = document_variables(&employee, &request, issue_date);
                    Some(render_template(&template.content, &template.declared_variables(), &values).api()?)
                }
                None => None,
            };

            let at = now();
            let mut active = request.into_active_model();
            active.status = Set(status);
            active.issued_by = Set(Some(viewer.user_id));
            active.issued_at = Set(Some(at));
            active.rendered_content = Set(rendered);
            active.document_file = Set(document_file);
            active.updated_at = Set(at);
            let request = active.update(&txn).await.api()?;
            record_audit(
                &txn,
                Some(viewer.user_id),
                "document_request",
                request.id,
                "issue",
                json!({ "templateId": template.map(|t| t.id) }),
            )
            .await
            .api()?;
            txn.commit().await.api()?;
            info!("document issued");
            Ok(request.into())
        }
        .instrument(span)
        .await
    }

    async fn mark_document_received(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = current_user(ctx)?;
        move_request(ctx, &viewer, id, document_request::Status::Received, None).await
    }

    async fn cancel_document_request(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<DocumentRequestNode> {
        let viewer = current_user(ctx)?;
        move_request(ctx, &viewer, id, document_request::Status::Cancelled, None).await
    }

    async fn add_certificate(
        &self,
        ctx: &Context<'_>,
        input: CertificateInput,
    ) -> async_graphql::Result<CertificateNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let name = required_text("name", &input.name)?;
        let issuer = required_text("issuer", &input.issuer)?;
        if let Some(expiry) = input.expiry_date {
            ensure_ordered(input.issue_date, expiry).api()?;
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = certificate::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            certificate_type: Set(input.certificate_type.into()),
            name: Set(name),
            issuer: Set(issuer),
            certificate_number: Set(input.certificate_number),
            issue_date: Set(input.issue_date),
            expiry_date: Set(input.expiry_date),
            attachment: Set(input.attachment),
            is_verified: Set(false),
            verified_by: Set(None),
            verified_at: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "certificate",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "name": row.name }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn verify_certificate(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<CertificateNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<certificate::Entity, _>(&txn, parse_uuid(&id)?, "certificate").await?;
        if row.is_verified {
            return Err(error_with_code("CONFLICT", "Certificate is already verified"));
        }
        let at = now();
        let mut active = row.into_active_model();
        active.is_verified = Set(true);
        active.verified_by = Set(Some(viewer.user_id));
        active.verified_at = Set(Some(at));
        active.updated_at = Set(at);
        let row = active.update(&txn).await.api()?;
        record_audit(&txn, Some(viewer.user_id), "certificate", row.id, "verify", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn add_training_record(
        &self,
        ctx: &Context<'_>,
        input: TrainingRecordInput,
    ) -> async_graphql::Result<TrainingRecordNode> {
        let viewer = current_user(ctx)?;
        let employee_id = subject_employee(&viewer, input.employee_id.as_ref())?;
        let title = required_text("title", &input.title)?;
        ensure_ordered(input.start_date, input.end_date).api()?;
        let hours = input.hours.unwrap_or(Decimal::ZERO);
        if hours.is_sign_negative() {
            return Err(validation_error("hours cannot be negative"));
        }
        let training_cost = input.training_cost.unwrap_or(0);
        let company_cost = input.company_cost.unwrap_or(0);
        let personal_cost = input.personal_cost.unwrap_or(0);
        training_record::validate_costs(training_cost, company_cost, personal_cost).api()?;
        training_record::validate_rating("satisfactionRating", input.satisfaction_rating).api()?;
        training_record::validate_rating("effectivenessRating", input.effectiveness_rating).api()?;

        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = training_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            training_type: Set(input.training_type.into()),
            title: Set(title),
            provider: Set(input.provider),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            hours: Set(hours),
            training_cost: Set(training_cost),
            company_cost: Set(company_cost),
            personal_cost: Set(personal_cost),
            completion_status: Set(input
                .completion_status
                .map(Into::into)
                .unwrap_or(training_record::CompletionStatus::Expected)),
            satisfaction_rating: Set(input.satisfaction_rating),
            effectiveness_rating: Set(input.effectiveness_rating),
            certificate_file: Set(input.certificate_file),
            is_approved: Set(false),
            approved_by: Set(None),
            approved_at: Set(None),
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
            "training_record",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "title": row.title }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn approve_training_record(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<TrainingRecordNode> {
        let viewer = require_management(ctx)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<training_record::Entity, _>(&txn, parse_uuid(&id)?, "training record")
            .await?;
        if row.is_approved {
            return Err(error_with_code("CONFLICT", "Training record is already approved"));
        }
        let at = now();
        let mut active = row.into_active_model();
        active.is_approved = Set(true);
        active.approved_by = Set(Some(viewer.user_id));
        active.approved_at = Set(Some(at));
        active.updated_at = Set(at);
        let row = active.update(&txn).await.api()?;
        record_audit(&txn, Some(viewer.user_id), "training_record", row.id, "approve", json!({}))
            .await
            .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn create_contract(
        &self,
        ctx: &Context<'_>,
        input: ContractInput,
    ) -> async_graphql::Result<ContractNode> {
        let viewer = require_management(ctx)?;
        let employee_id = parse_uuid(&input.employee_id)?;
        let title = required_text("title", &input.title)?;
        let counterparty = required_text("counterparty", &input.counterparty)?;
        if let Some(end) = input.end_date {
            ensure_ordered(input.start_date, end).api()?;
        }
        if input.contract_amount.is_some_and(|amount| amount < 0) {
            return Err(validation_error("contractAmount cannot be negative"));
        }
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        find_employee(&txn, employee_id).await?;
        let at = now();
        let row = contract::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_id),
            contract_type: Set(input.contract_type.into()),
            title: Set(title),
            counterparty: Set(counterparty),
            content: Set(input.content),
            key_terms: Set(input.key_terms.map(|t| t.0).unwrap_or_else(|| json!({}))),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            contract_amount: Set(input.contract_amount),
            employee_signature: Set(None),
            company_signature: Set(None),
            status: Set(contract::Status::Draft),
            signed_at: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "contract",
            row.id,
            "create",
            json!({ "employeeId": employee_id, "contractType": row.contract_type.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    /// Store one party's signature; the second one makes the contract SIGNED.
    async fn sign_contract(
        &self,
        ctx: &Context<'_>,
        id: ID,
        signature: String,
        is_employee: bool,
    ) -> async_graphql::Result<ContractNode> {
        let viewer = current_user(ctx)?;
        let signature = required_text("signature", &signature)?;
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<contract::Entity, _>(&txn, parse_uuid(&id)?, "contract").await?;
        if is_employee {
            if !viewer.is_self(row.employee_id) {
                return Err(error_with_code("FORBIDDEN", "Only the employee can sign for the employee"));
            }
        } else if !viewer.is_management() {
            return Err(error_with_code("FORBIDDEN", "Only management can sign for the company"));
        }
        if !matches!(row.status, contract::Status::Draft | contract::Status::UnderReview) {
            return Err(error_with_code(
                "INVALID_TRANSITION",
                format!("cannot sign a contract in status {}", row.status.to_value()),
            ));
        }

        let mut signed = row.clone();
        if is_employee {
            signed.employee_signature = Some(signature.clone());
        } else {
            signed.company_signature = Some(signature.clone());
        }
        let at = now();
        let mut active = row.into_active_model();
        if is_employee {
            active.employee_signature = Set(Some(signature));
        } else {
            active.company_signature = Set(Some(signature));
        }
        if signed.is_fully_signed() {
            active.status = Set(contract::Status::Signed);
            active.signed_at = Set(Some(at));
        }
        active.updated_at = Set(at);
        let row = active.update(&txn).await.api()?;
        let party = if is_employee { "employee" } else { "company" };
        record_audit(
            &txn,
            Some(viewer.user_id),
            "contract",
            row.id,
            "sign",
            json!({ "party": party, "status": row.status.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }

    async fn set_contract_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: ContractStatus,
    ) -> async_graphql::Result<ContractNode> {
        let viewer = require_management(ctx)?;
        let next = contract::Status::from(status);
        let db = database(ctx)?;
        let txn = db.begin().await.api()?;
        let row = find_required::<contract::Entity, _>(&txn, parse_uuid(&id)?, "contract").await?;
        if next == contract::Status::Signed && !row.is_fully_signed() {
            return Err(validation_error("both parties must sign first"));
        }
        let next = row.status.advance(next).api()?;
        let mut active = row.into_active_model();
        active.status = Set(next);
        active.updated_at = Set(now());
        let row = active.update(&txn).await.api()?;
        record_audit(
            &txn,
            Some(viewer.user_id),
            "contract",
            row.id,
            "transition",
            json!({ "status": next.to_value() }),
        )
        .await
        .api()?;
        txn.commit().await.api()?;
        Ok(row.into())
    }
}

/// Shared path for the document request transitions without side effects
/// beyond stamps. Owners may only receive or cancel their own requests.
async fn move_request(
    ctx: &Context<'_>,
    viewer: &CurrentUser,
    id: ID,
    next: document_request::Status,
    reason: Option<String>,
) -> async_graphql::Result<DocumentRequestNode> {
    let db = database(ctx)?;
    let txn = db.begin().await.api()?;
    let row = find_required::<document_request::Entity, _>(&txn, parse_uuid(&id)?, "document request")
        .await?;
    ensure_self_or_management(viewer, row.employee_id)?;
    let status = row.status.advance(next).api()?;
    let at = now();
    let mut active = row.into_active_model();
    active.status = Set(status);
    match status {
        document_request::Status::Approved => {
            active.approver_id = Set(Some(viewer.user_id));
            active.approved_at = Set(Some(at));
        }
        document_request::Status::Rejected => {
            active.approver_id = Set(Some(viewer.user_id));
            active.approved_at = Set(Some(at));
            active.rejection_reason = Set(reason);
        }
        document_request::Status::Received => {
            active.received_at = Set(Some(at));
        }
        _ => {}
    }
    active.updated_at = Set(at);
    let row = active.update(&txn).await.api()?;
    record_audit(
        &txn,
        Some(viewer.user_id),
        "document_request",
        row.id,
        "transition",
        json!({ "status": status.to_value(), "reason": row.rejection_reason }),
    )
    .await
    .api()?;
    txn.commit().await.api()?;
    Ok(row.into())
}

async fn default_template<C: ConnectionTrait>(
    conn: &C,
    document_type: document_template::DocumentType,
) -> async_graphql::Result<Option<document_template::Model>> {
    document_template::Entity::find()
        .filter(document_template::Column::DocumentType.eq(document_type))
        .filter(document_template::Column::IsActive.eq(true))
        .filter(document_template::Column::IsDefault.eq(true))
        .one(conn)
        .await
        .api()
}

fn document_variables(
    employee: &user::Model,
    request: &document_request::Model,
    issue_date: NaiveDate,
) -> HashMap<String, String> {
    let date = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
    HashMap::from([
        ("employee_name".to_string(), employee.full_name()),
        ("employee_id".to_string(), employee.employee_id.clone().unwrap_or_default()),
        ("department".to_string(), employee.department.clone().unwrap_or_default()),
        ("position".to_string(), employee.position.clone().unwrap_or_default()),
        ("hire_date".to_string(), employee.hire_date.map(date).unwrap_or_default()),
        ("issue_date".to_string(), date(issue_date)),
        ("purpose".to_string(), request.purpose.clone()),
    ])
}
