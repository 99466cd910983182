use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "document_template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(indexed)]
    pub document_type: DocumentType,
    /// Body with `{{variable}}` placeholders.
    pub content: String,
    pub variables: Json,
    pub is_active: bool,
    pub is_default: bool,
    pub requires_approval: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum DocumentType {
    #[sea_orm(string_value = "EMPLOYMENT")]
    Employment,
    #[sea_orm(string_value = "CAREER")]
    Career,
    #[sea_orm(string_value = "RETIREMENT")]
    Retirement,
    #[sea_orm(string_value = "PAY_STUB")]
    PayStub,
    #[sea_orm(string_value = "WITHHOLDING_RECEIPT")]
    WithholdingReceipt,
    #[sea_orm(string_value = "WITHHOLDING_LEDGER")]
    WithholdingLedger,
    #[sea_orm(string_value = "EMPLOYMENT_INSURANCE")]
    EmploymentInsurance,
    #[sea_orm(string_value = "HEALTH_INSURANCE")]
    HealthInsurance,
    #[sea_orm(string_value = "NATIONAL_PENSION")]
    NationalPension,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl Model {
    pub fn declared_variables(&self) -> Vec<String> {
        self.variables
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ActiveModelBehavior for ActiveModel {}
