use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_id: Uuid,
    #[sea_orm(indexed)]
    pub recipient_id: Uuid,
    pub feedback_type: FeedbackType,
    pub priority: Priority,
    pub title: String,
    pub content: String,
    pub is_anonymous: bool,
    pub is_read: bool,
    pub read_at: Option<DateTimeWithTimeZone>,
    pub requires_action: bool,
    pub action_taken: Option<String>,
    pub action_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum FeedbackType {
    #[sea_orm(string_value = "PRAISE")]
    Praise,
    #[sea_orm(string_value = "IMPROVEMENT")]
    Improvement,
    #[sea_orm(string_value = "SUGGESTION")]
    Suggestion,
    #[sea_orm(string_value = "CUSTOMER")]
    Customer,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Priority {
    #[sea_orm(string_value = "HIGH")]
    High,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "LOW")]
    Low,
}

impl Model {
    /// Sender as shown to `viewer`; anonymous feedback hides it from everyone
    /// except the sender.
    pub fn visible_sender(&self, viewer: Uuid) -> Option<Uuid> {
        if self.is_anonymous && viewer != self.sender_id {
            None
        } else {
            Some(self.sender_id)
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
