use async_graphql::{Context, Json, Object, SimpleObject, ID};
use chrono::{DateTime, Utc};
use entity::audit_entry;
use platform_api::ResultExt;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::Value;

use super::{database, page, parse_uuid, require_management, to_id, utc};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "AuditEntry")]
pub struct AuditEntryNode {
    pub id: ID,
    pub entity_type: String,
    pub entity_id: ID,
    pub action: String,
    pub actor_id: Option<ID>,
    pub changes: Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_entry::Model> for AuditEntryNode {
    fn from(model: audit_entry::Model) -> Self {
        Self {
            id: to_id(model.id),
            entity_type: model.entity_type,
            entity_id: to_id(model.entity_id),
            action: model.action,
            actor_id: model.actor_id.map(to_id),
            changes: Json(model.changes),
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Default)]
pub struct AuditQuery;

#[Object]
impl AuditQuery {
    /// History of one record, newest first.
    async fn audit_trail(
        &self,
        ctx: &Context<'_>,
        entity_type: String,
        entity_id: ID,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<AuditEntryNode>> {
        require_management(ctx)?;
        let entity_id = parse_uuid(&entity_id)?;
        let (limit, offset) = page(first, offset)?;
        let db = database(ctx)?;
        let rows = audit_entry::Entity::find()
            .filter(audit_entry::Column::EntityType.eq(entity_type.trim()))
            .filter(audit_entry::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_entry::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(db.as_ref())
            .await
            .api()?;
        Ok(rows.into_iter().map(AuditEntryNode::from).collect())
    }
}
