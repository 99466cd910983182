use entity::audit_entry;
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, audit_entry::Entity).await?;
        index(
            manager,
            "idx_audit_entry_subject",
            audit_entry::Entity,
            [
                audit_entry::Column::EntityType,
                audit_entry::Column::EntityId,
                audit_entry::Column::CreatedAt,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, audit_entry::Entity).await
    }
}
