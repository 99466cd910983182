use entity::{certificate, contract, document_request, document_template, training_record};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, document_template::Entity).await?;
        create_entity_table(manager, document_request::Entity).await?;
        create_entity_table(manager, certificate::Entity).await?;
        create_entity_table(manager, training_record::Entity).await?;
        create_entity_table(manager, contract::Entity).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, contract::Entity).await?;
        drop_entity_table(manager, training_record::Entity).await?;
        drop_entity_table(manager, certificate::Entity).await?;
        drop_entity_table(manager, document_request::Entity).await?;
        drop_entity_table(manager, document_template::Entity).await
    }
}
