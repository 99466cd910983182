use entity::{department, employee_profile, user, user_secret};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, user::Entity).await?;
        create_entity_table(manager, user_secret::Entity).await?;
        create_entity_table(manager, department::Entity).await?;
        create_entity_table(manager, employee_profile::Entity).await?;

        index(
            manager,
            "idx_user_department",
            user::Entity,
            [user::Column::Department],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, employee_profile::Entity).await?;
        drop_entity_table(manager, department::Entity).await?;
        drop_entity_table(manager, user_secret::Entity).await?;
        drop_entity_table(manager, user::Entity).await
    }
}
