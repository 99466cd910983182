use entity::{employee_organization, job_title, organization, organization_change_request, position};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, unique_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, organization::Entity).await?;
        create_entity_table(manager, position::Entity).await?;
        create_entity_table(manager, job_title::Entity).await?;
        create_entity_table(manager, employee_organization::Entity).await?;
        create_entity_table(manager, organization_change_request::Entity).await?;

        unique_index(
            manager,
            "uq_employee_organization_start",
            employee_organization::Entity,
            [
                employee_organization::Column::EmployeeId,
                employee_organization::Column::OrganizationId,
                employee_organization::Column::StartDate,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, organization_change_request::Entity).await?;
        drop_entity_table(manager, employee_organization::Entity).await?;
        drop_entity_table(manager, job_title::Entity).await?;
        drop_entity_table(manager, position::Entity).await?;
        drop_entity_table(manager, organization::Entity).await
    }
}
