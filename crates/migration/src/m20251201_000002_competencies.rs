use entity::{
    certification, education, emergency_contact, employee_certification, employee_skill, skill,
    work_experience,
};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, unique_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, skill::Entity).await?;
        create_entity_table(manager, certification::Entity).await?;
        create_entity_table(manager, employee_skill::Entity).await?;
        create_entity_table(manager, employee_certification::Entity).await?;
        create_entity_table(manager, work_experience::Entity).await?;
        create_entity_table(manager, education::Entity).await?;
        create_entity_table(manager, emergency_contact::Entity).await?;

        unique_index(
            manager,
            "uq_certification_name_issuer",
            certification::Entity,
            [certification::Column::Name, certification::Column::Issuer],
        )
        .await?;
        unique_index(
            manager,
            "uq_employee_skill",
            employee_skill::Entity,
            [
                employee_skill::Column::EmployeeId,
                employee_skill::Column::SkillId,
            ],
        )
        .await?;
        unique_index(
            manager,
            "uq_employee_certification",
            employee_certification::Entity,
            [
                employee_certification::Column::EmployeeId,
                employee_certification::Column::CertificationId,
                employee_certification::Column::CertificateNumber,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, emergency_contact::Entity).await?;
        drop_entity_table(manager, education::Entity).await?;
        drop_entity_table(manager, work_experience::Entity).await?;
        drop_entity_table(manager, employee_certification::Entity).await?;
        drop_entity_table(manager, employee_skill::Entity).await?;
        drop_entity_table(manager, certification::Entity).await?;
        drop_entity_table(manager, skill::Entity).await
    }
}
