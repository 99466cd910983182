use entity::{evaluation, evaluation_period, evaluation_template, feedback, goal, one_on_one_meeting};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, unique_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, evaluation_period::Entity).await?;
        create_entity_table(manager, evaluation_template::Entity).await?;
        create_entity_table(manager, evaluation::Entity).await?;
        create_entity_table(manager, one_on_one_meeting::Entity).await?;
        create_entity_table(manager, feedback::Entity).await?;
        create_entity_table(manager, goal::Entity).await?;

        unique_index(
            manager,
            "uq_evaluation_period_year_type",
            evaluation_period::Entity,
            [
                evaluation_period::Column::Year,
                evaluation_period::Column::PeriodType,
            ],
        )
        .await?;
        unique_index(
            manager,
            "uq_evaluation_employee_evaluator_period",
            evaluation::Entity,
            [
                evaluation::Column::EmployeeId,
                evaluation::Column::EvaluatorId,
                evaluation::Column::PeriodId,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, goal::Entity).await?;
        drop_entity_table(manager, feedback::Entity).await?;
        drop_entity_table(manager, one_on_one_meeting::Entity).await?;
        drop_entity_table(manager, evaluation::Entity).await?;
        drop_entity_table(manager, evaluation_template::Entity).await?;
        drop_entity_table(manager, evaluation_period::Entity).await
    }
}
