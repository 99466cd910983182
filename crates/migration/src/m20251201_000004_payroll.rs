use entity::{allowance, bonus, deduction, payroll, retirement_pension, salary, salary_grade};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, unique_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, salary_grade::Entity).await?;
        create_entity_table(manager, allowance::Entity).await?;
        create_entity_table(manager, deduction::Entity).await?;
        create_entity_table(manager, payroll::Entity).await?;
        create_entity_table(manager, bonus::Entity).await?;
        create_entity_table(manager, retirement_pension::Entity).await?;
        create_entity_table(manager, salary::Entity).await?;

        unique_index(
            manager,
            "uq_payroll_employee_month",
            payroll::Entity,
            [
                payroll::Column::EmployeeId,
                payroll::Column::Year,
                payroll::Column::Month,
            ],
        )
        .await?;
        unique_index(
            manager,
            "uq_salary_employee_month",
            salary::Entity,
            [
                salary::Column::EmployeeId,
                salary::Column::Year,
                salary::Column::Month,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, salary::Entity).await?;
        drop_entity_table(manager, retirement_pension::Entity).await?;
        drop_entity_table(manager, bonus::Entity).await?;
        drop_entity_table(manager, payroll::Entity).await?;
        drop_entity_table(manager, deduction::Entity).await?;
        drop_entity_table(manager, allowance::Entity).await?;
        drop_entity_table(manager, salary_grade::Entity).await
    }
}
