use entity::{attendance, leave_balance, leave_request, work_schedule};
use sea_orm_migration::prelude::*;

use crate::support::{create_entity_table, drop_entity_table, index, unique_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, attendance::Entity).await?;
        create_entity_table(manager, leave_request::Entity).await?;
        create_entity_table(manager, leave_balance::Entity).await?;
        create_entity_table(manager, work_schedule::Entity).await?;

        unique_index(
            manager,
            "uq_attendance_employee_date",
            attendance::Entity,
            [attendance::Column::EmployeeId, attendance::Column::Date],
        )
        .await?;
        unique_index(
            manager,
            "uq_leave_balance_employee_year",
            leave_balance::Entity,
            [leave_balance::Column::EmployeeId, leave_balance::Column::Year],
        )
        .await?;
        unique_index(
            manager,
            "uq_work_schedule_employee_date",
            work_schedule::Entity,
            [work_schedule::Column::EmployeeId, work_schedule::Column::Date],
        )
        .await?;
        index(
            manager,
            "idx_leave_request_employee_start",
            leave_request::Entity,
            [
                leave_request::Column::EmployeeId,
                leave_request::Column::StartDate,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, work_schedule::Entity).await?;
        drop_entity_table(manager, leave_balance::Entity).await?;
        drop_entity_table(manager, leave_request::Entity).await?;
        drop_entity_table(manager, attendance::Entity).await
    }
}
