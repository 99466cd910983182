pub use sea_orm_migration::prelude::*;

mod m20251201_000001_people;
mod m20251201_000002_competencies;
mod m20251201_000003_attendance;
mod m20251201_000004_payroll;
mod m20251201_000005_evaluation;
mod m20251201_000006_organization;
mod m20251201_000007_documents;
mod m20251201_000008_audit;
mod support;

pub struct Migrator;
#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251201_000001_people::Migration),
            Box::new(m20251201_000002_competencies::Migration),
            Box::new(m20251201_000003_attendance::Migration),
            Box::new(m20251201_000004_payroll::Migration),
            Box::new(m20251201_000005_evaluation::Migration),
            Box::new(m20251201_000006_organization::Migration),
            Box::new(m20251201_000007_documents::Migration),
            Box::new(m20251201_000008_audit::Migration),
        ]
    }
}
