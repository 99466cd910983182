use products_hr::LeaveLedger;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

/// Leave entitlement and usage for one employee-year.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "leave_balance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub year: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub total_days: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub used_days: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub remaining_days: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub annual_leave_used: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub sick_leave_used: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub other_leave_used: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::EmployeeId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Model {
    pub fn ledger(&self) -> LeaveLedger {
        LeaveLedger {
            total_days: self.total_days,
            used_days: self.used_days,
            remaining_days: self.remaining_days,
            annual_leave_used: self.annual_leave_used,
            sick_leave_used: self.sick_leave_used,
            other_leave_used: self.other_leave_used,
        }
    }

    pub fn available_days(&self) -> Decimal {
        self.remaining_days
    }
}

impl ActiveModel {
    /// Copy every ledger column onto the active model.
    pub fn apply_ledger(&mut self, ledger: &LeaveLedger) {
        self.total_days = Set(ledger.total_days);
        self.used_days = Set(ledger.used_days);
        self.remaining_days = Set(ledger.remaining_days);
        self.annual_leave_used = Set(ledger.annual_leave_used);
        self.sick_leave_used = Set(ledger.sick_leave_used);
        self.other_leave_used = Set(ledger.other_leave_used);
    }
}

impl ActiveModelBehavior for ActiveModel {}
