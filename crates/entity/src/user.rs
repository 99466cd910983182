use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub employee_id: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_hr_manager: bool,
    pub is_admin: bool,
    pub is_active: bool,
    pub hire_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Secret,
    Profile,
    Attendance,
    LeaveRequest,
    LeaveBalance,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Secret => Entity::has_one(super::user_secret::Entity).into(),
            Relation::Profile => Entity::has_one(super::employee_profile::Entity).into(),
            Relation::Attendance => Entity::has_many(super::attendance::Entity).into(),
            Relation::LeaveRequest => Entity::has_many(super::leave_request::Entity).into(),
            Relation::LeaveBalance => Entity::has_many(super::leave_balance::Entity).into(),
        }
    }
}

impl Related<super::user_secret::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Secret.def()
    }
}

impl Related<super::employee_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Admins and HR managers run the back office.
    pub fn is_management(&self) -> bool {
        self.is_admin || self.is_hr_manager
    }

    pub fn tenure_years(&self, today: NaiveDate) -> i32 {
        products_hr::people::tenure_years(self.hire_date, today)
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_admin: bool, is_hr_manager: bool) -> Model {
        let now = Utc::now().fixed_offset();
        Model {
            id: Uuid::new_v4(),
            employee_id: None,
            email: "a@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lee".into(),
            phone: None,
            department: None,
            position: None,
            is_hr_manager,
            is_admin,
            is_active: true,
            hire_date: NaiveDate::from_ymd_opt(2020, 6, 1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn management_is_admin_or_hr() {
        assert!(user(true, false).is_management());
        assert!(user(false, true).is_management());
        assert!(!user(false, false).is_management());
    }

    #[test]
    fn tenure_comes_from_hire_date() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(user(false, false).tenure_years(today), 3);
        assert_eq!(user(false, false).full_name(), "Ada Lee");
    }
}
