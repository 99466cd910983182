use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "employee_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub resident_id: Option<String>,
    pub birth_date: Option<Date>,
    pub address: Option<String>,
    pub employee_type: EmployeeType,
    pub work_type: WorkType,
    pub position_history: Json,
    pub department_history: Json,
    pub status: EmploymentStatus,
    pub resignation_date: Option<Date>,
    pub resignation_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum EmployeeType {
    #[sea_orm(string_value = "REGULAR")]
    Regular,
    #[sea_orm(string_value = "CONTRACT")]
    Contract,
    #[sea_orm(string_value = "INTERN")]
    Intern,
    #[sea_orm(string_value = "DISPATCHED")]
    Dispatched,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum WorkType {
    #[sea_orm(string_value = "FULL_TIME")]
    FullTime,
    #[sea_orm(string_value = "PART_TIME")]
    PartTime,
    #[sea_orm(string_value = "REMOTE")]
    Remote,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum EmploymentStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "ON_LEAVE")]
    OnLeave,
    #[sea_orm(string_value = "RESIGNED")]
    Resigned,
    #[sea_orm(string_value = "RETIRED")]
    Retired,
}

impl Model {
    pub fn age(&self, today: NaiveDate) -> Option<i32> {
        self.birth_date
            .map(|born| products_hr::people::age(born, today))
    }

    pub fn masked_resident_id(&self) -> Option<String> {
        self.resident_id
            .as_deref()
            .map(products_hr::people::mask_resident_id)
            .filter(|masked| !masked.is_empty())
    }
}

/// Append `{date, <key>: value}` to a JSON history list. Anything that is not
/// a list starts a fresh one.
pub fn append_history(history: &Json, date: NaiveDate, key: &str, value: &str) -> Json {
    let mut entry = serde_json::Map::new();
    entry.insert("date".into(), Json::String(date.to_string()));
    entry.insert(key.into(), Json::String(value.into()));
    let mut entries = history.as_array().cloned().unwrap_or_default();
    entries.push(Json::Object(entry));
    Json::Array(entries)
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_entries_accumulate() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let first = append_history(&Json::Null, date, "position", "Analyst");
        let second = append_history(&first, date, "position", "Lead");
        assert_eq!(
            second,
            json!([
                {"date": "2024-03-01", "position": "Analyst"},
                {"date": "2024-03-01", "position": "Lead"}
            ])
        );
    }
}
