use products_hr::OrgNode;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "organization")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    #[sea_orm(indexed)]
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub organization_type: OrganizationType,
    pub manager_id: Option<Uuid>,
    pub assistant_manager_id: Option<Uuid>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub floor: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub employee_count: i32,
    pub established_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ManagerId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Manager,
    #[sea_orm(has_many = "super::employee_organization::Entity")]
    Assignment,
}

impl Related<super::employee_organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum OrganizationType {
    #[sea_orm(string_value = "DIVISION")]
    Division,
    #[sea_orm(string_value = "DEPARTMENT")]
    Department,
    #[sea_orm(string_value = "TEAM")]
    Team,
    #[sea_orm(string_value = "PART")]
    Part,
    #[sea_orm(string_value = "GROUP")]
    Group,
}

impl Model {
    pub fn node(&self) -> OrgNode {
        OrgNode {
            id: self.id,
            parent_id: self.parent_id,
            name: self.name.clone(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
