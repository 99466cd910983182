#![allow(dead_code)]

use std::sync::Arc;

use api::auth::{AuthConfig, CurrentUser};
use api::schema::{build_schema, AppSchema, HrSchema};
use api::seed::{seed_hr_demo, SeededHrRecords};
use async_graphql::{Request, Response, Variables};
use entity::*;
use migration::{Migrator, MigratorTrait};
use products_hr::WorkPolicy;
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub schema: HrSchema,
    pub seeded: SeededHrRecords,
}

impl TestContext {
    pub async fn new() -> Self {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        let seeded = seed_hr_demo(&conn).await.unwrap();
        let db = Arc::new(conn);
        let AppSchema(schema) =
            build_schema(db.clone(), Arc::new(AuthConfig::default()), WorkPolicy::default());
        Self { db, schema, seeded }
    }

    pub fn user(&self, email: &str) -> &user::Model {
        self.seeded.user_email(email).unwrap()
    }

    pub fn admin(&self) -> &user::Model {
        self.user("admin@hr.test")
    }

    pub fn hr(&self) -> &user::Model {
        self.user("hr@hr.test")
    }

    pub fn dev(&self) -> &user::Model {
        self.user("dev@hr.test")
    }

    pub fn ops(&self) -> &user::Model {
        self.user("ops@hr.test")
    }

    pub async fn exec_as(&self, viewer: &user::Model, query: &str, vars: Value) -> Response {
        let request = Request::new(query)
            .variables(Variables::from_json(vars))
            .data(CurrentUser::from_model(viewer));
        self.schema.execute(request).await
    }

    pub async fn exec_anonymous(&self, query: &str, vars: Value) -> Response {
        self.schema
            .execute(Request::new(query).variables(Variables::from_json(vars)))
            .await
    }

    /// Run and insist on success; returns `data.hr`.
    pub async fn ok_as(&self, viewer: &user::Model, query: &str, vars: Value) -> Value {
        let resp = self.exec_as(viewer, query, vars).await;
        assert!(resp.errors.is_empty(), "unexpected errors: {:?}", resp.errors);
        resp.data.into_json().unwrap()["hr"].clone()
    }
}

pub fn error_code(resp: &Response) -> Option<String> {
    let ext = resp.errors.first()?.extensions.as_ref()?;
    match ext.get("code")? {
        async_graphql::Value::String(code) => Some(code.clone()),
        _ => None,
    }
}

/// Code a database failure surfaces with once lifted into the API.
pub fn db_error_code<T>(result: Result<T, sea_orm::DbErr>) -> Option<String> {
    use platform_api::ResultExt;

    let err = result.api().err()?;
    match err.extensions?.get("code")? {
        async_graphql::Value::String(code) => Some(code.clone()),
        _ => None,
    }
}

pub fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap(),
        Value::String(s) => s.parse().unwrap(),
        other => panic!("not a number: {other}"),
    }
}
