use std::sync::Arc;

use anyhow::Context;
use api::{
    auth::{decode_token, AuthConfig, CurrentUser, SESSION_COOKIE},
    render_org_action, render_org_chart, HrSchema,
};
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{Path, State},
    http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::Html,
    routing::get,
    Json, Router,
};
use entity::user;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub schema: HrSchema,
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthConfig>,
    pub config: Arc<AppConfig>,
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let layer = CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([Method::POST, Method::GET]);
    // Credentials are only allowed with an explicit origin list.
    if allowed.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        layer
            .allow_credentials(true)
            .allow_origin(AllowOrigin::list(allowed))
    }
}

pub fn build_router(state: AppState) -> Router {
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/graphiql", get(graphiql_handler))
        .route("/graphql", get(graphql_handler).post(graphql_handler))
        .route("/org_chart/", get(org_chart_handler))
        .route("/api/org/action/{action}/", get(org_action_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn graphiql_handler() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[instrument(skip_all)]
async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    if let Some(viewer) = authenticate(&state, &headers).await {
        request = request.data(viewer);
    }
    state.schema.execute(request).await.into()
}

async fn org_chart_handler(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    render_org_chart(state.db.as_ref())
        .await
        .map(Html)
        .map_err(|err| {
            warn!(error = %err, "org chart rendering failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn org_action_handler(Path(action): Path<String>) -> Json<Value> {
    Json(json!({ "html": render_org_action(&action) }))
}

/// Resolve the session from a bearer token or the session cookie.
/// Bad tokens and inactive accounts fall through as anonymous.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<CurrentUser> {
    let token = extract_token(headers)?;
    let claims = match decode_token(&token, &state.auth) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "rejected session token");
            return None;
        }
    };
    load_current_user(state.db.as_ref(), claims.sub).await
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|text| text.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|text| text.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn load_current_user(db: &DatabaseConnection, user_id: Uuid) -> Option<CurrentUser> {
    let user = match user::Entity::find_by_id(user_id).one(db).await {
        Ok(user) => user?,
        Err(err) => {
            warn!(error = %err, %user_id, "session lookup failed");
            return None;
        }
    };
    if !user.is_active {
        return None;
    }
    Some(CurrentUser::from_model(&user))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{auth::issue_token, build_schema, UserRole};
    use axum::body::Body;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use products_hr::WorkPolicy;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, Schema, Set};
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        auth: Arc<AuthConfig>,
        user_id: Uuid,
        inactive_id: Uuid,
    }

    async fn insert_user(db: &DatabaseConnection, email: &str, active: bool) -> Uuid {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(None),
            email: Set(email.into()),
            first_name: Set("Test".into()),
            last_name: Set("User".into()),
            phone: Set(None),
            department: Set(None),
            position: Set(None),
            is_hr_manager: Set(false),
            is_admin: Set(false),
            is_active: Set(active),
            hire_date: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn harness() -> Harness {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        db.execute(backend.build(&schema.create_table_from_entity(user::Entity)))
            .await
            .unwrap();
        db.execute(backend.build(&schema.create_table_from_entity(entity::organization::Entity)))
            .await
            .unwrap();
        let user_id = insert_user(&db, "viewer@hr.test", true).await;
        let inactive_id = insert_user(&db, "gone@hr.test", false).await;

        let db = Arc::new(db);
        let auth = Arc::new(AuthConfig::default());
        let config = AppConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            cors_allowed_origins: Vec::new(),
            auth: AuthConfig::default(),
            policy: WorkPolicy::default(),
        };
        let api::AppSchema(schema) = build_schema(db.clone(), auth.clone(), WorkPolicy::default());
        let router = build_router(AppState {
            schema,
            db,
            auth: auth.clone(),
            config: Arc::new(config),
        });
        Harness {
            router,
            auth,
            user_id,
            inactive_id,
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn me_request(header: Option<(http::HeaderName, String)>) -> http::Request<Body> {
        let mut builder = http::Request::post("/graphql").header(http::header::CONTENT_TYPE, "application/json");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder
            .body(Body::from(json!({ "query": "{ hr { me { email } } }" }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok_with_a_request_id() {
        let h = harness().await;
        let response = h
            .router
            .oneshot(http::Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn bearer_tokens_authenticate() {
        let h = harness().await;
        let token = issue_token(h.user_id, &[UserRole::Employee], &h.auth).unwrap();
        let response = h
            .router
            .oneshot(me_request(Some((http::header::AUTHORIZATION, format!("Bearer {}", token)))))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["hr"]["me"]["email"], json!("viewer@hr.test"));
    }

    #[tokio::test]
    async fn session_cookies_authenticate() {
        let h = harness().await;
        let token = issue_token(h.user_id, &[UserRole::Employee], &h.auth).unwrap();
        let cookie = format!("theme=dark; {}={}", SESSION_COOKIE, token);
        let response = h
            .router
            .oneshot(me_request(Some((http::header::COOKIE, cookie))))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["hr"]["me"]["email"], json!("viewer@hr.test"));
    }

    #[tokio::test]
    async fn inactive_or_forged_sessions_are_anonymous() {
        let h = harness().await;
        let inactive = issue_token(h.inactive_id, &[UserRole::Employee], &h.auth).unwrap();
        let forged = issue_token(
            h.user_id,
            &[UserRole::Admin],
            &AuthConfig {
                jwt_secret: "someone-else".into(),
                ..AuthConfig::default()
            },
        )
        .unwrap();
        for token in [inactive, forged] {
            let response = h
                .router
                .clone()
                .oneshot(me_request(Some((http::header::AUTHORIZATION, format!("Bearer {}", token)))))
                .await
                .unwrap();
            let body = body_json(response).await;
            assert_eq!(body["errors"][0]["extensions"]["code"], json!("UNAUTHENTICATED"));
        }
    }

    #[tokio::test]
    async fn org_pages_render() {
        let h = harness().await;
        let response = h
            .router
            .clone()
            .oneshot(http::Request::get("/org_chart/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("<h1>Organization chart</h1>"));

        let response = h
            .router
            .clone()
            .oneshot(http::Request::get("/api/org/action/move/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["html"].as_str().unwrap().contains("data-action=\"move\""));

        let response = h
            .router
            .oneshot(http::Request::get("/api/org/action/launch/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({ "html": "" }));
    }
}
