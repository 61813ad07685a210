use std::any::Any;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common_auth::JwtReader;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::openapi::{OpenApi, OpenApiBuilder};

use crate::openapi::{self, ApiInfo};
use crate::settings::AppSettings;

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub jwt_reader: Arc<JwtReader>,
    pub api_document: Arc<OpenApi>,
}

impl FromRef<AppState> for Arc<JwtReader> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_reader.clone()
    }
}

/// Builder that turns settings and a service's routes into a ready router.
pub struct WebApplication {
    settings: AppSettings,
    info: ApiInfo,
    routes: Router<AppState>,
    api: OpenApi,
}

impl WebApplication {
    /// Fails when the configured signing key is unusable, so a misconfigured
    /// service never starts accepting requests.
    pub fn new(settings: AppSettings, info: ApiInfo) -> Result<Self> {
        settings
            .jwt
            .signing_key()
            .context("JwtOptions.Key must be a non-empty ASCII secret")?;

        Ok(Self {
            settings,
            info,
            routes: Router::new(),
            api: OpenApiBuilder::new().build(),
        })
    }

    /// Adds a service's routes together with the OpenAPI paths describing them.
    pub fn with_routes(mut self, routes: Router<AppState>, api: OpenApi) -> Self {
        self.routes = self.routes.merge(routes);
        self.api.merge(api);
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn build(self) -> Router {
        let development = self.settings.environment.is_development();
        info!(
            app = %self.info.title,
            version = %self.info.version,
            environment = self.settings.environment.as_str(),
            "Starting {}...",
            self.info.title
        );
        if development {
            info!("Use development exception page");
        }

        let document = openapi::build_document(&self.info, self.api);
        let operations = document.paths.paths.len();
        let state = AppState {
            jwt_reader: Arc::new(JwtReader::new(self.settings.jwt.clone())),
            api_document: Arc::new(document.clone()),
        };

        info!("Use Swagger.");
        let mut router = Router::new().route("/healthz", get(health));
        if development {
            info!("Use Swagger UI.");
            router = router.merge(openapi::swagger_ui(document));
        } else {
            router = router.route(openapi::DOCUMENT_PATH, get(api_document));
        }

        info!("Use JWT authorization.");
        info!(operations, "Use controllers.");
        let router = router
            .merge(self.routes)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        if development {
            router.layer(CatchPanicLayer::custom(developer_exception))
        } else {
            router.layer(CatchPanicLayer::new())
        }
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.settings.listen_addr()?;
        let app = self.build();

        info!(%addr, "listening");
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_document(State(state): State<AppState>) -> Json<OpenApi> {
    Json(state.api_document.as_ref().clone())
}

fn developer_exception(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Unhandled exception: {detail}"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Environment;
    use axum::body::Body;
    use axum::http::{header::AUTHORIZATION, Request};
    use chrono::Utc;
    use common_auth::{AuthContext, JwtConfig};
    use http_body_util::BodyExt;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use utoipa::OpenApi as _;

    const KEY: &str = "supersecretkey123456";

    fn settings(environment: Environment) -> AppSettings {
        AppSettings {
            environment,
            jwt: JwtConfig::new("auth.example", KEY).with_lifetimes(15, 1440),
            ..AppSettings::default()
        }
    }

    #[utoipa::path(
        get,
        path = "/subject",
        responses((status = 200, description = "Caller subject")),
        security(("Bearer" = []))
    )]
    async fn subject(auth: AuthContext) -> String {
        auth.claims.subject.unwrap_or_default()
    }

    #[derive(utoipa::OpenApi)]
    #[openapi(paths(subject))]
    struct TestDoc;

    async fn explode() -> &'static str {
        panic!("boom")
    }

    fn app(environment: Environment) -> Router {
        let routes = Router::new()
            .route("/subject", get(subject))
            .route("/explode", get(explode));
        WebApplication::new(settings(environment), ApiInfo::new("test-service", "1.2.3"))
            .expect("valid settings")
            .with_routes(routes, TestDoc::openapi())
            .build()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes()
            .to_vec();
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn refuses_empty_signing_key() {
        let mut settings = settings(Environment::Production);
        settings.jwt.key.clear();
        assert!(WebApplication::new(settings, ApiInfo::new("svc", "0.0.0")).is_err());
    }

    #[tokio::test]
    async fn serves_health_and_document() {
        let (status, body) = send(app(Environment::Production), get_request("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        for environment in [Environment::Production, Environment::Development] {
            let (status, body) = send(app(environment), get_request(openapi::DOCUMENT_PATH)).await;
            assert_eq!(status, StatusCode::OK, "{environment:?}");
            let doc: Value = serde_json::from_slice(&body).expect("json document");
            assert_eq!(doc["info"]["title"], "test-service");
            assert_eq!(doc["info"]["version"], "1.2.3");
            assert!(doc["paths"]["/subject"]["get"]["security"].is_array());
            assert_eq!(
                doc["components"]["securitySchemes"]["Bearer"]["scheme"],
                "bearer"
            );
        }
    }

    #[tokio::test]
    async fn swagger_ui_only_in_development() {
        let ui_index = format!("{}/", openapi::UI_PATH);

        let (status, _) = send(app(Environment::Production), get_request(&ui_index)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(app(Environment::Development), get_request(&ui_index)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("swagger-ui"));
    }

    #[tokio::test]
    async fn protects_service_routes() {
        let (status, _) = send(app(Environment::Production), get_request("/subject")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let claims = json!({
            "sub": "user-9",
            "iss": "auth.example",
            "aud": "*.auth.example",
            "exp": Utc::now().timestamp() + 600
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(KEY.as_bytes()),
        )
        .expect("sign token");
        let request = Request::builder()
            .uri("/subject")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");

        let (status, body) = send(app(Environment::Production), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"user-9");
    }

    #[tokio::test]
    async fn development_exception_page_reports_panic() {
        let (status, body) = send(app(Environment::Development), get_request("/explode")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8_lossy(&body).contains("boom"));

        let (status, body) = send(app(Environment::Production), get_request("/explode")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!String::from_utf8_lossy(&body).contains("boom"));
    }
}
