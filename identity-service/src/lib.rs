use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use common_auth::AuthContext;
use common_bootstrap::AppState;
use serde::Serialize;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct CallerProfile {
    pub subject: Option<String>,
    pub issuer: String,
    pub roles: Vec<String>,
    pub valid_to: DateTime<Utc>,
}

/// Returns the claims of the authenticated caller.
#[utoipa::path(
    get,
    path = "/me",
    tag = "identity",
    responses(
        (status = 200, description = "Claims of the authenticated caller", body = CallerProfile),
        (status = 401, description = "Missing, malformed or rejected bearer token")
    ),
    security(("Bearer" = []))
)]
pub async fn me(auth: AuthContext) -> Json<CallerProfile> {
    let AuthContext { claims, valid_to } = auth;
    debug!(subject = ?claims.subject, "resolved caller profile");
    Json(CallerProfile {
        subject: claims.subject,
        issuer: claims.issuer,
        roles: claims.roles,
        valid_to,
    })
}

#[derive(OpenApi)]
#[openapi(paths(me), components(schemas(CallerProfile)))]
pub struct ApiDoc;

pub fn routes() -> (Router<AppState>, utoipa::openapi::OpenApi) {
    let router = Router::new().route("/me", get(me));
    (router, ApiDoc::openapi())
}
