//! OpenAPI document served by every service.
//!
//! Services describe their operations with `#[utoipa::path]` and hand the
//! resulting document to the bootstrap, which stamps the service's name and
//! version on it and registers the bearer scheme the operations refer to.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::{Components, InfoBuilder, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub const DOCUMENT_PATH: &str = "/swagger/v1/swagger.json";
pub const UI_PATH: &str = "/swagger";

/// Name operations use in `security(("Bearer" = []))`.
pub const SECURITY_SCHEME: &str = "Bearer";

#[derive(Debug, Clone)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
}

impl ApiInfo {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
        }
    }
}

pub fn build_document(info: &ApiInfo, mut api: OpenApi) -> OpenApi {
    api.info = InfoBuilder::new()
        .title(info.title.clone())
        .version(info.version.clone())
        .build();

    api.components.get_or_insert_with(Components::new).add_security_scheme(
        SECURITY_SCHEME,
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );
    api
}

/// Swagger UI under [`UI_PATH`], also serving the document at [`DOCUMENT_PATH`].
pub fn swagger_ui(document: OpenApi) -> SwaggerUi {
    SwaggerUi::new(UI_PATH).url(DOCUMENT_PATH, document)
}
