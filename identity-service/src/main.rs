use common_bootstrap::{logging, ApiInfo, AppSettings, WebApplication};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("info");

    let settings = AppSettings::load()?;
    let (routes, api) = identity_service::routes();

    WebApplication::new(
        settings,
        ApiInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    )?
    .with_routes(routes, api)
    .run()
    .await
}
