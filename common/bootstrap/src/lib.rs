pub mod app;
pub mod logging;
pub mod openapi;
pub mod settings;

pub use app::{AppState, WebApplication};
pub use openapi::ApiInfo;
pub use settings::{AppSettings, Environment};
