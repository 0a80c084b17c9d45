//! Known Agents request-interception middleware.
//!
//! Every request that the downstream handler completes successfully is
//! reported to the Known Agents analytics API as a sanitized visit event.
//! Optionally a robots.txt blocking selected agent types is generated by the
//! API once at provisioning and exposed to downstream handlers as a request
//! extension. The library also carries a small host (`app`) used by the
//! binary: it serves `/robots.txt` from that extension.

mod config;

pub mod agent_types;
pub mod api;
pub mod blockfile;
pub mod error;
pub mod middleware;
pub mod placeholder;
pub mod registry;
pub mod reporter;
pub mod settings;
pub mod visit;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::extract::Extension;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};

use crate::api::HttpAgentsApi;
use crate::registry::{DirectiveOrder, ModuleInfo, Registry};

pub use crate::api::{AgentsApi, ApiOptions};
pub use crate::error::{ApiError, ConfigError, ProvisionError, RegistryError, ValidationError};
pub use crate::middleware::{
    robots_txt_var, KnownAgents, KnownAgentsLayer, KnownAgentsService, RobotsTxtVar,
    ROBOTS_TXT_VAR,
};
pub use crate::reporter::{ReporterOptions, VisitReporter};
pub use crate::settings::{RobotsPolicy, Settings};
pub use crate::visit::VisitEvent;

/// Capability descriptor of this module. Runs before the host's generic
/// response-header directive.
pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    id: "http.handlers.knownagents",
    directive: settings::DIRECTIVE,
    order: DirectiveOrder::Before("header"),
};

/// Directive order of the bundled host before modules are registered.
pub const HOST_DIRECTIVE_ORDER: &[&str] = &["map", "vars", "header", "rewrite", "respond"];

/// Register this module with a host registry. Call once at startup.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(MODULE_INFO, Settings::from_dispenser)
}

/// State shared by the bundled host.
#[derive(Clone, Debug)]
pub struct AppState {
    pub knownagents: KnownAgents,
    pub directive_order: Vec<&'static str>,
}

/// Build state from environment variables. See [`AppConfig::from_env`].
pub async fn build_state_from_env() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;
    build_state(config).await
}

/// Parse the configuration file, resolve placeholders and provision the
/// module against the real API.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let mut registry = Registry::new();
    register(&mut registry)?;
    let directive_order = registry.directive_order(HOST_DIRECTIVE_ORDER);
    tracing::debug!(order = ?directive_order, "directive order");

    let mut settings = load_settings(&registry, &config.config_path, &config.config_source)?;
    settings.access_token = placeholder::replace_env_placeholders(&settings.access_token);

    let api = HttpAgentsApi::new(settings.access_token.clone(), config.api.clone())
        .context("failed to build HTTP client")?;
    let knownagents = KnownAgents::provision(settings, Arc::new(api), config.reporter)
        .await
        .context("failed to provision knownagents")?;

    Ok(AppState {
        knownagents,
        directive_order,
    })
}

/// Find the single `knownagents` block in a configuration source.
pub fn load_settings(registry: &Registry, file: &str, source: &str) -> anyhow::Result<Settings> {
    let mut found: Option<Settings> = None;
    for mut dispenser in blockfile::split_directives(file, source)? {
        let (module, settings) = registry.parse(&mut dispenser)?;
        if module.id != MODULE_INFO.id {
            continue;
        }
        if found.is_some() {
            return Err(anyhow!(
                "{}: '{}' may only be configured once",
                file,
                MODULE_INFO.directive
            ));
        }
        found = Some(settings);
    }
    found.ok_or_else(|| anyhow!("{}: no '{}' directive found", file, MODULE_INFO.directive))
}

/// Build the Axum router with the interceptor wrapped around every route.
pub fn app(state: AppState) -> Router {
    let layer = state.knownagents.layer();
    Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .route("/healthz", get(healthz_handler))
        .fallback(fallback_handler)
        .layer(layer)
        .with_state(state)
}

/// Serves the cached robots.txt published by the interceptor.
async fn robots_txt_handler(var: Option<Extension<RobotsTxtVar>>) -> Response {
    match var {
        Some(Extension(var)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            var.bytes(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn healthz_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Response {
    let json = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "robotsTxt": state.knownagents.robots_txt().is_some(),
    });
    (StatusCode::OK, Json(json)).into_response()
}

async fn fallback_handler() -> Response {
    StatusCode::NOT_FOUND.into_response()
}
