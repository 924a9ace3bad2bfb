use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization and startup.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Lifecycle trait every bookshelf module implements.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module; also the path segment its routes are
    /// mounted under.
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context.
    /// Called during application startup before the HTTP server binds.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes.
    /// Routes are mounted under `/{module_name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return an OpenAPI specification fragment for this module as JSON.
    /// Fragments are merged into the served spec.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background tasks for this module.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop the module and clean up resources.
    /// Called during application shutdown.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
