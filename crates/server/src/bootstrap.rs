use std::sync::Arc;

use axum::Router;
use partline_agent::{AnswerService, LocalAnswerService};
use partline_core::config::{AppConfig, ConfigError};
use partline_core::{ApplicationError, Catalog};
use thiserror::Error;
use tracing::info;

use crate::{chat, health};

pub struct Application {
    pub config: AppConfig,
    pub service: Arc<dyn AnswerService>,
    pub catalog_status: health::CatalogStatus,
}

impl Application {
    pub fn router(&self) -> Router {
        chat::router(self.service.clone()).merge(health::router(self.catalog_status.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = Catalog::load_or_builtin(config.catalog.path.as_deref())
        .map_err(ApplicationError::from)?;
    let catalog_status = health::CatalogStatus::describe(&catalog, config.catalog.path.as_deref());
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        source = %catalog_status.source,
        parts = catalog_status.parts,
        models = catalog_status.models,
        symptoms = catalog_status.symptoms,
        "catalog loaded"
    );

    Ok(Application {
        config,
        service: Arc::new(LocalAnswerService::new(catalog)),
        catalog_status,
    })
}
