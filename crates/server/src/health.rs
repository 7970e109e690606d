use std::path::Path;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use partline_core::Catalog;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogStatus {
    pub source: String,
    pub parts: usize,
    pub models: usize,
    pub symptoms: usize,
}

impl CatalogStatus {
    pub fn describe(catalog: &Catalog, path: Option<&Path>) -> Self {
        Self {
            source: path.map_or_else(|| "builtin".to_string(), |path| path.display().to_string()),
            parts: catalog.parts().len(),
            models: catalog.models().len(),
            symptoms: catalog.symptoms().len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.parts == 0 && self.models == 0 && self.symptoms == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(catalog: CatalogStatus) -> Router {
    Router::new().route("/health", get(health)).with_state(catalog)
}

pub async fn health(State(catalog): State<CatalogStatus>) -> (StatusCode, Json<HealthResponse>) {
    let catalog_check = if catalog.is_empty() {
        HealthCheck { status: "degraded", detail: format!("catalog `{}` has no records", catalog.source) }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!(
                "{} parts, {} models, {} symptoms from {}",
                catalog.parts, catalog.models, catalog.symptoms, catalog.source
            ),
        }
    };
    let ready = catalog_check.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "partline-server runtime initialized".to_string(),
        },
        catalog: catalog_check,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use partline_core::Catalog;

    use crate::health::{health, CatalogStatus};

    #[tokio::test]
    async fn health_is_ready_with_builtin_catalog() {
        let status = CatalogStatus::describe(&Catalog::builtin(), None);
        let (code, Json(payload)) = health(State(status)).await;

        assert_eq!(code, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.status, "ready");
        assert!(payload.catalog.detail.ends_with("from builtin"));
    }

    #[tokio::test]
    async fn health_is_degraded_with_empty_catalog() {
        let status = CatalogStatus::describe(&Catalog::default(), None);
        let (code, Json(payload)) = health(State(status)).await;

        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
