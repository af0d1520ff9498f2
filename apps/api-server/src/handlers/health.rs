//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::{AppState, StoreBackend};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub store: StoreBackend,
    /// `None` when running on the in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = database_status(&state).await;
    let healthy = database != Some("down");

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        store: state.backend,
        database,
    };

    if healthy {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

#[cfg(feature = "postgres")]
async fn database_status(state: &AppState) -> Option<&'static str> {
    let db = state.db.as_ref()?;
    match db.ping().await {
        Ok(()) => Some("up"),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            Some("down")
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_status(_state: &AppState) -> Option<&'static str> {
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test, web};
    use serde_json::Value;

    use folio_infra::InMemoryStore;

    use crate::handlers::configure_routes;
    use crate::handlers::test_support::state;

    #[actix_rt::test]
    async fn test_health_reports_memory_store() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(Arc::new(InMemoryStore::new()))))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
        assert!(body.get("database").is_none());
    }
}
