use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::CatalogError;
use crate::{db, AppState};

mod keywords;
mod switches;

use keywords::*;
use switches::*;

/// Run a blocking closure on the spawn_blocking pool and map JoinError.
async fn blocking<T, F>(f: F) -> Result<T, CatalogError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CatalogError::Internal(e.to_string()))
}

/// DataTables-style page envelope shared by the switch and keyword listings.
#[derive(Serialize)]
pub(super) struct PageResponse<T> {
    draw: Option<i64>,
    page_list: Vec<T>,
    #[serde(rename = "recordsTotal")]
    records_total: usize,
    #[serde(rename = "recordsFiltered")]
    records_filtered: usize,
}

impl<T> PageResponse<T> {
    fn new(draw: Option<i64>, page: db::Page<T>) -> Self {
        Self {
            draw,
            page_list: page.items,
            records_total: page.total,
            records_filtered: page.total,
        }
    }
}

fn ok_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Auth middleware: write requests need the Bearer token if MKS_API_KEY is configured.
async fn require_auth(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, CatalogError> {
    let Some(ref expected) = state.api_key else {
        return Ok(next.run(req).await);
    };
    if matches!(*req.method(), Method::GET | Method::HEAD) {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(CatalogError::Unauthorized)?;

    if token.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(next.run(req).await)
    } else {
        Err(CatalogError::Unauthorized)
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/mkslist", get(list_switches))
        .route("/api/mks", post(save_switch))
        .route("/api/mks/{id}", get(get_switch))
        .route(
            "/api/keyword",
            get(list_keywords).post(save_keyword).delete(delete_keyword),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}

/// GET /health — uptime plus row counts.
async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, CatalogError> {
    let db = state.db.clone();
    let stats = blocking(move || db.stats()).await??;
    Ok(Json(serde_json::json!({
        "name": "mkswitch",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "stats": stats,
    })))
}
