//! Switch catalog handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{blocking, PageResponse};
use crate::error::CatalogError;
use crate::{db, AppState};

const DEFAULT_PAGE_LEN: i64 = 10;

#[derive(Deserialize)]
pub(super) struct ListQuery {
    draw: Option<i64>,
    start: Option<i64>,
    length: Option<i64>,
    s: Option<String>,
}

/// GET /api/mkslist?draw&start&length&s
pub(super) async fn list_switches(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<PageResponse<db::Switch>>, CatalogError> {
    let start = q.start.unwrap_or(0);
    let length = q.length.unwrap_or(DEFAULT_PAGE_LEN);
    let db = state.db.clone();
    let page = blocking(move || db.list_switches(start, length, q.s.as_deref())).await??;
    Ok(Json(PageResponse::new(q.draw, page)))
}

/// POST /api/mks — create when `id` is empty, update otherwise.
pub(super) async fn save_switch(
    State(state): State<AppState>,
    Json(input): Json<db::SwitchInput>,
) -> Result<Json<serde_json::Value>, CatalogError> {
    let db = state.db.clone();
    let out = blocking(move || db.upsert_switch(input)).await??;
    Ok(Json(serde_json::json!({ "status": "ok", "id": out.id })))
}

pub(super) async fn get_switch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<db::Switch>, CatalogError> {
    let db = state.db.clone();
    let sw = blocking(move || db.get_switch(&id)).await??;
    sw.ok_or(CatalogError::NotFound).map(Json)
}
