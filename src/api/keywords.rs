//! Keyword vocabulary handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{blocking, ok_status, PageResponse};
use crate::error::CatalogError;
use crate::{db, AppState};

#[derive(Deserialize)]
pub(super) struct KeywordQuery {
    draw: Option<i64>,
    start: Option<i64>,
    length: Option<i64>,
    s: Option<String>,
    t: Option<String>,
}

/// Plain word list when the client asked for no page, DataTables page otherwise.
#[derive(Serialize)]
#[serde(untagged)]
pub(super) enum KeywordListing {
    Words(Vec<String>),
    Page(PageResponse<db::Keyword>),
}

/// GET /api/keyword?t=type[&s][&start&length&draw]
pub(super) async fn list_keywords(
    State(state): State<AppState>,
    Query(q): Query<KeywordQuery>,
) -> Result<Json<KeywordListing>, CatalogError> {
    let kind = q
        .t
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CatalogError::Validation("t (keyword type) is required".into()))?;
    let db = state.db.clone();
    let listing = match q.start {
        None => {
            let words = blocking(move || db.list_keyword_words(&kind, q.s.as_deref())).await??;
            KeywordListing::Words(words)
        }
        Some(start) => {
            let page =
                blocking(move || db.page_keywords(&kind, q.s.as_deref(), start, q.length)).await??;
            KeywordListing::Page(PageResponse::new(q.draw, page))
        }
    };
    Ok(Json(listing))
}

/// POST /api/keyword
pub(super) async fn save_keyword(
    State(state): State<AppState>,
    Json(input): Json<db::KeywordInput>,
) -> Result<Json<serde_json::Value>, CatalogError> {
    let db = state.db.clone();
    blocking(move || db.upsert_keyword(input)).await??;
    Ok(ok_status())
}

#[derive(Deserialize)]
pub(super) struct DeleteBody {
    #[serde(default)]
    word: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// DELETE /api/keyword — soft delete; succeeds even when nothing matched.
pub(super) async fn delete_keyword(
    State(state): State<AppState>,
    Json(body): Json<DeleteBody>,
) -> Result<Json<serde_json::Value>, CatalogError> {
    if body.word.is_empty() || body.kind.is_empty() {
        return Err(CatalogError::Validation("word and type are required".into()));
    }
    let db = state.db.clone();
    let n = blocking(move || db.soft_delete_keyword(&body.word, &body.kind)).await??;
    tracing::debug!(rows = n, "keyword soft-deleted");
    Ok(ok_status())
}
