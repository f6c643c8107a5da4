use axum::http::StatusCode;
use axum::Json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("工作室为空")]
    EmptyStudio,

    /// Update path: another record already owns the name.
    #[error("轴体名字重复")]
    DuplicateName,

    /// Create path: the name is taken.
    #[error("轴体名字已存在!")]
    NameExists,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // domain rejections are reported in the body, not the status line
            Self::EmptyStudio | Self::DuplicateName | Self::NameExists => StatusCode::OK,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl axum::response::IntoResponse for CatalogError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "status": "error", "msg": self.to_string() }));
        (status, body).into_response()
    }
}
