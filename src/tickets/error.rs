use axum::{response::IntoResponse, Json};

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl IntoResponse for TicketError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
