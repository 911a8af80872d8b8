use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::MessageBody;

/// The fallback handler for routes that do not exist.
pub async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(MessageBody::new("Not found"))).into_response()
}
