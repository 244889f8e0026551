use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{GymbookError, HttpStatusCode};

/// Renders any [`HttpStatusCode`] error as the shared JSON error body:
///
/// ```json
/// { "error": { "message": "...", "code": 409, "kind": "slot_conflict" } }
/// ```
pub fn error_response<E>(err: &E) -> Response
where
    E: HttpStatusCode + std::fmt::Display,
{
    let status_code =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = Json(json!({
        "error": {
            "message": err.to_string(),
            "code": status_code.as_u16(),
            "kind": err.kind(),
        }
    }));

    (status_code, body).into_response()
}

/// Implement IntoResponse for GymbookError to make it easier to use in Axum handlers.
impl IntoResponse for GymbookError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_body_carries_status_and_kind() {
        let response = GymbookError::NotFoundError("appointment 4".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], 404);
        assert_eq!(body["error"]["kind"], "not_found");
        assert_eq!(body["error"]["message"], "Not found: appointment 4");
    }
}
