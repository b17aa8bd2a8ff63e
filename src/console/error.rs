//! Console error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use crate::backend::ApiError;
use crate::console::forms::FormError;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Form(#[from] FormError),
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        match self {
            // The backend no longer accepts this session's token.
            ConsoleError::Api(e) if e.is_unauthorized() => Redirect::to("/login").into_response(),
            ConsoleError::Api(e @ ApiError::Rejected { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.message() }))).into_response()
            }
            ConsoleError::Api(e) => {
                tracing::error!(error = %e, "Backend API unavailable");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.message() }))).into_response()
            }
            ConsoleError::Form(e) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.to_string() }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn expired_backend_token_redirects_to_login() {
        let response = ConsoleError::from(ApiError::Rejected {
            status: 401,
            message: "Invalid or expired token".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[test]
    fn validation_failures_are_unprocessable() {
        let rejected = ConsoleError::from(ApiError::Rejected {
            status: 400,
            message: "name required".into(),
        });
        assert_eq!(rejected.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let form = ConsoleError::from(FormError::Missing { field: "key" });
        assert_eq!(form.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
