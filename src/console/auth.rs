//! Session gate for console pages.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::console::session::read_cookie;
use crate::console::ConsoleState;

/// Authenticated operator, attached to the request by [`require_session`].
#[derive(Debug, Clone)]
pub struct ConsoleSession {
    pub id: String,
    pub token: String,
}

pub async fn require_session(
    State(state): State<ConsoleState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let session = read_cookie(request.headers(), &state.cookie_name)
        .and_then(|id| state.sessions.get(&id).map(|session| (id, session)));

    match session {
        Some((id, session)) => {
            request.extensions_mut().insert(ConsoleSession {
                id,
                token: session.token,
            });
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "No console session, redirecting to login");
            Redirect::to("/login").into_response()
        }
    }
}
