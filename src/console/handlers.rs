//! Console page and form handlers.
//!
//! Pages answer with JSON view models; form posts answer with a redirect to
//! the collection they changed.

use axum::{
    extract::{Form, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::{ApiError, Channel, Hoster, Package, Resource, Subscription, User};
use crate::console::auth::ConsoleSession;
use crate::console::error::ConsoleError;
use crate::console::forms::{ChannelForm, EntityForm, LoginForm};
use crate::console::session::{expired_cookie, read_cookie, session_cookie};
use crate::console::ConsoleState;

#[derive(Debug, Serialize)]
pub struct ListView<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Add/edit form: the entity being edited (absent when adding) and the
/// choices for its select inputs.
#[derive(Debug, Serialize)]
pub struct FormView<T, C = ()> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<T>,
    pub choices: Vec<C>,
}

/// Entity counts; `None` where the backend could not be listed.
#[derive(Debug, Default, Serialize)]
pub struct Dashboard {
    pub channels: Option<usize>,
    pub packages: Option<usize>,
    pub users: Option<usize>,
    pub hosters: Option<usize>,
    pub subscriptions: Option<usize>,
}

fn has_session(state: &ConsoleState, headers: &HeaderMap) -> bool {
    read_cookie(headers, &state.cookie_name)
        .and_then(|id| state.sessions.get(&id))
        .is_some()
}

/// List a collection, degrading to an empty list on anything but an
/// expired token.
async fn load<R: Resource>(state: &ConsoleState, token: &str) -> Result<(Vec<R>, Option<String>), ConsoleError> {
    match state.api.list::<R>(token).await {
        Ok(items) => Ok((items, None)),
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            tracing::warn!(collection = R::COLLECTION, error = %e, "Failed to list backend collection");
            Ok((Vec::new(), Some(e.message())))
        }
    }
}

fn count<R>(result: Result<Vec<R>, ApiError>) -> Result<Option<usize>, ConsoleError> {
    match result {
        Ok(items) => Ok(Some(items.len())),
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(_) => Ok(None),
    }
}

// --- Authentication ---

pub async fn index(State(state): State<ConsoleState>, headers: HeaderMap) -> Redirect {
    if has_session(&state, &headers) {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page(State(state): State<ConsoleState>, headers: HeaderMap) -> Response {
    if has_session(&state, &headers) {
        return Redirect::to("/dashboard").into_response();
    }
    Json(json!({ "authenticated": false })).into_response()
}

pub async fn login(State(state): State<ConsoleState>, Form(form): Form<LoginForm>) -> Response {
    match state.api.login(&form.username, &form.password).await {
        Ok(grant) => {
            let id = state.sessions.create(&form.username, &grant);
            let cookie = session_cookie(&state.cookie_name, &id, state.sessions.lifetime(&grant));
            tracing::info!(username = %form.username, "Console login");
            ([(header::SET_COOKIE, cookie)], Redirect::to("/dashboard")).into_response()
        }
        Err(e) => {
            tracing::warn!(username = %form.username, error = %e, "Console login rejected");
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": e.message() }))).into_response()
        }
    }
}

pub async fn logout(State(state): State<ConsoleState>, headers: HeaderMap) -> Response {
    if let Some(id) = read_cookie(&headers, &state.cookie_name) {
        state.sessions.remove(&id);
    }
    (
        [(header::SET_COOKIE, expired_cookie(&state.cookie_name))],
        Redirect::to("/login"),
    )
        .into_response()
}

// --- Pages ---

pub async fn dashboard(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
) -> Result<Json<Dashboard>, ConsoleError> {
    let token = session.token.as_str();
    let (channels, packages, users, hosters, subscriptions) = tokio::join!(
        state.api.list::<Channel>(token),
        state.api.list::<Package>(token),
        state.api.list::<User>(token),
        state.api.list::<Hoster>(token),
        state.api.list::<Subscription>(token),
    );

    Ok(Json(Dashboard {
        channels: count(channels)?,
        packages: count(packages)?,
        users: count(users)?,
        hosters: count(hosters)?,
        subscriptions: count(subscriptions)?,
    }))
}

pub async fn list<R: Resource + Serialize>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
) -> Result<Json<ListView<R>>, ConsoleError> {
    let (items, error) = load::<R>(&state, &session.token).await?;
    Ok(Json(ListView { items, error }))
}

/// Blank add form for `R`, with `C` as its select choices.
pub async fn blank<R: Resource + Serialize, C: Resource + Serialize>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
) -> Result<Json<FormView<R, C>>, ConsoleError> {
    let (choices, _) = load::<C>(&state, &session.token).await?;
    Ok(Json(FormView { item: None, choices }))
}

/// Blank add form with no select inputs.
pub async fn blank_plain<R: Resource + Serialize>() -> Json<FormView<R>> {
    Json(FormView {
        item: None,
        choices: Vec::new(),
    })
}

/// Edit form for `R` number `id`, with `C` as its select choices. Unknown ids
/// go back to the list.
pub async fn edit<R: Resource + Serialize, C: Resource + Serialize>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Path(id): Path<u32>,
) -> Result<Response, ConsoleError> {
    let Some(item) = state.api.find::<R>(&session.token, id).await? else {
        return Ok(Redirect::to(R::COLLECTION).into_response());
    };
    let (choices, _) = load::<C>(&state, &session.token).await?;
    Ok(Json(FormView { item: Some(item), choices }).into_response())
}

pub async fn edit_plain<R: Resource + Serialize>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Path(id): Path<u32>,
) -> Result<Response, ConsoleError> {
    match state.api.find::<R>(&session.token, id).await? {
        Some(item) => Ok(Json(FormView::<R> {
            item: Some(item),
            choices: Vec::new(),
        })
        .into_response()),
        None => Ok(Redirect::to(R::COLLECTION).into_response()),
    }
}

// --- Mutations ---

pub async fn create<F: EntityForm>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Form(form): Form<F>,
) -> Result<Redirect, ConsoleError> {
    let payload = form.create_payload(Utc::now())?;
    let created: F::Resource = state.api.create::<F::Resource, _>(&session.token, &payload).await?;
    tracing::info!(collection = <F::Resource as Resource>::COLLECTION, id = created.id(), "Created");
    Ok(Redirect::to(<F::Resource as Resource>::COLLECTION))
}

/// Create a channel and, when a package was picked, attach it there.
pub async fn create_channel(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Form(form): Form<ChannelForm>,
) -> Result<Redirect, ConsoleError> {
    let payload = form.create_payload(Utc::now())?;
    let package_id = form.package_id()?;
    let created: Channel = state.api.create::<Channel, _>(&session.token, &payload).await?;
    tracing::info!(collection = Channel::COLLECTION, id = created.id, "Created");

    if let Some(package_id) = package_id {
        if let Err(e) = state
            .api
            .attach_channel(&session.token, package_id, created.id)
            .await
        {
            tracing::warn!(package_id, channel_id = created.id, error = %e, "Failed to attach new channel to package");
        }
    }

    Ok(Redirect::to(Channel::COLLECTION))
}

pub async fn update<F: EntityForm>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Path(id): Path<u32>,
    Form(form): Form<F>,
) -> Result<Redirect, ConsoleError> {
    let payload = form.update_payload(Utc::now())?;
    let _: F::Resource = state
        .api
        .update::<F::Resource, _>(&session.token, id, &payload)
        .await?;
    tracing::info!(collection = <F::Resource as Resource>::COLLECTION, id, "Updated");
    Ok(Redirect::to(<F::Resource as Resource>::COLLECTION))
}

/// Delete and return to the list. Backend refusals are logged, not shown.
pub async fn delete<R: Resource>(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Path(id): Path<u32>,
) -> Result<Redirect, ConsoleError> {
    match state.api.remove::<R>(&session.token, id).await {
        Ok(_) => tracing::info!(collection = R::COLLECTION, id, "Deleted"),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => tracing::warn!(collection = R::COLLECTION, id, error = %e, "Delete failed"),
    }
    Ok(Redirect::to(R::COLLECTION))
}

// --- Package membership (AJAX) ---

fn link_outcome(result: Result<Value, ApiError>) -> Json<Value> {
    match result {
        Ok(data) => Json(json!({ "success": true, "data": data })),
        Err(e) => Json(json!({ "success": false, "data": { "error": e.message() } })),
    }
}

pub async fn attach_channel(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Path((package_id, channel_id)): Path<(u32, u32)>,
) -> Json<Value> {
    link_outcome(
        state
            .api
            .attach_channel(&session.token, package_id, channel_id)
            .await,
    )
}

pub async fn detach_channel(
    State(state): State<ConsoleState>,
    Extension(session): Extension<ConsoleSession>,
    Path((package_id, channel_id)): Path<(u32, u32)>,
) -> Json<Value> {
    link_outcome(
        state
            .api
            .detach_channel(&session.token, package_id, channel_id)
            .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_degrades_except_on_expired_token() {
        assert_eq!(count::<u8>(Ok(vec![1, 2, 3])).unwrap(), Some(3));

        let unavailable = ApiError::Rejected {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(count::<u8>(Err(unavailable)).unwrap(), None);

        let expired = ApiError::Rejected {
            status: 401,
            message: "expired".into(),
        };
        assert!(count::<u8>(Err(expired)).is_err());
    }

    #[test]
    fn link_outcome_wraps_backend_answer() {
        let Json(ok) = link_outcome(Ok(json!({ "message": "Channel added to package" })));
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["message"], "Channel added to package");

        let Json(failed) = link_outcome(Err(ApiError::Rejected {
            status: 404,
            message: "Package not found".into(),
        }));
        assert_eq!(failed["success"], false);
        assert_eq!(failed["data"]["error"], "Package not found");
    }

    #[test]
    fn form_view_omits_missing_item() {
        let view: FormView<Package> = FormView {
            item: None,
            choices: Vec::new(),
        };
        assert_eq!(serde_json::to_value(view).unwrap(), json!({ "choices": [] }));
    }
}
