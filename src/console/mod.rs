//! Operator console for the backend admin API.
//!
//! Login exchanges operator credentials for a backend token, kept in a
//! server-side session keyed by an opaque cookie. Every other page runs
//! behind [`auth::require_session`] and calls the backend with that token.

pub mod auth;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::backend::{ApiClient, Channel, Hoster, Package, Subscription, User};
use crate::config::ConsoleConfig;
use crate::resilience::Deadlines;

use self::auth::require_session;
use self::forms::{HosterForm, PackageForm, SubscriptionForm, UserForm};
use self::handlers::*;
use self::session::SessionStore;

pub use self::session::Session;

#[derive(Clone)]
pub struct ConsoleState {
    pub api: ApiClient,
    pub sessions: Arc<SessionStore>,
    pub cookie_name: Arc<str>,
}

impl ConsoleState {
    pub fn new(config: &ConsoleConfig, deadlines: &Deadlines) -> Result<Self, reqwest::Error> {
        Ok(Self {
            api: ApiClient::new(&config.api_base_url, deadlines)?,
            sessions: Arc::new(SessionStore::new(Duration::from_secs(config.session_ttl_secs))),
            cookie_name: Arc::from(config.session_cookie.as_str()),
        })
    }
}

pub fn router(state: ConsoleState, max_form_bytes: usize, request_timeout: Duration) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        // Channels
        .route("/channels", get(list::<Channel>))
        .route("/channels/add", get(blank::<Channel, Package>).post(create_channel))
        .route(
            "/channels/edit/{id}",
            get(edit_plain::<Channel>).post(update::<forms::ChannelForm>),
        )
        .route("/channels/delete/{id}", get(delete::<Channel>))
        // Packages
        .route("/packages", get(list::<Package>))
        .route("/packages/add", get(blank_plain::<Package>).post(create::<PackageForm>))
        .route(
            "/packages/edit/{id}",
            get(edit_plain::<Package>).post(update::<PackageForm>),
        )
        .route("/packages/delete/{id}", get(delete::<Package>))
        // Users
        .route("/users", get(list::<User>))
        .route("/users/add", get(blank::<User, Hoster>).post(create::<UserForm>))
        .route("/users/edit/{id}", get(edit::<User, Hoster>).post(update::<UserForm>))
        .route("/users/delete/{id}", get(delete::<User>))
        // Hosters
        .route("/hosters", get(list::<Hoster>))
        .route("/hosters/add", get(blank_plain::<Hoster>).post(create::<HosterForm>))
        .route(
            "/hosters/edit/{id}",
            get(edit_plain::<Hoster>).post(update::<HosterForm>),
        )
        .route("/hosters/delete/{id}", get(delete::<Hoster>))
        // Subscriptions
        .route("/subscriptions", get(list::<Subscription>))
        .route(
            "/subscriptions/add",
            get(blank::<Subscription, User>).post(create::<SubscriptionForm>),
        )
        .route(
            "/subscriptions/edit/{id}",
            get(edit::<Subscription, User>).post(update::<SubscriptionForm>),
        )
        .route("/subscriptions/delete/{id}", get(delete::<Subscription>))
        // Package membership
        .route(
            "/api/packages/{package_id}/channels/{channel_id}",
            post(attach_channel).delete(detach_channel),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(max_form_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
