//! HTTP client for the backend admin API.
//!
//! # Contract
//! - `POST {base}/login` with `{username, password}` → `{token, expires_in}`
//! - `{GET,POST,PUT,DELETE} {base}/admin{endpoint}` with `Authorization: Bearer <token>`
//!
//! Accepted statuses: GET 200, POST 200/201, PUT 200, DELETE 200. Anything
//! else is a rejection carrying the backend's `error` message when present.

use axum::http::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::models::{LoginGrant, Resource};
use crate::observability::metrics;
use crate::resilience::Deadlines;

/// Failure talking to the backend API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected backend response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Text suitable for showing to the console operator.
    pub fn message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 401, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 404, .. })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Client for the backend admin API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, deadlines: &Deadlines) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(deadlines.connect)
            .timeout(deadlines.request)
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn admin_url(&self, endpoint: &str) -> String {
        format!("{}/admin{}", self.base_url, endpoint)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let request = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&Credentials { username, password });
        self.send("LOGIN", request, &[StatusCode::OK]).await
    }

    pub async fn get<T: DeserializeOwned>(&self, token: &str, endpoint: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.admin_url(endpoint)).bearer_auth(token);
        self.send("GET", request, &[StatusCode::OK]).await
    }

    pub async fn post<B, T>(&self, token: &str, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .http
            .post(self.admin_url(endpoint))
            .bearer_auth(token)
            .json(body);
        self.send("POST", request, &[StatusCode::OK, StatusCode::CREATED])
            .await
    }

    pub async fn put<B, T>(&self, token: &str, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .http
            .put(self.admin_url(endpoint))
            .bearer_auth(token)
            .json(body);
        self.send("PUT", request, &[StatusCode::OK]).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, token: &str, endpoint: &str) -> Result<T, ApiError> {
        let request = self.http.delete(self.admin_url(endpoint)).bearer_auth(token);
        self.send("DELETE", request, &[StatusCode::OK]).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<T, ApiError> {
        let result = Self::exchange(request, accepted).await;
        metrics::record_backend_call(method, result.is_ok());
        if let Err(e) = &result {
            tracing::debug!(method, error = %e, "Backend API call failed");
        }
        result
    }

    async fn exchange<T: DeserializeOwned>(
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Transport)?;

        if accepted.contains(&status) {
            return serde_json::from_slice(&body).map_err(ApiError::Decode);
        }

        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    // --- Resource helpers ---

    pub async fn list<R: Resource>(&self, token: &str) -> Result<Vec<R>, ApiError> {
        self.get(token, R::COLLECTION).await
    }

    /// Look up one entity; `Ok(None)` when the backend does not know it.
    pub async fn find<R: Resource>(&self, token: &str, id: u32) -> Result<Option<R>, ApiError> {
        if R::FETCH_BY_ID {
            match self.get(token, &format!("{}/{}", R::COLLECTION, id)).await {
                Ok(item) => Ok(Some(item)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        } else {
            let items: Vec<R> = self.list(token).await?;
            Ok(items.into_iter().find(|item| item.id() == id))
        }
    }

    pub async fn create<R, P>(&self, token: &str, payload: &P) -> Result<R, ApiError>
    where
        R: Resource,
        P: Serialize + Sync,
    {
        self.post(token, R::COLLECTION, payload).await
    }

    pub async fn update<R, P>(&self, token: &str, id: u32, payload: &P) -> Result<R, ApiError>
    where
        R: Resource,
        P: Serialize + Sync,
    {
        self.put(token, &format!("{}/{}", R::COLLECTION, id), payload)
            .await
    }

    pub async fn remove<R: Resource>(&self, token: &str, id: u32) -> Result<Value, ApiError> {
        self.delete(token, &format!("{}/{}", R::COLLECTION, id)).await
    }

    pub async fn attach_channel(
        &self,
        token: &str,
        package_id: u32,
        channel_id: u32,
    ) -> Result<Value, ApiError> {
        let endpoint = format!("/packages/{}/channels/{}", package_id, channel_id);
        self.post(token, &endpoint, &serde_json::json!({})).await
    }

    pub async fn detach_channel(
        &self,
        token: &str,
        package_id: u32,
        channel_id: u32,
    ) -> Result<Value, ApiError> {
        let endpoint = format!("/packages/{}/channels/{}", package_id, channel_id);
        self.delete(token, &endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_urls_join_without_double_slash() {
        let client = ApiClient::new("http://backend.test/api/", &Deadlines::default()).unwrap();
        assert_eq!(client.base_url(), "http://backend.test/api");
        assert_eq!(
            client.admin_url("/channels/4"),
            "http://backend.test/api/admin/channels/4"
        );
    }

    #[test]
    fn rejection_exposes_backend_message() {
        let err = ApiError::Rejected {
            status: 401,
            message: "Invalid credentials".into(),
        };
        assert_eq!(err.message(), "Invalid credentials");
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
    }
}
