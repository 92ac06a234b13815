//! HTTP client for the admin REST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::errors::ApiError;
use super::response::{transform, transport_failure, ApiResponse, RawResponse};
use super::routes::Routes;
use crate::config::Config;
use crate::models::{ListQuery, Resource, Session, User};
use crate::notify::NotificationQueue;

/// Bulk CRUD operations over a resource collection
///
/// Implemented by [`ApiClient`]; pages and screens only talk to this trait
/// so they can be driven without a server.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET` one page of the collection
    async fn list(&self, resource: Resource, query: &ListQuery) -> ApiResponse<Value>;

    /// `POST { data: [...] }`
    async fn insert(&self, resource: Resource, data: Vec<Value>) -> ApiResponse<Value>;

    /// `PUT { data: [...] }`
    async fn update(&self, resource: Resource, data: Vec<Value>) -> ApiResponse<Value>;

    /// `DELETE { data: [{ id }, ...] }`
    async fn delete(&self, resource: Resource, ids: Vec<i64>) -> ApiResponse<Value>;
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    data: T,
}

/// Admin API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    notifications: NotificationQueue,
    notify_on_failure: bool,
}

impl ApiClient {
    /// Build a client against the configured API host
    pub fn new(config: &Config, notifications: NotificationQueue) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;

        Self::with_client(client, config.api_base_url(), notifications)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        notifications: NotificationQueue,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }

        Ok(Self {
            client,
            base_url,
            token: None,
            notifications,
            notify_on_failure: true,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// A copy of this client whose failures are not pushed to the
    /// notification queue
    pub fn silent(&self) -> Self {
        Self {
            notify_on_failure: false,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResponse<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let notify = self.notify_on_failure.then_some(&self.notifications);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(ApiError::Http(e), notify),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                debug!("Response status {} ({} bytes)", status, body.len());
                transform(RawResponse::new(status, body), notify)
            }
            Err(e) => transport_failure(ApiError::Http(e), notify),
        }
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, email: &str, password: &str) -> ApiResponse<Session> {
        info!("Logging in as {}", email);
        let request = self
            .client
            .post(self.url(Routes::LOGIN))
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await
    }

    /// Currently authenticated user
    pub async fn current_user(&self) -> ApiResponse<User> {
        self.send(self.client.get(self.url(Routes::USER))).await
    }
}

#[async_trait]
impl ResourceApi for ApiClient {
    async fn list(&self, resource: Resource, query: &ListQuery) -> ApiResponse<Value> {
        debug!("GET {} page {}", resource.route(), query.page);
        let request = self
            .client
            .get(self.url(resource.route()))
            .query(&query.as_params());
        self.send(request).await
    }

    async fn insert(&self, resource: Resource, data: Vec<Value>) -> ApiResponse<Value> {
        info!("Inserting {} row(s) into {}", data.len(), resource.as_str());
        let request = self
            .client
            .post(self.url(resource.route()))
            .json(&Envelope { data });
        self.send(request).await
    }

    async fn update(&self, resource: Resource, data: Vec<Value>) -> ApiResponse<Value> {
        info!("Updating {} row(s) of {}", data.len(), resource.as_str());
        let request = self
            .client
            .put(self.url(resource.route()))
            .json(&Envelope { data });
        self.send(request).await
    }

    async fn delete(&self, resource: Resource, ids: Vec<i64>) -> ApiResponse<Value> {
        info!("Deleting {} row(s) from {}", ids.len(), resource.as_str());
        let data: Vec<Value> = ids.into_iter().map(|id| json!({ "id": id })).collect();
        let request = self
            .client
            .delete(self.url(resource.route()))
            .json(&Envelope { data });
        self.send(request).await
    }
}
