//! Typed client for the admin API

use reqwest::{header, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::session::AuthSession;
use crate::models::{
    AdminUser, BlogPost, CreateBlogPostInput, CreateServiceInput, LoginInput, RegisterInput,
    Service, UpdateBlogPostInput, UpdateServiceInput,
};
use crate::services::LoginResponse;

/// Path used when no base URL is configured
pub const DEFAULT_ADMIN_API_PATH: &str = "/api/admin";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors returned by [`AdminApiClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-2xx response; the message is the response body when there is one
    #[error("{}", status_message(.status, .body))]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Session store error: {0}")]
    Session(#[from] anyhow::Error),
}

fn status_message(status: &u16, body: &str) -> String {
    if body.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        body.to_string()
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn is_absolute_http(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Normalize a configured admin API base URL.
///
/// - empty input yields `/api/admin`
/// - absolute URLs keep their path (`/api/admin` when it is empty) and lose
///   query, fragment and trailing slashes
/// - anything else becomes a rooted path without trailing slashes
pub fn admin_api_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_ADMIN_API_PATH.to_string();
    }

    let without_slash = trimmed.trim_end_matches('/');

    if is_absolute_http(without_slash) {
        let mut url = match Url::parse(without_slash) {
            Ok(url) => url,
            Err(_) => return DEFAULT_ADMIN_API_PATH.to_string(),
        };
        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(if path.is_empty() {
            DEFAULT_ADMIN_API_PATH
        } else {
            &path
        });
        url.set_query(None);
        url.set_fragment(None);
        return url.as_str().trim_end_matches('/').to_string();
    }

    if without_slash.is_empty() {
        return DEFAULT_ADMIN_API_PATH.to_string();
    }

    if without_slash.starts_with('/') {
        without_slash.to_string()
    } else {
        format!("/{}", without_slash)
    }
}

/// Client for the `/api/admin` endpoints
///
/// When a session is attached its bearer token is sent with every request,
/// and login/logout keep it up to date.
#[derive(Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Arc<RwLock<AuthSession>>>,
}

impl AdminApiClient {
    /// Client for an absolute base URL such as `https://host/api/admin`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = admin_api_base_url(base_url);
        if !is_absolute_http(&base_url) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url,
            session: None,
        })
    }

    /// Resolve a possibly relative base URL against the site origin
    pub fn for_origin(origin: &str, base_url: &str) -> Result<Self, ClientError> {
        let base_url = admin_api_base_url(base_url);
        if is_absolute_http(&base_url) {
            return Self::new(&base_url);
        }
        Self::new(&format!("{}{}", origin.trim_end_matches('/'), base_url))
    }

    pub fn with_session(mut self, session: Arc<RwLock<AuthSession>>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&Arc<RwLock<AuthSession>>> {
        self.session.as_ref()
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(session) = &self.session {
            if let Some(token) = session.read().await.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%method, url = %url, status = status.as_u16(), "Admin API request failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, query, body).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn empty(&self, method: Method, path: &str) -> Result<(), ClientError> {
        let response = self.send::<()>(method, path, None, None).await?;
        if response.status() != StatusCode::NO_CONTENT {
            // Drain whatever the server sent
            response.bytes().await?;
        }
        Ok(())
    }

    // Auth

    pub async fn register(&self, input: &RegisterInput) -> Result<AdminUser, ClientError> {
        self.json(Method::POST, "/register", None, Some(input)).await
    }

    /// Log in and, when a session is attached, store the token and user
    pub async fn login(&self, input: &LoginInput) -> Result<LoginResponse, ClientError> {
        let response: LoginResponse = self.json(Method::POST, "/login", None, Some(input)).await?;
        if let Some(session) = &self.session {
            session
                .write()
                .await
                .login(response.token.clone(), Some(response.user.clone()))?;
        }
        Ok(response)
    }

    /// End the server session; the local session is cleared even if the
    /// server call fails
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.empty(Method::POST, "/logout").await;
        if let Some(session) = &self.session {
            session.write().await.logout()?;
        }
        result
    }

    // Blog posts

    pub async fn list_posts(&self) -> Result<Vec<BlogPost>, ClientError> {
        self.json::<_, ()>(Method::GET, "/posts", None, None).await
    }

    pub async fn get_post(&self, id: &str) -> Result<BlogPost, ClientError> {
        self.json::<_, ()>(Method::GET, &format!("/posts/{}", id), None, None)
            .await
    }

    /// First post with the slug, if any
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, ClientError> {
        let posts: Vec<BlogPost> = self
            .json::<_, ()>(Method::GET, "/posts", Some(&[("slug", slug)]), None)
            .await?;
        Ok(posts.into_iter().next())
    }

    pub async fn create_post(&self, input: &CreateBlogPostInput) -> Result<BlogPost, ClientError> {
        self.json(Method::POST, "/posts", None, Some(input)).await
    }

    pub async fn update_post(
        &self,
        id: &str,
        input: &UpdateBlogPostInput,
    ) -> Result<BlogPost, ClientError> {
        self.json(Method::PUT, &format!("/posts/{}", id), None, Some(input))
            .await
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), ClientError> {
        self.empty(Method::DELETE, &format!("/posts/{}", id)).await
    }

    // Services

    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        self.json::<_, ()>(Method::GET, "/services", None, None).await
    }

    pub async fn get_service(&self, id: &str) -> Result<Service, ClientError> {
        self.json::<_, ()>(Method::GET, &format!("/services/{}", id), None, None)
            .await
    }

    pub async fn get_service_by_slug(&self, slug: &str) -> Result<Option<Service>, ClientError> {
        let services: Vec<Service> = self
            .json::<_, ()>(Method::GET, "/services", Some(&[("slug", slug)]), None)
            .await?;
        Ok(services.into_iter().next())
    }

    pub async fn create_service(&self, input: &CreateServiceInput) -> Result<Service, ClientError> {
        self.json(Method::POST, "/services", None, Some(input)).await
    }

    pub async fn update_service(
        &self,
        id: &str,
        input: &UpdateServiceInput,
    ) -> Result<Service, ClientError> {
        self.json(Method::PUT, &format!("/services/{}", id), None, Some(input))
            .await
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), ClientError> {
        self.empty(Method::DELETE, &format!("/services/{}", id)).await
    }
}
