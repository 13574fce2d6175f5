//! Query cache for dashboard data
//!
//! Reads are keyed by hierarchical query keys (`blog-posts`,
//! `blog-posts/{id}`, `blog-posts/slug/{slug}`, ...). Invalidating a key also
//! drops every key nested under it, so invalidating a list refreshes the
//! details fetched through it.

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use super::api::{AdminApiClient, ClientError};
use crate::models::{
    BlogPost, CreateBlogPostInput, CreateServiceInput, Service, UpdateBlogPostInput,
    UpdateServiceInput,
};

/// Default time a cached query stays fresh (5 minutes)
const DEFAULT_STALE_TIME_SECS: u64 = 300;

/// Default maximum number of cached queries
const DEFAULT_MAX_ENTRIES: u64 = 1_000;

const BLOG_POSTS: &str = "blog-posts";
const SERVICES: &str = "services";

/// Hierarchical cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn blog_posts() -> Self {
        Self::new([BLOG_POSTS])
    }

    pub fn blog_post(id: &str) -> Self {
        Self::new([BLOG_POSTS, id])
    }

    pub fn blog_post_by_slug(slug: &str) -> Self {
        Self::new([BLOG_POSTS, "slug", slug])
    }

    pub fn services() -> Self {
        Self::new([SERVICES])
    }

    pub fn service(id: &str) -> Self {
        Self::new([SERVICES, id])
    }

    pub fn service_by_slug(slug: &str) -> Self {
        Self::new([SERVICES, "slug", slug])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `other` equals this key or is nested under it
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// In-memory cache of query results
///
/// Values are stored as JSON so one cache can hold every response type.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<QueryKey, Value>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_STALE_TIME_SECS))
    }
}

impl QueryCache {
    /// Create a cache whose entries go stale after `stale_time`
    pub fn new(stale_time: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(DEFAULT_MAX_ENTRIES)
            .time_to_live(stale_time)
            .build();
        Self { cache }
    }

    /// Cached value for `key`, if fresh
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.cache.get(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                self.cache.invalidate(key).await;
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<(), ClientError> {
        self.cache.insert(key, serde_json::to_value(value)?).await;
        Ok(())
    }

    /// Return the cached value or run `fetch` and cache its result.
    ///
    /// Failed fetches are not cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(hit) = self.get(&key).await {
            tracing::trace!(key = %key, "Query cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.set(key, &value).await?;
        Ok(value)
    }

    /// Drop `key` and every key nested under it
    pub async fn invalidate(&self, key: &QueryKey) {
        let stale: Vec<QueryKey> = self
            .cache
            .iter()
            .filter(|(cached, _)| key.is_prefix_of(cached))
            .map(|(cached, _)| (*cached).clone())
            .collect();

        for cached in stale {
            self.cache.invalidate(&cached).await;
        }
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.cache.get(key).await.is_some()
    }
}

/// Admin API client whose reads go through a [`QueryCache`]
#[derive(Clone)]
pub struct CachedAdminApi {
    api: AdminApiClient,
    cache: QueryCache,
}

impl CachedAdminApi {
    pub fn new(api: AdminApiClient, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &AdminApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // Blog posts

    pub async fn blog_posts(&self) -> Result<Vec<BlogPost>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::blog_posts(), || self.api.list_posts())
            .await
    }

    pub async fn blog_post(&self, id: &str) -> Result<BlogPost, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::blog_post(id), || self.api.get_post(id))
            .await
    }

    pub async fn blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::blog_post_by_slug(slug), || {
                self.api.get_post_by_slug(slug)
            })
            .await
    }

    pub async fn create_blog_post(
        &self,
        input: &CreateBlogPostInput,
    ) -> Result<BlogPost, ClientError> {
        let post = self.api.create_post(input).await?;
        self.cache.invalidate(&QueryKey::blog_posts()).await;
        Ok(post)
    }

    pub async fn update_blog_post(
        &self,
        id: &str,
        input: &UpdateBlogPostInput,
    ) -> Result<BlogPost, ClientError> {
        let post = self.api.update_post(id, input).await?;
        self.cache.invalidate(&QueryKey::blog_posts()).await;
        self.cache.invalidate(&QueryKey::blog_post(id)).await;
        Ok(post)
    }

    pub async fn delete_blog_post(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_post(id).await?;
        self.cache.invalidate(&QueryKey::blog_posts()).await;
        self.cache.invalidate(&QueryKey::blog_post(id)).await;
        Ok(())
    }

    // Services

    pub async fn services(&self) -> Result<Vec<Service>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::services(), || self.api.list_services())
            .await
    }

    pub async fn service(&self, id: &str) -> Result<Service, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::service(id), || self.api.get_service(id))
            .await
    }

    pub async fn service_by_slug(&self, slug: &str) -> Result<Option<Service>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::service_by_slug(slug), || {
                self.api.get_service_by_slug(slug)
            })
            .await
    }

    pub async fn create_service(&self, input: &CreateServiceInput) -> Result<Service, ClientError> {
        let service = self.api.create_service(input).await?;
        self.cache.invalidate(&QueryKey::services()).await;
        Ok(service)
    }

    pub async fn update_service(
        &self,
        id: &str,
        input: &UpdateServiceInput,
    ) -> Result<Service, ClientError> {
        let service = self.api.update_service(id, input).await?;
        self.cache.invalidate(&QueryKey::services()).await;
        self.cache.invalidate(&QueryKey::service(id)).await;
        Ok(service)
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_service(id).await?;
        self.cache.invalidate(&QueryKey::services()).await;
        self.cache.invalidate(&QueryKey::service(id)).await;
        Ok(())
    }
}
