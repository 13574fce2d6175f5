//! Blog post model
//!
//! This module provides:
//! - `BlogPost` entity as stored and served
//! - Input types for creating and updating posts
//! - `PostQuery` filter for list endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::serde_ext;

/// Blog post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Unique identifier (UUID)
    pub id: String,
    pub title: String,
    /// URL-friendly unique slug
    pub slug: String,
    /// Post body
    pub content: String,
    /// Short teaser shown on listing pages
    pub description: Option<String>,
    pub category: Option<String>,
    /// Author display name
    pub author: Option<String>,
    /// Human readable reading time, e.g. "5 min read"
    pub read_time: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    /// Cover image URL, omitted from JSON when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Ordered tag list, always emitted
    #[serde(default)]
    pub tags: Vec<String>,
    /// Admin who created the post
    #[serde(default)]
    pub created_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Build a new post from validated input
    pub fn from_input(input: CreateBlogPostInput, created_by_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            slug: input.slug,
            content: input.content,
            description: input.description,
            category: input.category,
            author: input.author,
            read_time: input.read_time,
            published: input.published,
            featured: input.featured,
            published_at: input.published_at,
            image: input.image,
            tags: input.tags,
            created_by_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; absent fields are left untouched.
    pub fn apply(&mut self, input: UpdateBlogPostInput) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(slug) = input.slug {
            self.slug = slug;
        }
        if let Some(content) = input.content {
            self.content = content;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(category) = input.category {
            self.category = category;
        }
        if let Some(author) = input.author {
            self.author = author;
        }
        if let Some(read_time) = input.read_time {
            self.read_time = read_time;
        }
        if let Some(published) = input.published {
            self.published = published;
        }
        if let Some(featured) = input.featured {
            self.featured = featured;
        }
        if let Some(published_at) = input.published_at {
            self.published_at = published_at;
        }
        if let Some(image) = input.image {
            self.image = image;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostInput {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default, deserialize_with = "serde_ext::optional_date")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating a post.
///
/// `None` leaves a field untouched; for nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPostInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(
        default,
        deserialize_with = "serde_ext::nullable_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(
        default,
        deserialize_with = "serde_ext::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "serde_ext::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "serde_ext::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "serde_ext::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub read_time: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "serde_ext::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Query string of post list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostQuery {
    /// Restrict to the post with this slug
    pub slug: Option<String>,
    /// Public listing only: restrict to featured posts
    pub featured: Option<bool>,
}
