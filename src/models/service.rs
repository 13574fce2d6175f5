//! Service listing model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A service offering shown on the marketing site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    /// URL-friendly unique slug
    pub slug: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    /// Icon identifier understood by the frontend
    pub icon: String,
    /// Ordered feature bullet points
    #[serde(default)]
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Build a new service from validated input
    pub fn from_input(input: CreateServiceInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            slug: input.slug,
            category: input.category,
            summary: input.summary,
            description: input.description,
            icon: input.icon,
            features: input.features,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; absent fields are left untouched.
    pub fn apply(&mut self, input: UpdateServiceInput) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(slug) = input.slug {
            self.slug = slug;
        }
        if let Some(category) = input.category {
            self.category = category;
        }
        if let Some(summary) = input.summary {
            self.summary = summary;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(icon) = input.icon {
            self.icon = icon;
        }
        if let Some(features) = input.features {
            self.features = features;
        }
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

fn default_active() -> bool {
    true
}

/// Input for creating a service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceInput {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    pub icon: String,
    pub features: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Input for updating a service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Query string of `GET /services`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceQuery {
    pub slug: Option<String>,
}
