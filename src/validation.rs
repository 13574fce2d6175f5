//! Request body validation
//!
//! Each input type implements [`Validate`], collecting every rule violation
//! into a list of [`ValidationIssue`]s rather than stopping at the first one.
//! The API layer turns a failed validation into a 400 response carrying the
//! issue list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{
    CreateBlogPostInput, CreateServiceInput, LoginInput, RegisterInput, UpdateBlogPostInput,
    UpdateServiceInput,
};

/// Issue code for values below a minimum length or size
pub const CODE_TOO_SMALL: &str = "too_small";
/// Issue code for malformed strings (e.g. email)
pub const CODE_INVALID_STRING: &str = "invalid_string";
/// Issue code for bodies that are not valid JSON of the expected shape
pub const CODE_INVALID_BODY: &str = "invalid_body";
/// Issue code for query strings that do not fit the expected parameters
pub const CODE_INVALID_QUERY: &str = "invalid_query";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path to the offending field, e.g. `["features", "0"]`
    pub path: Vec<String>,
    pub message: String,
    pub code: String,
}

impl ValidationIssue {
    pub fn new(path: &[&str], message: impl Into<String>, code: &str) -> Self {
        Self {
            path: path.iter().map(|segment| segment.to_string()).collect(),
            message: message.into(),
            code: code.to_string(),
        }
    }

    /// Issue for a body that could not be parsed
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(&[], message, CODE_INVALID_BODY)
    }

    /// Issue for a query string that could not be parsed
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(&["query"], message, CODE_INVALID_QUERY)
    }
}

/// All issues found in one input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation error")]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

impl From<ValidationIssue> for ValidationErrors {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

/// Types that can check their own field rules
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Issue collector
#[derive(Debug, Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.0.push(ValidationIssue::new(
                &[field],
                format!("String must contain at least {} character(s)", min),
                CODE_TOO_SMALL,
            ));
        }
    }

    fn opt_min_len(&mut self, field: &str, value: Option<&String>, min: usize) {
        if let Some(value) = value {
            self.min_len(field, value, min);
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.0.push(ValidationIssue::new(&[field], "Invalid email", CODE_INVALID_STRING));
        }
    }

    /// Non-empty list whose items are all non-empty
    fn features(&mut self, field: &str, items: &[String]) {
        if items.is_empty() {
            self.0.push(ValidationIssue::new(
                &[field],
                "Array must contain at least 1 element(s)",
                CODE_TOO_SMALL,
            ));
        }
        for (index, item) in items.iter().enumerate() {
            if item.is_empty() {
                let index = index.to_string();
                self.0.push(ValidationIssue::new(
                    &[field, &index],
                    "String must contain at least 1 character(s)",
                    CODE_TOO_SMALL,
                ));
            }
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { issues: self.0 })
        }
    }
}

/// Check an email address
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = Issues::default();
        issues.email("email", &self.email);
        issues.min_len("password", &self.password, 8);
        issues.min_len("name", &self.name, 3);
        issues.finish()
    }
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = Issues::default();
        issues.email("email", &self.email);
        issues.min_len("password", &self.password, 8);
        issues.finish()
    }
}

impl Validate for CreateBlogPostInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = Issues::default();
        issues.min_len("title", &self.title, 3);
        issues.min_len("slug", &self.slug, 3);
        issues.min_len("content", &self.content, 1);
        issues.finish()
    }
}

impl Validate for UpdateBlogPostInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = Issues::default();
        issues.opt_min_len("title", self.title.as_ref(), 3);
        issues.opt_min_len("slug", self.slug.as_ref(), 3);
        issues.opt_min_len("content", self.content.as_ref(), 1);
        issues.finish()
    }
}

impl Validate for CreateServiceInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = Issues::default();
        issues.min_len("title", &self.title, 3);
        issues.min_len("slug", &self.slug, 1);
        issues.min_len("category", &self.category, 1);
        issues.min_len("summary", &self.summary, 1);
        issues.min_len("description", &self.description, 1);
        issues.min_len("icon", &self.icon, 1);
        issues.features("features", &self.features);
        issues.finish()
    }
}

impl Validate for UpdateServiceInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = Issues::default();
        issues.opt_min_len("title", self.title.as_ref(), 3);
        issues.opt_min_len("slug", self.slug.as_ref(), 1);
        issues.opt_min_len("category", self.category.as_ref(), 1);
        issues.opt_min_len("summary", self.summary.as_ref(), 1);
        issues.opt_min_len("description", self.description.as_ref(), 1);
        issues.opt_min_len("icon", self.icon.as_ref(), 1);
        if let Some(features) = &self.features {
            issues.features("features", features);
        }
        issues.finish()
    }
}

/// Parse a JSON request body, reporting syntax and type errors as issues
pub fn parse_json<T>(body: &[u8]) -> Result<T, ValidationErrors>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_slice(body)
        .map_err(|e| ValidationErrors::from(ValidationIssue::invalid_body(e.to_string())))
}
