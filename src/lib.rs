//! QSS admin - content administration backend for the QSS marketing site
//!
//! This library provides the admin REST API (accounts, sessions, blog posts,
//! service listings), its persistence layer, and a typed client with the
//! dashboard's auth and caching logic.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod validation;
