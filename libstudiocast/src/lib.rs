//! Studiocast - publish one post to many social platforms
//!
//! This library holds the publishing pipeline behind the Studiocast API:
//! platform adapters for LinkedIn, Twitter/X, Facebook Pages and Instagram
//! Business, the OAuth token lifecycle, account resolution, and the
//! orchestrator that fans a post out and records per-platform results.

pub mod accounts;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod platforms;
pub mod poster;
pub mod scheduling;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{Result, StudioError};
pub use platforms::{AdapterRegistry, PlatformAdapter, PublishRequest};
pub use service::StudioService;
pub use types::{AccountSummary, Platform, PlatformPublishResult, Post, PostStatus, SocialAccount};
