//! Async client core for the blog categories and posts API.
//!
//! # Overview
//! Typed calls ("fetch category by slug", "record a view") become JSON HTTP
//! requests against the blog backend. Every failure comes back as one
//! normalized `ApiError`, and `ViewTracker` makes sure a page visit counts
//! at most one view however often the hosting page reloads.
//!
//! # Design
//! - `Transport` is the only I/O seam; `ReqwestTransport` is the default.
//! - `RequestPipeline` builds requests and normalizes responses as plain
//!   data, so both halves are testable without a server.
//! - `BlogClient` is one fixed path and method per backend operation and
//!   keeps no state between calls.
//! - `PageVisit` is the per-visit idempotency guard; it is passed in by the
//!   caller and never global.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod related_links;
pub mod tracker;
pub mod transport;
pub mod types;

pub use client::BlogClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pipeline::RequestPipeline;
pub use related_links::{decode_related_links, RelatedLink};
pub use tracker::{PageVisit, PostLoad, ViewTracker};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Category, CategoryRef, CreateCategory, CreatePost, DeleteResponse, Post, PostCard,
    TrackViewResponse, UpdateCategory, UpdatePost,
};
