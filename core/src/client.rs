//! Typed endpoint catalog for the blog API.
//!
//! # Design
//! `BlogClient` holds a `RequestPipeline` and nothing else; there is no
//! cache and no state between calls. Each method is a fixed path template
//! and method over the pipeline. Public read paths are keyed by slug, admin
//! mutations by numeric id. Inputs are not validated locally; the backend
//! is the authority and its rejections come back as `ApiError`.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::pipeline::RequestPipeline;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    Category, CreateCategory, CreatePost, DeleteResponse, Post, TrackViewResponse,
    UpdateCategory, UpdatePost,
};

/// Async client for the blog categories and posts API.
#[derive(Debug, Clone)]
pub struct BlogClient<T> {
    pipeline: RequestPipeline<T>,
}

impl BlogClient<ReqwestTransport> {
    /// Build a client over `reqwest` from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = match config.timeout {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::default(),
        };
        Ok(Self::new(&config.base_url, transport))
    }
}

impl<T> BlogClient<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            pipeline: RequestPipeline::new(base_url, transport),
        }
    }

    pub fn pipeline(&self) -> &RequestPipeline<T> {
        &self.pipeline
    }
}

fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

fn to_body<B: Serialize>(input: &B) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::Serialization {
        message: e.to_string(),
    })
}

impl<T: Transport> BlogClient<T> {
    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// All active categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Get, "/categories", None)
            .await
    }

    /// All categories including inactive ones.
    pub async fn list_all_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Get, "/categories/all", None)
            .await
    }

    /// A category with its published posts embedded.
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, ApiError> {
        let endpoint = format!("/categories/slug/{}", segment(slug));
        self.pipeline
            .request_as(HttpMethod::Get, &endpoint, None)
            .await
    }

    pub async fn get_category_by_id(&self, id: i64) -> Result<Category, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Get, &format!("/categories/{id}"), None)
            .await
    }

    pub async fn create_category(&self, input: &CreateCategory) -> Result<Category, ApiError> {
        let body = to_body(input)?;
        self.pipeline
            .request_as(HttpMethod::Post, "/categories", Some(&body))
            .await
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: &UpdateCategory,
    ) -> Result<Category, ApiError> {
        let body = to_body(input)?;
        self.pipeline
            .request_as(HttpMethod::Put, &format!("/categories/{id}"), Some(&body))
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<DeleteResponse, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Delete, &format!("/categories/{id}"), None)
            .await
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// All published posts.
    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Get, "/posts", None)
            .await
    }

    /// All posts including unpublished ones.
    pub async fn list_all_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Get, "/posts/all", None)
            .await
    }

    /// A published post. Does not count as a view; see `track_post_view`.
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        let endpoint = format!("/posts/slug/{}", segment(slug));
        self.pipeline
            .request_as(HttpMethod::Get, &endpoint, None)
            .await
    }

    pub async fn get_post_by_id(&self, id: i64) -> Result<Post, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Get, &format!("/posts/{id}"), None)
            .await
    }

    /// Published posts of the category with `category_slug`.
    pub async fn list_posts_by_category(&self, category_slug: &str) -> Result<Vec<Post>, ApiError> {
        let endpoint = format!("/posts/category/{}", segment(category_slug));
        self.pipeline
            .request_as(HttpMethod::Get, &endpoint, None)
            .await
    }

    pub async fn create_post(&self, input: &CreatePost) -> Result<Post, ApiError> {
        let body = to_body(input)?;
        self.pipeline
            .request_as(HttpMethod::Post, "/posts", Some(&body))
            .await
    }

    pub async fn update_post(&self, id: i64, input: &UpdatePost) -> Result<Post, ApiError> {
        let body = to_body(input)?;
        self.pipeline
            .request_as(HttpMethod::Put, &format!("/posts/{id}"), Some(&body))
            .await
    }

    pub async fn delete_post(&self, id: i64) -> Result<DeleteResponse, ApiError> {
        self.pipeline
            .request_as(HttpMethod::Delete, &format!("/posts/{id}"), None)
            .await
    }

    /// Ask the backend to count one view of the post.
    ///
    /// The backend may rate-limit the increment and answer `tracked: false`.
    pub async fn track_post_view(&self, slug: &str) -> Result<TrackViewResponse, ApiError> {
        let endpoint = format!("/posts/slug/{}/view", segment(slug));
        self.pipeline
            .request_as(HttpMethod::Post, &endpoint, None)
            .await
    }
}
