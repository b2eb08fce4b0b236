//! Transfer shapes for the blog API.
//!
//! # Design
//! These types mirror the backend's JSON but are defined independently of
//! the mock-server crate; the integration tests catch schema drift. The
//! backend speaks snake_case; the camelCase spellings some frontends use
//! are accepted as aliases on input. Timestamps stay opaque strings because
//! the backend emits zone-less local date-times.

use serde::{Deserialize, Serialize};

use crate::related_links::{decode_related_links, RelatedLink};

/// A blog category as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "featuredImageUrl")]
    pub featured_image_url: Option<String>,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<String>,
    /// Published posts of this category, only present when fetched by slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostCard>>,
}

/// Post summary embedded in a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default, alias = "featuredImageUrl")]
    pub featured_image_url: Option<String>,
}

/// Snapshot of a post's category taken when the post was serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A blog post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "authorName")]
    pub author_name: Option<String>,
    #[serde(default, alias = "featuredImageUrl")]
    pub featured_image_url: Option<String>,
    pub category: CategoryRef,
    #[serde(default, alias = "metaDescription")]
    pub meta_description: Option<String>,
    #[serde(default, alias = "metaKeywords")]
    pub meta_keywords: Option<String>,
    #[serde(default, alias = "isPublished")]
    pub is_published: bool,
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<String>,
    /// Server-owned; only the track-view endpoint moves it.
    #[serde(default, alias = "viewCount")]
    pub view_count: u64,
    #[serde(default, alias = "relatedLinks")]
    pub related_links: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<String>,
}

impl Post {
    /// Decoded related links; never fails.
    pub fn related_links(&self) -> Vec<RelatedLink> {
        decode_related_links(self.related_links.as_deref())
    }
}

/// Request payload for creating a category. The backend derives the slug
/// from the name when it is omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Partial update for a category; omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Request payload for creating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_links: Option<String>,
}

/// Partial update for a post; omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_links: Option<String>,
}

/// Result of the track-view endpoint. `tracked: false` means the backend
/// rate-limited the increment; it is still a successful call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackViewResponse {
    pub tracked: bool,
    #[serde(default)]
    pub message: String,
}

/// Confirmation returned by the delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_JSON: &str = r#"{
        "id": 7,
        "title": "Haldi Ideas",
        "slug": "haldi-ideas",
        "excerpt": "Bright and yellow",
        "content": "<p>Marigolds</p>",
        "featured_image_url": "https://cdn.example.com/haldi.jpg",
        "category": {"id": 2, "name": "Decor", "slug": "decor"},
        "is_published": true,
        "published_at": "2024-01-15T10:30:00",
        "view_count": 5,
        "related_links": "[{\"url\":\"/a\",\"text\":\"A\"}]",
        "created_at": "2024-01-10T09:00:00",
        "updated_at": "2024-01-15T10:30:00"
    }"#;

    #[test]
    fn post_deserializes_from_backend_json() {
        let post: Post = serde_json::from_str(POST_JSON).unwrap();
        assert_eq!(post.slug, "haldi-ideas");
        assert_eq!(post.view_count, 5);
        assert_eq!(post.category.slug, "decor");
        assert!(post.is_published);
        assert!(post.meta_description.is_none());
        assert_eq!(
            post.related_links(),
            vec![RelatedLink::Link {
                url: "/a".to_string(),
                text: "A".to_string()
            }]
        );
    }

    #[test]
    fn post_accepts_camel_case_aliases() {
        let post: Post = serde_json::from_str(
            r#"{"id":1,"title":"T","slug":"t","category":{"id":1,"name":"C","slug":"c"},
                "isPublished":true,"viewCount":5,"featuredImageUrl":"/img.png"}"#,
        )
        .unwrap();
        assert_eq!(post.view_count, 5);
        assert!(post.is_published);
        assert_eq!(post.featured_image_url.as_deref(), Some("/img.png"));
    }

    #[test]
    fn category_posts_are_optional() {
        let category: Category = serde_json::from_str(
            r#"{"id":1,"name":"Decor","slug":"decor","is_active":true}"#,
        )
        .unwrap();
        assert!(category.posts.is_none());

        let category: Category = serde_json::from_str(
            r#"{"id":1,"name":"Decor","slug":"decor","is_active":true,
                "posts":[{"id":3,"title":"Haldi","slug":"haldi","featured_image_url":null}]}"#,
        )
        .unwrap();
        let posts = category.posts.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "haldi");
    }

    #[test]
    fn update_payloads_omit_unset_fields() {
        let update = UpdatePost {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"title": "New title"}));

        let json = serde_json::to_value(UpdateCategory::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn create_post_always_sends_title_and_category() {
        let create = CreatePost {
            title: "Mehendi".to_string(),
            category_id: 4,
            ..Default::default()
        };
        let json = serde_json::to_value(&create).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Mehendi", "category_id": 4}));
    }
}
