//! In-memory blog data and the backend's business rules.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default window during which repeated views of one post are not counted.
pub const DEFAULT_VIEW_COOLDOWN: Duration = Duration::from_millis(5000);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub featured_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostCard>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub featured_image_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A post as the API returns it, with its category denormalized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author_name: Option<String>,
    pub featured_image_url: Option<String>,
    pub category: CategorySummary,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_published: bool,
    pub published_at: Option<String>,
    pub view_count: u64,
    pub related_links: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug)]
struct PostRecord {
    id: i64,
    title: String,
    slug: String,
    excerpt: Option<String>,
    content: Option<String>,
    author_name: Option<String>,
    featured_image_url: Option<String>,
    category_id: i64,
    meta_description: Option<String>,
    meta_keywords: Option<String>,
    is_published: bool,
    published_at: Option<String>,
    view_count: u64,
    related_links: Option<String>,
    created_at: String,
    updated_at: String,
}

/// Body of category create and update requests. Every field is optional on
/// the wire; create requires `name`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "featuredImageUrl")]
    pub featured_image_url: Option<String>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

/// Body of post create and update requests. Create requires `title` and
/// `category_id`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<i64>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[serde(alias = "authorName")]
    pub author_name: Option<String>,
    #[serde(alias = "featuredImageUrl")]
    pub featured_image_url: Option<String>,
    #[serde(alias = "metaDescription")]
    pub meta_description: Option<String>,
    #[serde(alias = "metaKeywords")]
    pub meta_keywords: Option<String>,
    #[serde(alias = "isPublished")]
    pub is_published: Option<bool>,
    #[serde(alias = "relatedLinks")]
    pub related_links: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required field is missing or blank.
    #[error("{message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Rule violation other than a slug conflict.
    #[error("{0}")]
    Rejected(String),
}

/// Lowercase, keep `[a-z0-9]`, whitespace and `-`, turn whitespace runs into
/// single dashes and trim dashes from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

fn now() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug)]
pub struct Store {
    categories: BTreeMap<i64, Category>,
    posts: BTreeMap<i64, PostRecord>,
    next_category_id: i64,
    next_post_id: i64,
    view_cooldown: Duration,
    last_view: HashMap<i64, Instant>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_COOLDOWN)
    }
}

impl Store {
    pub fn new(view_cooldown: Duration) -> Self {
        Self {
            categories: BTreeMap::new(),
            posts: BTreeMap::new(),
            next_category_id: 1,
            next_post_id: 1,
            view_cooldown,
            last_view: HashMap::new(),
        }
    }

    // --- categories ---

    pub fn create_category(&mut self, input: CategoryInput) -> Result<Category, StoreError> {
        let name = non_blank(input.name).ok_or(StoreError::Invalid {
            field: "name",
            message: "Category name is required",
        })?;
        let slug = non_blank(input.slug).unwrap_or_else(|| slugify(&name));
        if slug.is_empty() {
            return Err(StoreError::Rejected(
                "Cannot generate slug from empty text".to_string(),
            ));
        }
        if self.category_by_slug(&slug).is_some() {
            return Err(StoreError::Conflict(format!(
                "Category with slug '{slug}' already exists"
            )));
        }

        let id = self.next_category_id;
        self.next_category_id += 1;
        let ts = now();
        let category = Category {
            id,
            name,
            slug,
            description: input.description,
            featured_image_url: input.featured_image_url,
            is_active: input.is_active.unwrap_or(true),
            created_at: ts.clone(),
            updated_at: ts,
            posts: None,
        };
        self.categories.insert(id, category.clone());
        Ok(category)
    }

    pub fn active_categories(&self) -> Vec<Category> {
        self.categories
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect()
    }

    pub fn all_categories(&self) -> Vec<Category> {
        self.categories.values().cloned().collect()
    }

    /// Category with its published posts embedded, newest first.
    pub fn category_with_posts(&self, slug: &str) -> Result<Category, StoreError> {
        let category = self
            .category_by_slug(slug)
            .ok_or_else(|| StoreError::NotFound(format!("Category not found with slug: {slug}")))?;
        let cards = self
            .published_in(category.id)
            .into_iter()
            .map(|p| PostCard {
                id: p.id,
                title: p.title.clone(),
                slug: p.slug.clone(),
                featured_image_url: p.featured_image_url.clone(),
            })
            .collect();
        Ok(Category {
            posts: Some(cards),
            ..category.clone()
        })
    }

    pub fn category(&self, id: i64) -> Result<Category, StoreError> {
        self.categories
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Category not found with id: {id}")))
    }

    pub fn update_category(&mut self, id: i64, input: CategoryInput) -> Result<Category, StoreError> {
        if !self.categories.contains_key(&id) {
            return Err(StoreError::NotFound(format!("Category not found with id: {id}")));
        }
        if let Some(slug) = &input.slug {
            if self.category_by_slug(slug).is_some_and(|c| c.id != id) {
                return Err(StoreError::Conflict(format!(
                    "Category with slug '{slug}' already exists"
                )));
            }
        }

        let category = self
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Category not found with id: {id}")))?;
        if let Some(name) = input.name {
            category.name = name;
        }
        if let Some(slug) = input.slug {
            category.slug = slug;
        }
        if let Some(description) = input.description {
            category.description = Some(description);
        }
        if let Some(url) = input.featured_image_url {
            category.featured_image_url = Some(url);
        }
        if let Some(active) = input.is_active {
            category.is_active = active;
        }
        category.updated_at = now();
        Ok(category.clone())
    }

    pub fn delete_category(&mut self, id: i64) -> Result<(), StoreError> {
        if !self.categories.contains_key(&id) {
            return Err(StoreError::NotFound(format!("Category not found with id: {id}")));
        }
        if self.posts.values().any(|p| p.category_id == id) {
            return Err(StoreError::Rejected(
                "Cannot delete category with existing posts. Please delete or move posts first."
                    .to_string(),
            ));
        }
        self.categories.remove(&id);
        Ok(())
    }

    fn category_by_slug(&self, slug: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.slug == slug)
    }

    // --- posts ---

    pub fn create_post(&mut self, input: PostInput) -> Result<Post, StoreError> {
        let title = non_blank(input.title).ok_or(StoreError::Invalid {
            field: "title",
            message: "Title is required",
        })?;
        let category_id = input.category_id.ok_or(StoreError::Invalid {
            field: "category_id",
            message: "Category ID is required",
        })?;
        if !self.categories.contains_key(&category_id) {
            return Err(StoreError::NotFound(format!(
                "Category not found with id: {category_id}"
            )));
        }
        let slug = non_blank(input.slug).unwrap_or_else(|| slugify(&title));
        if slug.is_empty() {
            return Err(StoreError::Rejected(
                "Cannot generate slug from empty text".to_string(),
            ));
        }
        if self.post_by_slug(&slug).is_some() {
            return Err(StoreError::Conflict(format!(
                "Post with slug '{slug}' already exists"
            )));
        }

        let id = self.next_post_id;
        self.next_post_id += 1;
        let ts = now();
        let is_published = input.is_published.unwrap_or(false);
        let record = PostRecord {
            id,
            title,
            slug,
            excerpt: input.excerpt,
            content: input.content,
            author_name: input.author_name,
            featured_image_url: input.featured_image_url,
            category_id,
            meta_description: input.meta_description,
            meta_keywords: input.meta_keywords,
            is_published,
            published_at: is_published.then(|| ts.clone()),
            view_count: 0,
            related_links: input.related_links,
            created_at: ts.clone(),
            updated_at: ts,
        };
        self.posts.insert(id, record.clone());
        Ok(self.present(&record))
    }

    pub fn published_posts(&self) -> Vec<Post> {
        let mut posts: Vec<&PostRecord> = self.posts.values().filter(|p| p.is_published).collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.into_iter().map(|p| self.present(p)).collect()
    }

    pub fn all_posts(&self) -> Vec<Post> {
        self.posts.values().map(|p| self.present(p)).collect()
    }

    /// Published post by slug; drafts are indistinguishable from missing.
    pub fn published_post(&self, slug: &str) -> Result<Post, StoreError> {
        match self.post_by_slug(slug) {
            Some(p) if p.is_published => Ok(self.present(p)),
            Some(_) => Err(StoreError::NotFound(
                "Post not found or not published".to_string(),
            )),
            None => Err(StoreError::NotFound(format!("Post not found with slug: {slug}"))),
        }
    }

    pub fn post(&self, id: i64) -> Result<Post, StoreError> {
        self.posts
            .get(&id)
            .map(|p| self.present(p))
            .ok_or_else(|| StoreError::NotFound(format!("Post not found with id: {id}")))
    }

    pub fn posts_in_category(&self, category_slug: &str) -> Result<Vec<Post>, StoreError> {
        let category = self.category_by_slug(category_slug).ok_or_else(|| {
            StoreError::NotFound(format!("Category not found with slug: {category_slug}"))
        })?;
        Ok(self
            .published_in(category.id)
            .into_iter()
            .map(|p| self.present(p))
            .collect())
    }

    pub fn update_post(&mut self, id: i64, input: PostInput) -> Result<Post, StoreError> {
        if !self.posts.contains_key(&id) {
            return Err(StoreError::NotFound(format!("Post not found with id: {id}")));
        }
        if let Some(slug) = &input.slug {
            if self.post_by_slug(slug).is_some_and(|p| p.id != id) {
                return Err(StoreError::Conflict(format!(
                    "Post with slug '{slug}' already exists"
                )));
            }
        }
        if let Some(category_id) = input.category_id {
            if !self.categories.contains_key(&category_id) {
                return Err(StoreError::NotFound(format!(
                    "Category not found with id: {category_id}"
                )));
            }
        }

        let record = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Post not found with id: {id}")))?;
        if let Some(title) = input.title {
            record.title = title;
        }
        if let Some(slug) = input.slug {
            record.slug = slug;
        }
        if let Some(excerpt) = input.excerpt {
            record.excerpt = Some(excerpt);
        }
        if let Some(content) = input.content {
            record.content = Some(content);
        }
        if let Some(url) = input.featured_image_url {
            record.featured_image_url = Some(url);
        }
        if let Some(author) = input.author_name {
            record.author_name = Some(author);
        }
        if let Some(category_id) = input.category_id {
            record.category_id = category_id;
        }
        if let Some(description) = input.meta_description {
            record.meta_description = Some(description);
        }
        if let Some(keywords) = input.meta_keywords {
            record.meta_keywords = Some(keywords);
        }
        if let Some(links) = input.related_links {
            record.related_links = Some(links);
        }
        let ts = now();
        if let Some(publish) = input.is_published {
            match (record.is_published, publish) {
                (false, true) => record.published_at = Some(ts.clone()),
                (true, false) => record.published_at = None,
                _ => {}
            }
            record.is_published = publish;
        }
        record.updated_at = ts;

        let record = record.clone();
        Ok(self.present(&record))
    }

    pub fn delete_post(&mut self, id: i64) -> Result<(), StoreError> {
        self.posts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Post not found with id: {id}")))
    }

    /// Count one view of the post unless it was counted within the
    /// cooldown window. Returns whether the counter moved.
    ///
    /// The window is keyed by post, not by viewer.
    pub fn track_view(&mut self, slug: &str) -> Result<bool, StoreError> {
        let (id, published) = self
            .post_by_slug(slug)
            .map(|p| (p.id, p.is_published))
            .ok_or_else(|| StoreError::NotFound(format!("Post not found with slug: {slug}")))?;
        if !published {
            return Ok(false);
        }

        let now = Instant::now();
        if let Some(last) = self.last_view.get(&id) {
            if now.duration_since(*last) < self.view_cooldown {
                return Ok(false);
            }
        }

        if let Some(record) = self.posts.get_mut(&id) {
            record.view_count += 1;
        }
        self.last_view.insert(id, now);
        let cooldown = self.view_cooldown;
        self.last_view
            .retain(|_, last| now.duration_since(*last) <= cooldown);
        Ok(true)
    }

    fn post_by_slug(&self, slug: &str) -> Option<&PostRecord> {
        self.posts.values().find(|p| p.slug == slug)
    }

    fn published_in(&self, category_id: i64) -> Vec<&PostRecord> {
        let mut posts: Vec<&PostRecord> = self
            .posts
            .values()
            .filter(|p| p.category_id == category_id && p.is_published)
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts
    }

    fn present(&self, record: &PostRecord) -> Post {
        let category = self
            .categories
            .get(&record.category_id)
            .map(|c| CategorySummary {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
            })
            .unwrap_or(CategorySummary {
                id: record.category_id,
                name: String::new(),
                slug: String::new(),
            });
        Post {
            id: record.id,
            title: record.title.clone(),
            slug: record.slug.clone(),
            excerpt: record.excerpt.clone(),
            content: record.content.clone(),
            author_name: record.author_name.clone(),
            featured_image_url: record.featured_image_url.clone(),
            category,
            meta_description: record.meta_description.clone(),
            meta_keywords: record.meta_keywords.clone(),
            is_published: record.is_published,
            published_at: record.published_at.clone(),
            view_count: record.view_count,
            related_links: record.related_links.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }
}
