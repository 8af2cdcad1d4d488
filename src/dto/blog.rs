use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::BlogPostSummary;

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogPostList {
    pub items: Vec<BlogPostSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlogPostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBlogPostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub is_published: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}
