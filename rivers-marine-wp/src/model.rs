//! REST payloads that are not resolvable content
//!
//! Taxonomies, authors and media are looked up by id or slug but never
//! translated through the resolver, so they live here rather than in the
//! core crate.

use rivers_marine::{LISTING_PER_PAGE, RenderedTitle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    pub slug: String,
    #[serde(default)]
    pub avatar_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDetails {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub file: String,
}

/// An uploaded image or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedMedia {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: RenderedTitle,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub media_details: Option<MediaDetails>,
}

/// Filters accepted by collection endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub author: Option<u64>,
    pub tags: Option<u64>,
    pub categories: Option<u64>,
    pub page: u32,
    pub per_page: u32,
}

impl ListingQuery {
    /// Page size of paginated listings
    pub const DEFAULT_PER_PAGE: u32 = LISTING_PER_PAGE;
    /// Largest page size the REST API accepts; used for "all" listings
    pub const MAX_PER_PAGE: u32 = 100;

    /// First page of everything, at the largest page size
    pub fn all() -> Self {
        Self {
            per_page: Self::MAX_PER_PAGE,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Query-string pairs, without the locale
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(author) = self.author {
            params.push(("author", author.to_string()));
        }
        if let Some(tags) = self.tags {
            params.push(("tags", tags.to_string()));
        }
        if let Some(categories) = self.categories {
            params.push(("categories", categories.to_string()));
        }
        params
    }
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search: None,
            author: None,
            tags: None,
            categories: None,
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_query_defaults() {
        let params = ListingQuery::default().to_params();
        assert_eq!(
            params,
            vec![("per_page", "9".to_string()), ("page", "1".to_string())]
        );
    }

    #[test]
    fn test_listing_query_filters() {
        let params = ListingQuery {
            search: Some("tug".to_string()),
            categories: Some(4),
            ..ListingQuery::all()
        }
        .with_page(0)
        .to_params();
        assert!(params.contains(&("per_page", "100".to_string())));
        assert!(params.contains(&("page", "1".to_string())));
        assert!(params.contains(&("search", "tug".to_string())));
        assert!(params.contains(&("categories", "4".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "author"));
    }

    #[test]
    fn test_media_deserializes() {
        let media: FeaturedMedia = serde_json::from_value(json!({
            "id": 12,
            "title": { "rendered": "Tugboat at dock" },
            "alt_text": "Tugboat",
            "media_type": "image",
            "mime_type": "image/jpeg",
            "source_url": "https://cms.example/wp-content/uploads/tug.jpg",
            "media_details": { "width": 1200, "height": 800, "file": "tug.jpg", "sizes": {} }
        }))
        .unwrap();
        assert_eq!(media.media_details.map(|d| d.width), Some(1200));
    }
}
