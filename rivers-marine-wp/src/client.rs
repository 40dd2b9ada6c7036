//! WordPress REST API client
//!
//! Fetches pages, posts, vessels and their taxonomies from a WordPress site
//! running Polylang. Every localized request carries `lang=<locale>`; media
//! lookups are not localized.
//!
//! # Configuration
//!
//! The client reads the site URL from the `WORDPRESS_URL` environment
//! variable (e.g. `https://cms.riversmarine.net`).
//!
//! # Example
//!
//! ```ignore
//! use rivers_marine::{Locale, Resolver, Vessel};
//! use rivers_marine_wp::WordPressClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WordPressClient::from_env()?;
//!
//!     let vessel = client.by_slug::<Vessel>("tugboat-1", Locale::En).await?;
//!     println!("{:?}", vessel.map(|v| v.title.rendered));
//!
//!     let resolution = Resolver::new(&client)
//!         .resolve_routable::<Vessel>("tugboat-1", Locale::Es)
//!         .await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use rivers_marine::{ContentResult, ContentSource, Locale, Page, Paginated, Post, Vessel};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{WpError, WpResult};
use crate::model::{Author, Category, FeaturedMedia, ListingQuery, Tag};

const USER_AGENT: &str = "rivers-marine WordPress client";
const API_PREFIX: &str = "/wp-json/wp/v2";

/// A REST collection the client can fetch
pub trait WpResource: DeserializeOwned + Send {
    /// Collection name under `/wp-json/wp/v2`
    const ENDPOINT: &'static str;
    /// Whether requests carry the `lang` parameter
    const LOCALIZED: bool = true;

    fn path() -> String {
        format!("{}/{}", API_PREFIX, Self::ENDPOINT)
    }
}

impl WpResource for Post {
    const ENDPOINT: &'static str = "posts";
}

impl WpResource for Page {
    const ENDPOINT: &'static str = "pages";
}

impl WpResource for Vessel {
    const ENDPOINT: &'static str = "vessel";
}

impl WpResource for Category {
    const ENDPOINT: &'static str = "categories";
}

impl WpResource for Tag {
    const ENDPOINT: &'static str = "tags";
}

impl WpResource for Author {
    const ENDPOINT: &'static str = "users";
}

impl WpResource for FeaturedMedia {
    const ENDPOINT: &'static str = "media";
    const LOCALIZED: bool = false;
}

/// Client for one WordPress site
#[derive(Clone)]
pub struct WordPressClient {
    /// Site URL without trailing slash
    base_url: String,
    client: reqwest::Client,
}

impl WordPressClient {
    /// Create a client for the site at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `WpError::Config` if the URL is empty and `WpError::Network`
    /// if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> WpResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(WpError::Config("WordPress URL cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Create a client from the `WORDPRESS_URL` environment variable
    pub fn from_env() -> WpResult<Self> {
        let base_url = std::env::var("WORDPRESS_URL").map_err(|_| {
            WpError::Config("WORDPRESS_URL environment variable not set".to_string())
        })?;
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of a collection, with pagination totals
    pub async fn list<R: WpResource>(
        &self,
        query: &ListingQuery,
        locale: Locale,
    ) -> WpResult<Paginated<R>> {
        let path = R::path();
        let response = self
            .send(&path, &query.to_params(), R::LOCALIZED.then_some(locale))
            .await?;
        let (total, total_pages) = pagination_totals(response.headers());
        let items = decode(&path, response).await?;
        Ok(Paginated {
            items,
            page: query.page,
            total,
            total_pages,
        })
    }

    /// Everything in a collection, fetched as one page of the largest size
    pub async fn all<R: WpResource>(&self, locale: Locale) -> WpResult<Vec<R>> {
        Ok(self.list(&ListingQuery::all(), locale).await?.items)
    }

    /// The item published under `slug`, if any
    pub async fn by_slug<R: WpResource>(&self, slug: &str, locale: Locale) -> WpResult<Option<R>> {
        let path = R::path();
        let response = self
            .send(&path, &[("slug", slug.to_string())], R::LOCALIZED.then_some(locale))
            .await?;
        let items: Vec<R> = decode(&path, response).await?;
        Ok(items.into_iter().next())
    }

    /// The item with `id`; a 404 is absence, not an error
    pub async fn by_id<R: WpResource>(&self, id: u64, locale: Locale) -> WpResult<Option<R>> {
        let path = format!("{}/{}", R::path(), id);
        match self.send(&path, &[], R::LOCALIZED.then_some(locale)).await {
            Ok(response) => decode(&path, response).await.map(Some),
            Err(WpError::Api { status: 404, .. }) => {
                debug!(path, "Item not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Every slug in a collection, walking all pages
    pub async fn all_slugs<R: WpResource>(&self, locale: Locale) -> WpResult<Vec<String>> {
        #[derive(Deserialize)]
        struct SlugOnly {
            slug: String,
        }

        let path = R::path();
        let mut slugs = Vec::new();
        let mut page = 1u32;

        loop {
            let mut params = ListingQuery::all().with_page(page).to_params();
            params.push(("_fields", "slug".to_string()));

            let response = self
                .send(&path, &params, R::LOCALIZED.then_some(locale))
                .await?;
            let (_, total_pages) = pagination_totals(response.headers());
            let items: Vec<SlugOnly> = decode(&path, response).await?;
            slugs.extend(items.into_iter().map(|item| item.slug));

            if u64::from(page) >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(slugs)
    }

    async fn send(
        &self,
        path: &str,
        params: &[(&str, String)],
        locale: Option<Locale>,
    ) -> WpResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let query = localized_params(params, locale);
        debug!(url, ?query, "WordPress request");

        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            if status != StatusCode::NOT_FOUND {
                warn!(url, status = status.as_u16(), "WordPress API error");
            }
            return Err(WpError::Api {
                status: status.as_u16(),
                endpoint: path.to_string(),
                message,
            });
        }

        Ok(response)
    }
}

impl std::fmt::Debug for WordPressClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordPressClient")
            .field("base_url", &self.base_url)
            .field("user_agent", &USER_AGENT)
            .finish()
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> WpResult<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| WpError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Request parameters plus `lang` when the request is localized
fn localized_params(params: &[(&str, String)], locale: Option<Locale>) -> Vec<(String, String)> {
    let mut query: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    if let Some(locale) = locale {
        query.push(("lang".to_string(), locale.as_str().to_string()));
    }
    query
}

/// `X-WP-Total` and `X-WP-TotalPages`; missing or malformed headers read as 0
fn pagination_totals(headers: &HeaderMap) -> (u64, u64) {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    };
    (read("X-WP-Total"), read("X-WP-TotalPages"))
}

macro_rules! content_source {
    ($($kind:ty),* $(,)?) => {
        $(
            #[async_trait]
            impl ContentSource<$kind> for WordPressClient {
                async fn fetch_by_slug(&self, slug: &str, locale: Locale) -> ContentResult<Option<$kind>> {
                    Ok(self.by_slug::<$kind>(slug, locale).await?)
                }

                async fn fetch_by_id(&self, id: u64, locale: Locale) -> ContentResult<Option<$kind>> {
                    Ok(self.by_id::<$kind>(id, locale).await?)
                }

                async fn fetch_all(&self, locale: Locale) -> ContentResult<Vec<$kind>> {
                    Ok(self.all::<$kind>(locale).await?)
                }

                fn source_name(&self) -> &str {
                    "WordPress"
                }
            }
        )*
    };
}

content_source!(Page, Post, Vessel);

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = WordPressClient::new("https://cms.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://cms.example.com");
    }

    #[test]
    fn test_new_rejects_empty_url() {
        assert!(matches!(
            WordPressClient::new("  "),
            Err(WpError::Config(_))
        ));
    }

    #[test]
    fn test_debug_output() {
        let client = WordPressClient::new("https://cms.example.com").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("https://cms.example.com"));
        assert!(debug.contains(USER_AGENT));
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(Vessel::path(), "/wp-json/wp/v2/vessel");
        assert_eq!(Page::path(), "/wp-json/wp/v2/pages");
        assert_eq!(Author::path(), "/wp-json/wp/v2/users");
        assert_eq!(Category::path(), "/wp-json/wp/v2/categories");
    }

    #[test]
    fn test_lang_param_only_when_localized() {
        let params = [("slug", "tugboat-1".to_string())];
        let localized = localized_params(&params, Vessel::LOCALIZED.then_some(Locale::Es));
        assert_eq!(
            localized,
            vec![
                ("slug".to_string(), "tugboat-1".to_string()),
                ("lang".to_string(), "es".to_string())
            ]
        );

        let media = localized_params(&[], FeaturedMedia::LOCALIZED.then_some(Locale::Es));
        assert!(media.is_empty());
    }

    #[test]
    fn test_pagination_totals() {
        let mut headers = HeaderMap::new();
        headers.insert("X-WP-Total", HeaderValue::from_static("42"));
        headers.insert("X-WP-TotalPages", HeaderValue::from_static("5"));
        assert_eq!(pagination_totals(&headers), (42, 5));

        let mut malformed = HeaderMap::new();
        malformed.insert("X-WP-Total", HeaderValue::from_static("lots"));
        assert_eq!(pagination_totals(&malformed), (0, 0));
    }
}
