//! Content source trait
//!
//! This module defines the `ContentSource` trait the resolver and listing
//! pages consume, so the core logic never depends on a concrete CMS client.
//! The WordPress REST client and the in-memory [`MemorySource`] both
//! implement it.
//!
//! # Example
//!
//! ```ignore
//! use rivers_marine::{ContentSource, Locale, Vessel};
//!
//! async fn first_vessel(source: &dyn ContentSource<Vessel>) -> ContentResult<Option<Vessel>> {
//!     let vessels = source.fetch_all(Locale::En).await?;
//!     Ok(vessels.into_iter().next())
//! }
//! ```
//!
//! [`MemorySource`]: crate::memory::MemorySource

use async_trait::async_trait;

use crate::entity::{Page, Post, Vessel};
use crate::error::ContentResult;
use crate::locale::Locale;

/// Fetches entities of one content kind, scoped to a locale
///
/// "Not found" is `Ok(None)`; `Err` is reserved for upstream failures,
/// which callers propagate rather than retry.
#[async_trait]
pub trait ContentSource<T>: Send + Sync {
    /// Look up the entity published under `slug` in `locale`
    async fn fetch_by_slug(&self, slug: &str, locale: Locale) -> ContentResult<Option<T>>;

    /// Look up an entity by its numeric id
    async fn fetch_by_id(&self, id: u64, locale: Locale) -> ContentResult<Option<T>>;

    /// Every entity of this kind published in `locale`
    async fn fetch_all(&self, locale: Locale) -> ContentResult<Vec<T>>;

    /// Name of the backing source, for logs
    fn source_name(&self) -> &str;
}

/// A source able to serve every content kind the site renders
pub trait SiteContent: ContentSource<Page> + ContentSource<Post> + ContentSource<Vessel> {}

impl<S> SiteContent for S where S: ContentSource<Page> + ContentSource<Post> + ContentSource<Vessel> {}
