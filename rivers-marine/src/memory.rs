//! In-memory content source
//!
//! A deterministic, network-free [`ContentSource`] used by the test suite and
//! by the binaries' offline fixture mode. It can also simulate upstream
//! failures and latency.
//!
//! # Example
//!
//! ```ignore
//! use rivers_marine::{Locale, MemorySource, Vessel};
//!
//! let mut source = MemorySource::new();
//! source.insert(Locale::En, vessel);
//! let found = source.fetch_by_slug("tugboat-1", Locale::En).await?;
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::entity::{Entity, Page, Post, Vessel};
use crate::error::{ContentError, ContentResult};
use crate::locale::{LOCALES, Locale};
use crate::source::ContentSource;

/// Behaviour of a [`MemorySource`]
#[derive(Debug, Clone, Default)]
pub enum MemoryMode {
    /// Serve stored entities
    #[default]
    Serve,
    /// Fail every fetch as an upstream 5xx would
    Unavailable(String),
}

/// Entities of one content kind, bucketed by the locale they are listed under
#[derive(Debug)]
pub struct MemorySource<T> {
    entries: Vec<(Locale, T)>,
    mode: MemoryMode,
    delay_ms: u64,
    fetches: AtomicUsize,
}

impl<T> MemorySource<T>
where
    T: Entity + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            mode: MemoryMode::Serve,
            delay_ms: 0,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_mode(mut self, mode: MemoryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Simulated latency applied to every fetch
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// List `entity` under `locale`
    pub fn insert(&mut self, locale: Locale, entity: T) -> &mut Self {
        self.entries.push((locale, entity));
        self
    }

    /// List a locale-agnostic entity under every supported locale
    pub fn insert_everywhere(&mut self, entity: T) -> &mut Self {
        for locale in LOCALES {
            self.entries.push((locale, entity.clone()));
        }
        self
    }

    /// Number of fetch calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn begin_fetch(&self) -> ContentResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        match &self.mode {
            MemoryMode::Serve => Ok(()),
            MemoryMode::Unavailable(message) => Err(ContentError::Upstream {
                status: 503,
                endpoint: "memory".to_string(),
                message: message.clone(),
            }),
        }
    }
}

#[async_trait]
impl<T> ContentSource<T> for MemorySource<T>
where
    T: Entity + Clone + Send + Sync,
{
    async fn fetch_by_slug(&self, slug: &str, locale: Locale) -> ContentResult<Option<T>> {
        self.begin_fetch().await?;
        Ok(self
            .entries
            .iter()
            .find(|(listed, entity)| *listed == locale && entity.slug() == slug)
            .map(|(_, entity)| entity.clone()))
    }

    /// Ids are global in the CMS, so the locale does not narrow the lookup
    async fn fetch_by_id(&self, id: u64, _locale: Locale) -> ContentResult<Option<T>> {
        self.begin_fetch().await?;
        Ok(self
            .entries
            .iter()
            .find(|(_, entity)| entity.id() == id)
            .map(|(_, entity)| entity.clone()))
    }

    async fn fetch_all(&self, locale: Locale) -> ContentResult<Vec<T>> {
        self.begin_fetch().await?;
        Ok(self
            .entries
            .iter()
            .filter(|(listed, _)| *listed == locale)
            .map(|(_, entity)| entity.clone())
            .collect())
    }

    fn source_name(&self) -> &str {
        "Memory"
    }
}

/// In-memory stand-in for the whole CMS
#[derive(Debug)]
pub struct MemorySite {
    pub pages: MemorySource<Page>,
    pub posts: MemorySource<Post>,
    pub vessels: MemorySource<Vessel>,
}

impl<T> Default for MemorySource<T>
where
    T: Entity + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl Default for MemorySite {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySite {
    pub fn new() -> Self {
        Self {
            pages: MemorySource::new(),
            posts: MemorySource::new(),
            vessels: MemorySource::new(),
        }
    }

    /// Build a site from a JSON fixture document
    pub fn from_json(json: &str) -> ContentResult<Self> {
        let fixtures: HashMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| ContentError::Decode(format!("Invalid fixture document: {}", e)))?;

        let mut site = MemorySite::new();
        for (code, bucket) in fixtures {
            let locale: Locale = code.parse().map_err(|_| {
                ContentError::Decode(format!("Fixtures use unsupported locale '{}'", code))
            })?;
            let bucket: FixtureBucket = serde_json::from_value(bucket).map_err(|e| {
                ContentError::Decode(format!("Invalid fixtures for locale '{}': {}", locale, e))
            })?;
            for page in bucket.pages {
                site.pages.insert(locale, page);
            }
            for post in bucket.posts {
                site.posts.insert(locale, post);
            }
            for vessel in bucket.vessels {
                site.vessels.insert(locale, vessel);
            }
        }
        Ok(site)
    }

    /// Load a fixture document from disk
    pub fn from_file(path: &Path) -> ContentResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContentError::Config(format!("Failed to read fixtures '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}

/// Fixture file layout: `{ "en": { "pages": [], "posts": [], "vessels": [] }, ... }`
#[derive(Debug, Default, Deserialize)]
struct FixtureBucket {
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    vessels: Vec<Vessel>,
}

macro_rules! delegate_source {
    ($($kind:ty => $field:ident),* $(,)?) => {
        $(
            #[async_trait]
            impl ContentSource<$kind> for MemorySite {
                async fn fetch_by_slug(&self, slug: &str, locale: Locale) -> ContentResult<Option<$kind>> {
                    self.$field.fetch_by_slug(slug, locale).await
                }

                async fn fetch_by_id(&self, id: u64, locale: Locale) -> ContentResult<Option<$kind>> {
                    self.$field.fetch_by_id(id, locale).await
                }

                async fn fetch_all(&self, locale: Locale) -> ContentResult<Vec<$kind>> {
                    self.$field.fetch_all(locale).await
                }

                fn source_name(&self) -> &str {
                    "Memory"
                }
            }
        )*
    };
}

delegate_source!(Page => pages, Post => posts, Vessel => vessels);
