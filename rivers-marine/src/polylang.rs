//! Polylang translation resolution
//!
//! Given a slug and the locale a visitor asked for, decide which entity to
//! serve, what the equivalent URL is in every other locale, whether the
//! served content is a fallback from another locale, and whether the
//! visitor has to be redirected to the canonical translated URL first.
//!
//! # Resolution order
//!
//! 1. **Primary hit** - the slug exists in the requested locale (or the
//!    entity is locale-agnostic). Serve it; no redirect.
//! 2. **Probe other locales** - in configured locale order, look the slug up
//!    in each other locale. A candidate that has a translation into the
//!    requested locale is swapped for that translation and a redirect to its
//!    canonical path is required. A candidate without one is served as-is
//!    and flagged as a fallback when its own locale differs.
//! 3. **Not found** - `Ok(None)`.
//!
//! A candidate whose translation id no longer resolves is skipped; the probe
//! moves on to the next locale rather than serving that candidate.
//!
//! # Example
//!
//! ```ignore
//! use rivers_marine::{Locale, Resolver, Vessel};
//!
//! let resolution = Resolver::new(&client)
//!     .resolve_routable::<Vessel>("tugboat-1", Locale::Es)
//!     .await?;
//!
//! if let Some(resolution) = resolution {
//!     if let Some(target) = &resolution.redirect_path {
//!         // redirect before rendering
//!     }
//! }
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

use crate::entity::{Entity, Routable};
use crate::error::ContentResult;
use crate::locale::{LOCALES, Locale, with_locale_path};
use crate::source::ContentSource;

/// Locale -> path map with an entry for every supported locale
///
/// `None` means no equivalent content exists in that locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateMap(BTreeMap<Locale, Option<String>>);

impl AlternateMap {
    fn unavailable() -> Self {
        AlternateMap(LOCALES.into_iter().map(|locale| (locale, None)).collect())
    }

    fn from_fn<F>(builder: F) -> Self
    where
        F: Fn(Locale) -> Option<String>,
    {
        AlternateMap(
            LOCALES
                .into_iter()
                .map(|locale| (locale, builder(locale)))
                .collect(),
        )
    }

    /// Path of the equivalent content in `locale`
    pub fn get(&self, locale: Locale) -> Option<&str> {
        self.0.get(&locale).and_then(|path| path.as_deref())
    }

    /// Every locale with its path, in configured order
    pub fn iter(&self) -> impl Iterator<Item = (Locale, Option<&str>)> {
        self.0.iter().map(|(locale, path)| (*locale, path.as_deref()))
    }

    /// Only the locales that have content, for `hreflang` metadata
    pub fn language_alternates(&self) -> BTreeMap<Locale, &str> {
        self.0
            .iter()
            .filter_map(|(locale, path)| path.as_deref().map(|p| (*locale, p)))
            .collect()
    }

    fn set(&mut self, locale: Locale, path: Option<String>) {
        self.0.insert(locale, path);
    }

    fn fill_if_missing(&mut self, locale: Locale, path: String) {
        let entry = self.0.entry(locale).or_insert(None);
        if entry.is_none() {
            *entry = Some(path);
        }
    }
}

impl Serialize for AlternateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (locale, path) in &self.0 {
            map.serialize_entry(locale.as_str(), path)?;
        }
        map.end()
    }
}

/// What to serve for a slug-addressed request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution<T> {
    pub resource: T,
    pub alternates: AlternateMap,
    /// Locale the served entity was authored in; `None` if locale-agnostic
    pub content_locale: Option<Locale>,
    /// Served content comes from another locale than the one requested
    pub translation_missing: bool,
    /// Canonical path the caller must redirect to before rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_path: Option<String>,
}

impl<T: Entity> Resolution<T> {
    fn new(
        resource: T,
        alternates: AlternateMap,
        requested: Locale,
        redirect_path: Option<String>,
    ) -> Self {
        let content_locale = resource.content_locale();
        Self {
            resource,
            alternates,
            content_locale,
            translation_missing: content_locale.is_some_and(|own| own != requested),
            redirect_path,
        }
    }
}

/// How the "probe other locales" phase issues its lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// One lookup at a time, stopping at the first usable candidate
    #[default]
    Sequential,
    /// All other-locale slug lookups at once, then evaluated in locale order
    ///
    /// Produces the same resolution as `Sequential`, trading extra requests
    /// for latency. Any failed lookup fails the resolution.
    Concurrent,
}

/// Resolves slugs against a content source
#[derive(Debug)]
pub struct Resolver<'s, S: ?Sized> {
    source: &'s S,
    probe: ProbeStrategy,
}

impl<'s, S: ?Sized> Resolver<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            probe: ProbeStrategy::Sequential,
        }
    }

    pub fn with_probe(mut self, probe: ProbeStrategy) -> Self {
        self.probe = probe;
        self
    }

    /// Resolve a slug of a routable content kind using its detail route
    pub async fn resolve_routable<T>(
        &self,
        slug: &str,
        locale: Locale,
    ) -> ContentResult<Option<Resolution<T>>>
    where
        S: ContentSource<T>,
        T: Entity + Routable + Send,
    {
        self.resolve(slug, locale, T::detail_path).await
    }

    /// Resolve `slug` requested under `locale`
    ///
    /// `build_path` turns a slug into its unprefixed route; the locale prefix
    /// is added here.
    pub async fn resolve<T, F>(
        &self,
        slug: &str,
        locale: Locale,
        build_path: F,
    ) -> ContentResult<Option<Resolution<T>>>
    where
        S: ContentSource<T>,
        T: Entity + Send,
        F: Fn(&str) -> String + Send + Sync,
    {
        if let Some(primary) = self.source.fetch_by_slug(slug, locale).await? {
            debug!(slug, %locale, id = primary.id(), "Resolved slug in requested locale");
            let mut alternates = self.alternates_for(&primary, &build_path).await?;
            alternates.fill_if_missing(locale, with_locale_path(locale, &build_path(primary.slug())));
            return Ok(Some(Resolution::new(primary, alternates, locale, None)));
        }

        match self.probe {
            ProbeStrategy::Sequential => {
                for other in locale.others() {
                    let Some(candidate) = self.source.fetch_by_slug(slug, other).await? else {
                        continue;
                    };
                    if let Some(resolution) =
                        self.resolve_candidate(candidate, other, slug, locale, &build_path).await?
                    {
                        return Ok(Some(resolution));
                    }
                }
            }
            ProbeStrategy::Concurrent => {
                let others: Vec<Locale> = locale.others().collect();
                let lookups = futures::future::try_join_all(
                    others
                        .iter()
                        .map(|other| self.source.fetch_by_slug(slug, *other)),
                )
                .await?;

                for (other, candidate) in others.into_iter().zip(lookups) {
                    let Some(candidate) = candidate else {
                        continue;
                    };
                    if let Some(resolution) =
                        self.resolve_candidate(candidate, other, slug, locale, &build_path).await?
                    {
                        return Ok(Some(resolution));
                    }
                }
            }
        }

        debug!(slug, %locale, "Slug not found in any locale");
        Ok(None)
    }

    /// Turn an other-locale candidate into a resolution
    ///
    /// Returns `None` when the candidate points at a translation that no
    /// longer exists, so the probe continues with the next locale.
    async fn resolve_candidate<T, F>(
        &self,
        candidate: T,
        found_in: Locale,
        slug: &str,
        locale: Locale,
        build_path: &F,
    ) -> ContentResult<Option<Resolution<T>>>
    where
        S: ContentSource<T>,
        T: Entity + Send,
        F: Fn(&str) -> String + Send + Sync,
    {
        let translation_id = candidate
            .translation_meta()
            .and_then(|meta| meta.translation_id(locale));

        if let Some(translation_id) = translation_id {
            let Some(translated) = self.source.fetch_by_id(translation_id, locale).await? else {
                debug!(
                    slug,
                    %found_in,
                    translation_id,
                    "Translation id is stale, skipping candidate"
                );
                return Ok(None);
            };

            let canonical = with_locale_path(locale, &build_path(translated.slug()));
            debug!(slug, %found_in, %locale, redirect = %canonical, "Redirecting to translation");
            let mut alternates = self.alternates_for(&translated, build_path).await?;
            alternates.fill_if_missing(locale, canonical.clone());
            return Ok(Some(Resolution::new(
                translated,
                alternates,
                locale,
                Some(canonical),
            )));
        }

        debug!(slug, %found_in, %locale, "Serving content from another locale");
        let mut alternates = self.alternates_for(&candidate, build_path).await?;
        alternates.fill_if_missing(locale, with_locale_path(locale, &build_path(slug)));
        Ok(Some(Resolution::new(candidate, alternates, locale, None)))
    }

    /// Equivalent paths of `entity` in every locale
    async fn alternates_for<T, F>(&self, entity: &T, build_path: &F) -> ContentResult<AlternateMap>
    where
        S: ContentSource<T>,
        T: Entity + Send,
        F: Fn(&str) -> String + Send + Sync,
    {
        let Some(meta) = entity.translation_meta() else {
            let path = build_path(entity.slug());
            return Ok(AlternateMap::from_fn(|locale| {
                Some(with_locale_path(locale, &path))
            }));
        };

        let own_locale = meta.locale_tag();
        let mut alternates = AlternateMap::unavailable();

        for locale in LOCALES {
            if own_locale == Some(locale) {
                alternates.set(locale, Some(with_locale_path(locale, &build_path(entity.slug()))));
                continue;
            }

            let Some(translation_id) = meta.translation_id(locale) else {
                continue;
            };

            let sibling = self.source.fetch_by_id(translation_id, locale).await?;
            let path = sibling
                .as_ref()
                .map(|s| s.slug())
                .filter(|s| !s.is_empty())
                .map(|s| with_locale_path(locale, &build_path(s)));
            alternates.set(locale, path);
        }

        Ok(alternates)
    }
}

/// Resolve `slug` under `locale` with the default sequential probe
pub async fn resolve_translation<S, T, F>(
    source: &S,
    slug: &str,
    locale: Locale,
    build_path: F,
) -> ContentResult<Option<Resolution<T>>>
where
    S: ContentSource<T> + ?Sized,
    T: Entity + Send,
    F: Fn(&str) -> String + Send + Sync,
{
    Resolver::new(source).resolve(slug, locale, build_path).await
}

/// Alternate map for a listing route that exists in every locale
///
/// `builder` returns the full locale-prefixed path, including any query
/// string the caller already built for that locale.
pub fn build_static_alternates<F>(builder: F) -> AlternateMap
where
    F: Fn(Locale) -> String,
{
    AlternateMap::from_fn(|locale| Some(builder(locale)))
}

/// Entities split by whether they were authored in the active locale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalePartition<T> {
    pub matches: Vec<T>,
    pub fallbacks: Vec<T>,
}

/// Split `items` into active-locale content and fallbacks, preserving order
///
/// Locale-agnostic entities are fallbacks: their content locale is `None`,
/// which never equals a requested locale.
pub fn partition_by_locale<T, I>(items: I, locale: Locale) -> LocalePartition<T>
where
    T: Entity,
    I: IntoIterator<Item = T>,
{
    let (matches, fallbacks) = items
        .into_iter()
        .partition(|item| item.content_locale() == Some(locale));
    LocalePartition { matches, fallbacks }
}
