//! Locale resolution and vessel filtering for the Rivers Marine website
//!
//! The site is a bilingual headless-CMS front end. This crate holds the parts
//! that do not depend on a concrete CMS client: which entity to serve for a
//! slug under a locale, the equivalent URLs in every other locale, how a
//! listing splits into active-locale content and fallbacks, and the vessel
//! facet and filter engine.
//!
//! # Workflow Example
//!
//! ```ignore
//! use rivers_marine::{
//!     Locale, MemorySite, Resolver, Vessel, VesselFilterValues, build_metadata,
//!     filter_vessels, partition_by_locale,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let site = MemorySite::from_file("fixtures.json".as_ref())?;
//!
//!     // 1. Resolve a detail page
//!     let resolution = Resolver::new(&site)
//!         .resolve_routable::<Vessel>("tugboat-1", Locale::Es)
//!         .await?;
//!
//!     // 2. Build the listing: facets from the full catalog, then filter
//!     let catalog: Vec<Vessel> = rivers_marine::ContentSource::<Vessel>::fetch_all(&site, Locale::Es).await?;
//!     let metadata = build_metadata(&catalog);
//!     let criteria = VesselFilterValues::from_query([("type", "barge")]).clamp_to(&metadata.ranges);
//!     let shown: Vec<Vessel> = filter_vessels(&catalog, &criteria).into_iter().cloned().collect();
//!     let partition = partition_by_locale(shown, Locale::Es);
//!
//!     println!("{} shown, {} in other languages", partition.matches.len(), partition.fallbacks.len());
//!     Ok(())
//! }
//! ```

pub mod dictionary;
pub mod entity;
pub mod error;
pub mod filters;
pub mod listing;
pub mod locale;
pub mod memory;
pub mod polylang;
pub mod sitemap;
pub mod source;
pub mod vessel;

pub use dictionary::{Dictionary, DictionaryError, count_key};
pub use entity::{
    Entity, Page, Post, RenderedContent, RenderedTitle, Routable, TranslationMeta, Vessel,
};
pub use error::{ContentError, ContentResult};
pub use filters::{
    FilterOption, RangeBounds, VesselFilterMetadata, VesselFilterRanges, VesselFilterValues,
    build_metadata, clamp_range_to_bounds, filter_vessels,
};
pub use listing::{LISTING_PER_PAGE, Paginated, page_from_query, paginate};
pub use locale::{
    DEFAULT_LOCALE, LOCALES, Locale, LocaleRoute, is_locale, locale_from_path, route_request,
    with_locale_path,
};
pub use memory::{MemoryMode, MemorySite, MemorySource};
pub use polylang::{
    AlternateMap, LocalePartition, ProbeStrategy, Resolution, Resolver, build_static_alternates,
    partition_by_locale, resolve_translation,
};
pub use sitemap::{
    ChangeFrequency, LocaleContent, SITE, SiteConfig, SitemapEntry, build_sitemap, collect_sitemap,
};
pub use source::{ContentSource, SiteContent};
pub use vessel::{LabelTable, SelectOption, VesselAcf, VesselLabels, VesselType, select_label};
