//! Content entities as served by the CMS REST API
//!
//! Pages, posts and vessels share an `id`, a `slug` that is unique per
//! locale and content kind, and an optional Polylang translation block.
//! Everything the resolver needs is reachable through the [`Entity`] trait.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::locale::{Locale, with_locale_path};
use crate::vessel::VesselAcf;

/// Polylang translation metadata attached to an entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationMeta {
    /// Short language code of this entity (e.g. "es"), if assigned
    #[serde(default)]
    pub lang: Option<String>,
    /// Full CMS locale (e.g. "es_PY"), informational only
    #[serde(default)]
    pub locale: Option<String>,
    /// Sibling ids keyed by short language code
    #[serde(default, deserialize_with = "translation_table")]
    pub translations: HashMap<String, u64>,
}

impl TranslationMeta {
    /// The entity's own locale, when `lang` names a supported locale
    pub fn locale_tag(&self) -> Option<Locale> {
        self.lang.as_deref().and_then(|lang| lang.parse().ok())
    }

    /// Id of the sibling translated into `locale`
    ///
    /// An id of `0` is how the CMS spells "no translation".
    pub fn translation_id(&self, locale: Locale) -> Option<u64> {
        self.translations
            .get(locale.as_str())
            .copied()
            .filter(|id| *id != 0)
    }
}

/// Anything the Polylang resolver can work with
pub trait Entity {
    fn id(&self) -> u64;
    fn slug(&self) -> &str;
    fn translation_meta(&self) -> Option<&TranslationMeta>;

    /// Locale the entity was authored in; `None` for locale-agnostic content
    fn content_locale(&self) -> Option<Locale> {
        self.translation_meta().and_then(TranslationMeta::locale_tag)
    }
}

/// Content kinds addressed by slug under a fixed route
pub trait Routable {
    /// Unprefixed route the detail pages live under (e.g. `/vessel`)
    const ROUTE_BASE: &'static str;

    /// Unprefixed detail path for `slug`
    fn detail_path(slug: &str) -> String {
        format!("{}/{}", Self::ROUTE_BASE, slug)
    }

    /// Locale-prefixed detail path, the canonical path of a translation
    fn canonical_path(locale: Locale, slug: &str) -> String {
        with_locale_path(locale, &Self::detail_path(slug))
    }
}

/// `{ "rendered": "..." }` wrapper used for titles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedTitle {
    #[serde(default)]
    pub rendered: String,
}

/// Rendered HTML body with its password-protection flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    #[serde(default)]
    pub rendered: String,
    #[serde(default)]
    pub protected: bool,
}

/// A CMS page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: RenderedTitle,
    #[serde(default)]
    pub content: RenderedContent,
    #[serde(default)]
    pub excerpt: RenderedContent,
    #[serde(default)]
    pub author: u64,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub parent: u64,
    #[serde(default)]
    pub menu_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polylang: Option<TranslationMeta>,
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: RenderedTitle,
    #[serde(default)]
    pub content: RenderedContent,
    #[serde(default)]
    pub excerpt: RenderedContent,
    #[serde(default)]
    pub author: u64,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polylang: Option<TranslationMeta>,
}

/// A vessel listing (custom post type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: RenderedTitle,
    #[serde(default)]
    pub content: RenderedContent,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default, deserialize_with = "acf_block")]
    pub acf: VesselAcf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polylang: Option<TranslationMeta>,
}

macro_rules! impl_entity {
    ($($kind:ty => $route:literal),* $(,)?) => {
        $(
            impl Entity for $kind {
                fn id(&self) -> u64 {
                    self.id
                }

                fn slug(&self) -> &str {
                    &self.slug
                }

                fn translation_meta(&self) -> Option<&TranslationMeta> {
                    self.polylang.as_ref()
                }
            }

            impl Routable for $kind {
                const ROUTE_BASE: &'static str = $route;
            }
        )*
    };
}

impl_entity!(Page => "/pages", Post => "/posts", Vessel => "/vessel");

impl Page {
    /// Last-modified stamp, falling back to the publish date
    pub fn last_modified(&self) -> &str {
        self.modified.as_deref().unwrap_or(&self.date)
    }
}

impl Post {
    pub fn last_modified(&self) -> &str {
        self.modified.as_deref().unwrap_or(&self.date)
    }
}

impl Vessel {
    pub fn last_modified(&self) -> &str {
        self.modified.as_deref().unwrap_or(&self.date)
    }
}

/// Polylang emits `[]` instead of `{}` when an entity has no translations
fn translation_table<'de, D>(deserializer: D) -> Result<HashMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(HashMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(lang, id)| lenient_u64(&id).map(|id| (lang, id)))
        .collect())
}

/// ACF returns `false` or `[]` for posts that never had fields saved
fn acf_block<'de, D>(deserializer: D) -> Result<VesselAcf, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(VesselAcf::default());
    }
    serde_json::from_value(value).map_err(serde::de::Error::custom)
}

fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Number or numeric string; anything else (null, `false`, "", NaN) is absent
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| !n.is_nan()))
}

/// String field where ACF may send `false`, `null` or "" for empty
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// ACF true/false field; unsaved fields arrive as `null`, `""` or `"0"`
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

/// Id list (gallery, relationship); anything but an array is empty
pub(crate) fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(lenient_u64).collect(),
        _ => Vec::new(),
    })
}
