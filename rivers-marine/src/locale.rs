//! Supported site locales and locale-prefixed routing
//!
//! The site is published under a locale prefix (`/en/...`, `/es/...`).
//! This module owns the list of supported locales, their configured
//! order, and the path helpers every other module builds URLs with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ContentError;

/// A locale the site publishes content under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Es,
}

/// Supported locales in configured order
///
/// The resolver probes other locales in exactly this order, so the order
/// is part of the observable behaviour.
pub const LOCALES: [Locale; 2] = [Locale::En, Locale::Es];

/// Locale used when a request carries no locale prefix
pub const DEFAULT_LOCALE: Locale = Locale::En;

impl Locale {
    /// Short code used in paths and in the CMS translation block
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// BCP 47 tag used for number formatting and `lang` attributes
    pub fn intl_tag(self) -> &'static str {
        match self {
            Locale::En => "en-US",
            Locale::Es => "es-PY",
        }
    }

    /// Parse a full language tag (`es-PY`, `en_US`, `ES`) down to a supported locale
    ///
    /// Unlike [`FromStr`], this accepts region and script subtags and is
    /// case-insensitive, which suits user input such as CLI arguments.
    pub fn from_language_tag(tag: &str) -> Option<Locale> {
        let normalized = tag.trim().replace('_', "-");
        let parsed: icu_locale::Locale = normalized.parse().ok()?;
        parsed.id.language.as_str().parse().ok()
    }

    /// Every supported locale except `self`, in configured order
    pub fn others(self) -> impl Iterator<Item = Locale> {
        LOCALES.into_iter().filter(move |locale| *locale != self)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ContentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LOCALES
            .into_iter()
            .find(|locale| locale.as_str() == value)
            .ok_or_else(|| ContentError::UnsupportedLocale(value.to_string()))
    }
}

/// Whether `value` names a supported locale
pub fn is_locale(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.parse::<Locale>().is_ok())
}

/// Prefix `path` with the locale segment
///
/// `/` becomes `/{locale}`; paths missing a leading slash get one.
pub fn with_locale_path(locale: Locale, path: &str) -> String {
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if normalized == "/" {
        return format!("/{}", locale);
    }

    format!("/{}{}", locale, normalized)
}

/// The locale named by the first path segment, if any
pub fn locale_from_path(path: &str) -> Option<Locale> {
    path.split('/').nth(1).and_then(|segment| segment.parse().ok())
}

/// Outcome of routing an incoming request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleRoute {
    /// Static assets and API calls are served untouched
    Passthrough,
    /// No locale prefix: permanently redirect to this path
    Redirect(String),
    /// A locale-prefixed path and its remainder (`/` when empty)
    Localized { locale: Locale, rest: String },
}

/// Decide how a request path is handled with respect to its locale prefix
pub fn route_request(path: &str) -> LocaleRoute {
    if is_public_asset(path) {
        return LocaleRoute::Passthrough;
    }

    match locale_from_path(path) {
        Some(locale) => {
            let rest = &path[1 + locale.as_str().len()..];
            let rest = if rest.is_empty() { "/" } else { rest };
            LocaleRoute::Localized {
                locale,
                rest: rest.to_string(),
            }
        }
        None => LocaleRoute::Redirect(with_locale_path(DEFAULT_LOCALE, path)),
    }
}

fn is_public_asset(path: &str) -> bool {
    path.starts_with("/_next")
        || path.starts_with("/api")
        || path == "/favicon.ico"
        || path.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_locales() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("es".parse::<Locale>().unwrap(), Locale::Es);
        assert!("fr".parse::<Locale>().is_err());
        assert!("EN".parse::<Locale>().is_err());
    }

    #[test]
    fn test_is_locale() {
        assert!(is_locale(Some("es")));
        assert!(!is_locale(Some("")));
        assert!(!is_locale(None));
    }

    #[test]
    fn test_from_language_tag() {
        assert_eq!(Locale::from_language_tag("es-PY"), Some(Locale::Es));
        assert_eq!(Locale::from_language_tag("en_US"), Some(Locale::En));
        assert_eq!(Locale::from_language_tag("EN"), Some(Locale::En));
        assert_eq!(Locale::from_language_tag("fr-FR"), None);
        assert_eq!(Locale::from_language_tag("not a tag"), None);
    }

    #[test]
    fn test_intl_tags_are_valid_bcp47() {
        for locale in LOCALES {
            let parsed: icu_locale::Locale = locale.intl_tag().parse().unwrap();
            assert_eq!(parsed.id.language.as_str(), locale.as_str());
            assert!(parsed.id.region.is_some());
            assert_eq!(Locale::from_language_tag(locale.intl_tag()), Some(locale));
        }
    }

    #[test]
    fn test_others_keeps_configured_order() {
        assert_eq!(Locale::En.others().collect::<Vec<_>>(), vec![Locale::Es]);
        assert_eq!(Locale::Es.others().collect::<Vec<_>>(), vec![Locale::En]);
    }

    #[test]
    fn test_with_locale_path() {
        assert_eq!(with_locale_path(Locale::Es, "/"), "/es");
        assert_eq!(with_locale_path(Locale::Es, ""), "/es");
        assert_eq!(with_locale_path(Locale::En, "/vessel/tug"), "/en/vessel/tug");
        assert_eq!(with_locale_path(Locale::En, "posts"), "/en/posts");
        assert_eq!(
            with_locale_path(Locale::Es, "/vessel?page=2"),
            "/es/vessel?page=2"
        );
    }

    #[test]
    fn test_locale_from_path() {
        assert_eq!(locale_from_path("/es/vessel"), Some(Locale::Es));
        assert_eq!(locale_from_path("/en"), Some(Locale::En));
        assert_eq!(locale_from_path("/vessel/es"), None);
        assert_eq!(locale_from_path("/"), None);
    }

    #[test]
    fn test_route_request_passthrough() {
        assert_eq!(route_request("/api/contact"), LocaleRoute::Passthrough);
        assert_eq!(route_request("/favicon.ico"), LocaleRoute::Passthrough);
        assert_eq!(route_request("/images/hull.png"), LocaleRoute::Passthrough);
        assert_eq!(route_request("/_next/static/x"), LocaleRoute::Passthrough);
    }

    #[test]
    fn test_route_request_redirects_to_default_locale() {
        assert_eq!(
            route_request("/vessel/tug-1"),
            LocaleRoute::Redirect("/en/vessel/tug-1".to_string())
        );
        assert_eq!(route_request("/"), LocaleRoute::Redirect("/en".to_string()));
    }

    #[test]
    fn test_route_request_localized() {
        assert_eq!(
            route_request("/es/vessel/remolcador"),
            LocaleRoute::Localized {
                locale: Locale::Es,
                rest: "/vessel/remolcador".to_string()
            }
        );
        assert_eq!(
            route_request("/en"),
            LocaleRoute::Localized {
                locale: Locale::En,
                rest: "/".to_string()
            }
        );
    }
}
