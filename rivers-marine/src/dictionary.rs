//! UI message dictionaries
//!
//! Each locale has a flat `key -> template` dictionary. Templates may carry
//! `{name}` placeholders filled from caller-supplied variables. Lookups fall
//! back to the default locale and finally to the key itself, so a missing
//! string never renders as an empty element.
//!
//! The site's own dictionaries are embedded at compile time; a directory of
//! `<locale>.json` files can be loaded instead, in the same format:
//!
//! ```json
//! {
//!     "@metadata": { ... },
//!     "vessels.list.heading": "Vessels for sale"
//! }
//! ```

use icu_plurals::{PluralCategory, PluralRuleType, PluralRules};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::locale::{DEFAULT_LOCALE, Locale};

const EMBEDDED: [(Locale, &str); 2] = [
    (Locale::En, include_str!("../i18n/en.json")),
    (Locale::Es, include_str!("../i18n/es.json")),
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid JSON in '{0}': root must be an object")]
    NotAnObject(String),

    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),
}

/// Messages of every locale
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    messages: HashMap<Locale, HashMap<String, String>>,
}

impl Dictionary {
    /// The dictionaries compiled into the crate
    pub fn embedded() -> Result<Self, DictionaryError> {
        let mut dictionary = Dictionary::default();
        for (locale, json) in EMBEDDED {
            let messages = parse_messages(json, &format!("embedded {}.json", locale))?;
            dictionary.messages.insert(locale, messages);
        }
        Ok(dictionary)
    }

    /// Load `<locale>.json` files from `dir`
    ///
    /// Files named after unsupported locales and non-JSON files are skipped.
    pub fn from_dir(dir: &Path) -> Result<Self, DictionaryError> {
        if !dir.is_dir() {
            return Err(DictionaryError::MissingDirectory(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|source| DictionaryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut dictionary = Dictionary::default();
        for entry in entries {
            let path = entry
                .map_err(|source| DictionaryError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();

            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let Some(locale) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<Locale>().ok())
            else {
                debug!(path = %path.display(), "Skipping dictionary for unsupported locale");
                continue;
            };

            let content = fs::read_to_string(&path).map_err(|source| DictionaryError::Io {
                path: path.clone(),
                source,
            })?;
            let messages = parse_messages(&content, &path.display().to_string())?;
            dictionary.messages.insert(locale, messages);
        }

        Ok(dictionary)
    }

    /// Add or replace a single message
    pub fn with_message(&mut self, locale: Locale, key: &str, template: &str) -> &mut Self {
        self.messages
            .entry(locale)
            .or_default()
            .insert(key.to_string(), template.to_string());
        self
    }

    /// Raw template for `key`: requested locale, default locale, then the key
    pub fn template<'a>(&'a self, locale: Locale, key: &'a str) -> &'a str {
        self.lookup(locale, key)
            .or_else(|| self.lookup(DEFAULT_LOCALE, key))
            .unwrap_or(key)
    }

    /// Translate `key`, substituting `{name}` placeholders from `vars`
    ///
    /// Placeholders without a matching variable are left in place.
    pub fn translate(&self, locale: Locale, key: &str, vars: &[(&str, String)]) -> String {
        let template = self.template(locale, key);
        if vars.is_empty() {
            return template.to_string();
        }

        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                vars.iter()
                    .find(|(name, _)| *name == &caps[1])
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Translate the singular or plural form of `base` for `count`
    ///
    /// `count` is available to the template as `{count}`.
    pub fn translate_count(
        &self,
        locale: Locale,
        base: &str,
        count: u64,
        vars: &[(&str, String)],
    ) -> String {
        let mut vars = vars.to_vec();
        vars.push(("count", count.to_string()));
        self.translate(locale, &count_key(base, count, locale), &vars)
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.messages
            .get(&locale)
            .and_then(|messages| messages.get(key))
            .map(String::as_str)
    }
}

/// `{base}.single` when `count` is in the locale's "one" plural category,
/// `{base}.plural` otherwise
pub fn count_key(base: &str, count: u64, locale: Locale) -> String {
    let form = if plural_category(count, locale) == PluralCategory::One {
        "single"
    } else {
        "plural"
    };
    format!("{}.{}", base, form)
}

fn plural_category(count: u64, locale: Locale) -> PluralCategory {
    let rules = locale
        .intl_tag()
        .parse::<icu_locale::Locale>()
        .ok()
        .and_then(|icu| PluralRules::try_new(icu.into(), PluralRuleType::Cardinal.into()).ok());

    match rules {
        Some(rules) => rules.category_for(count),
        None => {
            warn!(%locale, "No plural rules available, using English rules");
            if count == 1 {
                PluralCategory::One
            } else {
                PluralCategory::Other
            }
        }
    }
}

fn parse_messages(json: &str, origin: &str) -> Result<HashMap<String, String>, DictionaryError> {
    let value: Value = serde_json::from_str(json).map_err(|source| DictionaryError::Parse {
        origin: origin.to_string(),
        source,
    })?;

    let Value::Object(object) = value else {
        return Err(DictionaryError::NotAnObject(origin.to_string()));
    };

    let mut messages = HashMap::new();
    for (key, value) in object {
        if key.starts_with('@') {
            continue;
        }
        match value {
            Value::String(template) => {
                messages.insert(key, template);
            }
            _ => warn!(key, origin, "Message is not a string, skipping"),
        }
    }
    Ok(messages)
}
