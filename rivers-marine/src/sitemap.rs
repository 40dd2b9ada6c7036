//! Site configuration and sitemap entries
//!
//! Every locale gets the same set of static routes followed by one entry per
//! published post, page and vessel listed under that locale.

use serde::Serialize;

use crate::entity::{Page, Post, Routable, Vessel};
use crate::error::ContentResult;
use crate::locale::{LOCALES, Locale, with_locale_path};
use crate::source::{ContentSource, SiteContent};

/// Static site metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SiteConfig {
    pub name: &'static str,
    pub description: &'static str,
    /// Scheme and host, no trailing slash
    pub domain: &'static str,
    pub email: &'static str,
}

pub const SITE: SiteConfig = SiteConfig {
    name: "Rivers Marine",
    description: "Uniting waterways",
    domain: "https://riversmarine.net",
    email: "sean@riversmarine.net",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    /// CMS timestamp; static routes carry none
    pub last_modified: Option<String>,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

const STATIC_ROUTES: [(&str, ChangeFrequency, f32); 8] = [
    ("/", ChangeFrequency::Yearly, 1.0),
    ("/posts", ChangeFrequency::Weekly, 0.8),
    ("/pages", ChangeFrequency::Monthly, 0.5),
    ("/posts/authors", ChangeFrequency::Monthly, 0.5),
    ("/posts/categories", ChangeFrequency::Monthly, 0.5),
    ("/posts/tags", ChangeFrequency::Monthly, 0.5),
    ("/vessel", ChangeFrequency::Weekly, 0.8),
    ("/privacy-policy", ChangeFrequency::Yearly, 0.4),
];

/// Everything published under one locale
#[derive(Debug, Clone)]
pub struct LocaleContent {
    pub locale: Locale,
    pub posts: Vec<Post>,
    pub pages: Vec<Page>,
    pub vessels: Vec<Vessel>,
}

/// Static routes for every locale, then content entries per locale
pub fn build_sitemap(domain: &str, content: &[LocaleContent]) -> Vec<SitemapEntry> {
    let url = |locale: Locale, path: &str| format!("{}{}", domain, with_locale_path(locale, path));

    let static_entries = LOCALES.into_iter().flat_map(|locale| {
        STATIC_ROUTES
            .iter()
            .map(move |(path, change_frequency, priority)| SitemapEntry {
                url: url(locale, path),
                last_modified: None,
                change_frequency: *change_frequency,
                priority: *priority,
            })
    });

    let content_entries = content.iter().flat_map(|bucket| {
        let locale = bucket.locale;
        let posts = bucket.posts.iter().map(move |post| SitemapEntry {
            url: url(locale, &Post::detail_path(&post.slug)),
            last_modified: Some(post.last_modified().to_string()),
            change_frequency: ChangeFrequency::Weekly,
            priority: 0.6,
        });
        let pages = bucket.pages.iter().map(move |page| SitemapEntry {
            url: url(locale, &Page::detail_path(&page.slug)),
            last_modified: Some(page.last_modified().to_string()),
            change_frequency: ChangeFrequency::Monthly,
            priority: 0.5,
        });
        let vessels = bucket.vessels.iter().map(move |vessel| SitemapEntry {
            url: url(locale, &Vessel::detail_path(&vessel.slug)),
            last_modified: Some(vessel.last_modified().to_string()),
            change_frequency: ChangeFrequency::Weekly,
            priority: 0.7,
        });
        posts.chain(pages).chain(vessels)
    });

    static_entries.chain(content_entries).collect()
}

/// Fetch every locale's content from `source` and build the sitemap
pub async fn collect_sitemap<S>(source: &S, domain: &str) -> ContentResult<Vec<SitemapEntry>>
where
    S: SiteContent + ?Sized,
{
    let buckets = futures::future::try_join_all(LOCALES.into_iter().map(|locale| async move {
        let (posts, pages, vessels) = futures::try_join!(
            ContentSource::<Post>::fetch_all(source, locale),
            ContentSource::<Page>::fetch_all(source, locale),
            ContentSource::<Vessel>::fetch_all(source, locale),
        )?;
        Ok::<_, crate::error::ContentError>(LocaleContent {
            locale,
            posts,
            pages,
            vessels,
        })
    }))
    .await?;

    Ok(build_sitemap(domain, &buckets))
}
