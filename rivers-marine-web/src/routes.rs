use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use rivers_marine::{
    AlternateMap, ContentError, ContentSource, Dictionary, Entity, LISTING_PER_PAGE, Locale,
    LocaleRoute, Page, Post, Resolution, Resolver, Routable, SITE, SiteContent, SitemapEntry,
    Vessel, VesselFilterMetadata, VesselFilterValues, VesselLabels, build_metadata,
    build_static_alternates, collect_sitemap, filter_vessels, page_from_query, paginate,
    partition_by_locale, route_request, with_locale_path,
};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error response with its status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(error: ContentError) -> Self {
        let status = match &error {
            ContentError::Upstream { .. } | ContentError::Transport(_) | ContentError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            ContentError::UnsupportedLocale(_) => StatusCode::NOT_FOUND,
            ContentError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status != StatusCode::NOT_FOUND {
            warn!(%error, "Content request failed");
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn SiteContent>,
    pub dictionary: Arc<Dictionary>,
}

/// "Shown in another language" banner texts
#[derive(Debug, Serialize)]
pub struct FallbackNotice {
    pub title: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct DetailResponse<'a, T> {
    #[serde(flatten)]
    pub resolution: &'a Resolution<T>,
    /// Non-null alternates, for `hreflang` links
    pub hreflang: BTreeMap<Locale, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<FallbackNotice>,
    /// Select-field labels, for vessels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<VesselLabels>,
}

#[derive(Serialize)]
pub struct ListingResponse {
    pub locale: Locale,
    pub alternates: AlternateMap,
    pub facets: VesselFilterMetadata,
    pub criteria: VesselFilterValues,
    pub page: u32,
    /// Vessels matching the criteria across every page
    pub total: u64,
    pub total_pages: u64,
    pub summary: String,
    pub matches: Vec<Vessel>,
    pub fallbacks: Vec<Vessel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<FallbackNotice>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/{locale}/vessel", get(vessel_listing))
        .route("/api/{locale}/{kind}/{slug}", get(content_detail))
        .route("/sitemap.xml", get(sitemap))
        .fallback(locale_redirect)
        .with_state(state)
}

async fn content_detail(
    State(state): State<AppState>,
    Path((locale, kind, slug)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let locale: Locale = locale.parse()?;
    info!("Resolving {} '{}' for {}", kind, slug, locale);

    let source = state.source.as_ref();
    let dictionary = &state.dictionary;
    match kind.as_str() {
        "pages" => detail::<Page, _>(source, dictionary, &slug, locale, |_| None).await,
        "posts" => detail::<Post, _>(source, dictionary, &slug, locale, |_| None).await,
        "vessel" => {
            detail::<Vessel, _>(source, dictionary, &slug, locale, |vessel| {
                Some(vessel.acf.labels())
            })
            .await
        }
        _ => Err(ApiError::not_found(format!("Unknown content kind: {}", kind))),
    }
}

async fn detail<T, S>(
    source: &S,
    dictionary: &Dictionary,
    slug: &str,
    locale: Locale,
    labels: fn(&T) -> Option<VesselLabels>,
) -> Result<Response, ApiError>
where
    S: ContentSource<T> + ?Sized,
    T: Entity + Routable + Serialize + Send,
{
    let Some(resolution) = Resolver::new(source)
        .resolve_routable::<T>(slug, locale)
        .await?
    else {
        return Err(ApiError::not_found(format!(
            "No content found for '{}' in any locale",
            slug
        )));
    };

    if let Some(target) = &resolution.redirect_path {
        info!("Redirecting '{}' to {}", slug, target);
        return Ok(Redirect::permanent(&format!("/api{}", target)).into_response());
    }

    let notice = resolution.translation_missing.then(|| {
        let source_locale = resolution.content_locale.unwrap_or(locale);
        translation_notice(dictionary, locale, source_locale)
    });

    let body = DetailResponse {
        resolution: &resolution,
        hreflang: resolution.alternates.language_alternates(),
        notice,
        labels: labels(&resolution.resource),
    };
    Ok(Json(body).into_response())
}

fn translation_notice(dictionary: &Dictionary, locale: Locale, source: Locale) -> FallbackNotice {
    let language = |l: Locale| {
        dictionary.translate(locale, &format!("languageSwitcher.locale.{}", l), &[])
    };
    FallbackNotice {
        title: dictionary.translate(locale, "languageSwitcher.fallback.title", &[]),
        description: dictionary.translate(
            locale,
            "languageSwitcher.fallback.description",
            &[
                ("sourceLocale", language(source)),
                ("targetLocale", language(locale)),
            ],
        ),
    }
}

async fn vessel_listing(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ListingResponse>, ApiError> {
    let locale: Locale = locale.parse()?;

    let catalog = ContentSource::<Vessel>::fetch_all(state.source.as_ref(), locale).await?;
    let facets = build_metadata(&catalog);
    let page = page_from_query(params.iter().map(|(key, value)| (key, value)));
    let criteria = VesselFilterValues::from_query(params).clamp_to(&facets.ranges);
    let filtered: Vec<Vessel> = filter_vessels(&catalog, &criteria)
        .into_iter()
        .cloned()
        .collect();
    let listing = paginate(filtered, page, LISTING_PER_PAGE);
    let partition = partition_by_locale(listing.items, locale);
    info!(
        "Vessel listing for {} page {}/{}: {} of {} shown, {} fallbacks",
        locale,
        listing.page,
        listing.total_pages,
        partition.matches.len(),
        catalog.len(),
        partition.fallbacks.len()
    );

    let query_suffix = raw_query
        .filter(|q| !q.is_empty())
        .map(|q| format!("?{}", q))
        .unwrap_or_default();
    let alternates = build_static_alternates(|l| {
        format!("{}{}", with_locale_path(l, Vessel::ROUTE_BASE), query_suffix)
    });

    let dictionary = &state.dictionary;
    let suffix = if criteria.is_empty() {
        String::new()
    } else {
        dictionary.translate(locale, "vessels.list.count.suffix", &[])
    };
    let summary = dictionary.translate_count(
        locale,
        "vessels.list.count",
        partition.matches.len() as u64,
        &[("suffix", suffix)],
    );
    let notice = (!partition.fallbacks.is_empty()).then(|| FallbackNotice {
        title: dictionary.translate(locale, "vessels.list.fallback.title", &[]),
        description: dictionary.translate(
            locale,
            "vessels.list.fallback.description",
            &[("count", partition.fallbacks.len().to_string())],
        ),
    });

    Ok(Json(ListingResponse {
        locale,
        alternates,
        facets,
        criteria,
        page: listing.page,
        total: listing.total,
        total_pages: listing.total_pages,
        summary,
        matches: partition.matches,
        fallbacks: partition.fallbacks,
        notice,
    }))
}

async fn sitemap(State(state): State<AppState>) -> Result<Response, ApiError> {
    let entries = collect_sitemap(state.source.as_ref(), SITE.domain).await?;
    info!("Serving sitemap with {} entries", entries.len());
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_sitemap(&entries),
    )
        .into_response())
}

/// Anything unmatched: permanently redirect paths missing a locale prefix
async fn locale_redirect(uri: Uri) -> Response {
    match route_request(uri.path()) {
        LocaleRoute::Redirect(target) => {
            let location = match uri.query() {
                Some(query) => format!("{}?{}", target, query),
                None => target,
            };
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
        }
        LocaleRoute::Passthrough | LocaleRoute::Localized { .. } => {
            ApiError::not_found(format!("No route for {}", uri.path())).into_response()
        }
    }
}

fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.url)));
        if let Some(modified) = &entry.last_modified {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(modified)));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.change_frequency.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use rivers_marine::{MemoryMode, MemorySite, MemorySource};
    use serde_json::Value;
    use tower::ServiceExt;

    const FIXTURES: &str = r#"{
        "en": {
            "pages": [
                { "id": 1, "slug": "about", "date": "2024-01-01T00:00:00",
                  "polylang": { "lang": "en", "translations": { "en": 1, "es": 2 } } }
            ],
            "vessels": [
                { "id": 10, "slug": "tugboat-1", "date": "2024-02-01T00:00:00",
                  "polylang": { "lang": "en", "translations": { "en": 10, "es": 42 } },
                  "acf": { "vessel_type": "tugboat",
                           "specs": { "core_specs": { "year_built": 1998 },
                                      "propulsion_power_specs": { "total_horse_power": 1200 } } } },
                { "id": 11, "slug": "tank-barge", "date": "2024-02-02T00:00:00",
                  "polylang": { "lang": "en", "translations": { "en": 11 } },
                  "acf": { "vessel_type": "barge", "barge_type": "tank",
                           "specs": { "core_specs": { "year_built": 2005 } } } }
            ]
        },
        "es": {
            "pages": [
                { "id": 2, "slug": "acerca", "date": "2024-01-01T00:00:00",
                  "polylang": { "lang": "es", "translations": { "en": 1, "es": 2 } } }
            ],
            "vessels": [
                { "id": 42, "slug": "remolcador-1", "date": "2024-02-01T00:00:00",
                  "polylang": { "lang": "es", "translations": { "en": 10, "es": 42 } },
                  "acf": { "vessel_type": "tugboat",
                           "specs": { "core_specs": { "year_built": 1998 },
                                      "propulsion_power_specs": { "total_horse_power": 1200 } } } },
                { "id": 11, "slug": "tank-barge", "date": "2024-02-02T00:00:00",
                  "polylang": { "lang": "en", "translations": { "en": 11 } },
                  "acf": { "vessel_type": "barge", "barge_type": "tank",
                           "specs": { "core_specs": { "year_built": 2005 } } } }
            ]
        }
    }"#;

    fn app_with(site: MemorySite) -> Router {
        router(AppState {
            source: Arc::new(site),
            dictionary: Arc::new(Dictionary::embedded().unwrap()),
        })
    }

    fn app() -> Router {
        app_with(MemorySite::from_json(FIXTURES).unwrap())
    }

    async fn get_response(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_detail_in_requested_locale() {
        let response = get_response(app(), "/api/es/vessel/remolcador-1").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["resource"]["id"], 42);
        assert_eq!(json["translation_missing"], false);
        assert_eq!(json["alternates"]["en"], "/en/vessel/tugboat-1");
        assert_eq!(json["hreflang"]["es"], "/es/vessel/remolcador-1");
        assert!(json.get("notice").is_none());
    }

    #[tokio::test]
    async fn test_detail_redirects_to_translation() {
        let response = get_response(app(), "/api/es/vessel/tugboat-1").await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/api/es/vessel/remolcador-1"
        );
    }

    #[tokio::test]
    async fn test_detail_fallback_carries_notice() {
        let response = get_response(app(), "/api/es/vessel/tank-barge").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["translation_missing"], true);
        assert_eq!(json["content_locale"], "en");
        assert_eq!(json["notice"]["title"], "Traducción no disponible");
        assert!(json["notice"]["description"]
            .as_str()
            .unwrap()
            .contains("inglés"));
    }

    #[tokio::test]
    async fn test_page_detail() {
        let response = get_response(app(), "/api/en/pages/about").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["alternates"]["es"], "/es/pages/acerca");
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let response = get_response(app(), "/api/en/posts/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_unknown_kind_and_locale() {
        let response = get_response(app(), "/api/en/boats/tugboat-1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get_response(app(), "/api/fr/vessel/tugboat-1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let mut site = MemorySite::new();
        site.vessels = MemorySource::new().with_mode(MemoryMode::Unavailable("down".to_string()));
        let response = get_response(app_with(site), "/api/en/vessel/tugboat-1").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_vessel_listing() {
        let response = get_response(app(), "/api/es/vessel").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["matches"].as_array().unwrap().len(), 1);
        assert_eq!(json["fallbacks"].as_array().unwrap().len(), 1);
        assert_eq!(json["summary"], "1 embarcación");
        assert_eq!(json["facets"]["ranges"]["year_built"]["min"], 1998.0);
        assert_eq!(json["facets"]["ranges"]["year_built"]["max"], 2005.0);
        assert_eq!(json["alternates"]["en"], "/en/vessel");
        assert!(json["notice"]["title"].is_string());
    }

    #[tokio::test]
    async fn test_vessel_listing_with_filters() {
        let response = get_response(app(), "/api/en/vessel?type=barge&min_year=1900").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let matches = json["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["slug"], "tank-barge");
        // Clamped to the catalog bounds only when both ends are given
        assert_eq!(json["criteria"]["min_year"], 1900.0);
        assert_eq!(json["summary"], "1 vessel matching your search");
        assert_eq!(
            json["alternates"]["es"],
            "/es/vessel?type=barge&min_year=1900"
        );
        assert!(json.get("notice").is_none());
    }

    fn catalog_site(count: u64) -> MemorySite {
        let vessels: Vec<Value> = (1..=count)
            .map(|id| {
                // Unsaved ACF fields come back as null or false
                let has_price = if id % 2 == 0 { Value::Null } else { Value::Bool(true) };
                let gallery = if id % 3 == 0 { Value::Bool(false) } else { serde_json::json!([id]) };
                serde_json::json!({
                    "id": id,
                    "slug": format!("vessel-{}", id),
                    "title": { "rendered": format!("Vessel {}", id) },
                    "polylang": { "lang": "en", "translations": { "en": id } },
                    "acf": {
                        "vessel_type": "towboat",
                        "has_asking_price": has_price,
                        "asking_price": 100000 * id,
                        "gallery": gallery,
                        "specs": { "core_specs": { "year_built": 2000 + id } }
                    }
                })
            })
            .collect();
        let fixtures = serde_json::json!({ "en": { "vessels": vessels } });
        MemorySite::from_json(&fixtures.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_vessel_listing_paginates_after_filtering() {
        let response = get_response(app_with(catalog_site(11)), "/api/en/vessel").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["total"], 11);
        assert_eq!(json["total_pages"], 2);
        assert_eq!(json["matches"].as_array().unwrap().len(), 9);
        assert_eq!(json["summary"], "9 vessels");

        let response = get_response(app_with(catalog_site(11)), "/api/en/vessel?page=2").await;
        let json = json_body(response).await;
        let slugs: Vec<&str> = json["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["vessel-10", "vessel-11"]);
        assert_eq!(json["page"], 2);
        assert_eq!(json["alternates"]["es"], "/es/vessel?page=2");

        let response =
            get_response(app_with(catalog_site(11)), "/api/en/vessel?min_year=2005&page=2").await;
        let json = json_body(response).await;
        assert_eq!(json["total"], 7);
        assert_eq!(json["total_pages"], 1);
        assert!(json["matches"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vessel_listing_search() {
        let response =
            get_response(app_with(catalog_site(11)), "/api/en/vessel?search=vessel%201").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["criteria"]["search"], "vessel 1");
        assert_eq!(json["total"], 3);
        assert_eq!(json["summary"], "3 vessels matching your search");
        assert_eq!(json["alternates"]["es"], "/es/vessel?search=vessel%201");
    }

    #[tokio::test]
    async fn test_vessel_listing_tolerates_unsaved_acf_fields() {
        let response =
            get_response(app_with(catalog_site(3)), "/api/en/vessel?has_price=1").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let ids: Vec<u64> = json["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(json["facets"]["ranges"]["price"]["max"], 300000.0);
    }

    #[tokio::test]
    async fn test_vessel_detail_carries_labels() {
        let response = get_response(app(), "/api/en/vessel/tugboat-1").await;
        let json = json_body(response).await;
        assert_eq!(json["labels"]["vessel_type"], "Tugboat");
        assert!(json["labels"].get("pumps").is_none());

        let response = get_response(app(), "/api/en/pages/about").await;
        let json = json_body(response).await;
        assert!(json.get("labels").is_none());
    }

    #[tokio::test]
    async fn test_sitemap() {
        let response = get_response(app(), "/sitemap.xml").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml; charset=utf-8"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let xml = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://riversmarine.net/es/vessel/remolcador-1</loc>"));
        assert!(xml.contains("<lastmod>2024-01-01T00:00:00</lastmod>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[tokio::test]
    async fn test_unprefixed_path_redirects_to_default_locale() {
        let response = get_response(app(), "/vessel/tugboat-1?ref=home").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/en/vessel/tugboat-1?ref=home"
        );

        let response = get_response(app(), "/").await;
        assert_eq!(response.headers()[header::LOCATION], "/en");
    }

    #[tokio::test]
    async fn test_assets_are_not_redirected() {
        let response = get_response(app(), "/favicon.ico").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
