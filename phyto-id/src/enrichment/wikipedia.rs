// Wikipedia / Wikimedia image source
//
// Primary: REST page summary by exact title → thumbnail.source
// Fallback: action API prop=pageimages by title → query.pages.<pageid>.thumbnail.source
// Thumbnails are upgraded to a fixed 800px rendition by rewriting the "/<N>px-" segment.

use super::{
    json_body, per_second_limiter, DirectRateLimiter, EnrichmentSourceError, ImageQuery, ImageRef,
    ImageSource,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_REST_URL: &str = "https://en.wikipedia.org/api/rest_v1";
pub const DEFAULT_ACTION_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Width of the upgraded thumbnail rendition
pub const UPGRADED_WIDTH: u32 = 800;

static THUMB_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)px-").expect("thumbnail width pattern is valid"));

pub struct WikipediaSource {
    client: Client,
    rest_url: String,
    action_url: String,
    rate_limiter: DirectRateLimiter,
}

impl WikipediaSource {
    pub fn new(client: Client, rest_url: impl Into<String>, action_url: impl Into<String>) -> Self {
        Self {
            client,
            rest_url: rest_url.into(),
            action_url: action_url.into(),
            // Wikimedia asks API clients to stay well under their burst limits
            rate_limiter: per_second_limiter(5),
        }
    }

    async fn summary_thumbnail(&self, title: &str) -> Result<Option<ImageRef>, EnrichmentSourceError> {
        let page = title.replace(' ', "_");
        let mut url = Url::parse(&self.rest_url)
            .map_err(|e| EnrichmentSourceError::Malformed(format!("REST base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| EnrichmentSourceError::Malformed("REST base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["page", "summary", page.as_str()]);

        self.rate_limiter.until_ready().await;
        debug!("Querying Wikipedia summary: {}", title);

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = json_body(response).await?;
        Ok(parse_summary_thumbnail(&body))
    }

    async fn page_image(&self, title: &str) -> Result<Option<ImageRef>, EnrichmentSourceError> {
        let width = UPGRADED_WIDTH.to_string();
        let url = Url::parse_with_params(
            &self.action_url,
            [
                ("action", "query"),
                ("titles", title),
                ("prop", "pageimages"),
                ("format", "json"),
                ("redirects", "1"),
                ("pithumbsize", width.as_str()),
            ],
        )
        .map_err(|e| EnrichmentSourceError::Malformed(format!("action API URL: {}", e)))?;

        self.rate_limiter.until_ready().await;
        debug!("Querying Wikipedia page images: {}", title);

        let response = self.client.get(url).send().await?;
        let body = json_body(response).await?;
        Ok(parse_page_image(&body))
    }
}

#[async_trait]
impl ImageSource for WikipediaSource {
    fn name(&self) -> &'static str {
        "Wikipedia"
    }

    async fn lookup(&self, query: &ImageQuery) -> Result<Option<ImageRef>, EnrichmentSourceError> {
        let title = query.scientific_name.as_str();

        // A failed summary still leaves the page-image query worth trying
        match self.summary_thumbnail(title).await {
            Ok(Some(url)) => return Ok(Some(upgrade_thumbnail(&url))),
            Ok(None) => debug!("No summary thumbnail for {}", title),
            Err(e) => debug!("Summary lookup failed for {}: {}", title, e),
        }

        Ok(self
            .page_image(title)
            .await?
            .map(|url| upgrade_thumbnail(&url)))
    }
}

/// `thumbnail.source` of a REST page summary
pub fn parse_summary_thumbnail(body: &Value) -> Option<String> {
    body.get("thumbnail")?
        .get("source")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First `query.pages.<pageid>.thumbnail.source` of an action API response
///
/// Missing pages come back keyed "-1" without a thumbnail and are skipped.
pub fn parse_page_image(body: &Value) -> Option<String> {
    body.get("query")?
        .get("pages")?
        .as_object()?
        .values()
        .filter_map(|page| page.get("thumbnail")?.get("source")?.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Rewrite a narrower "/<N>px-" thumbnail segment to the fixed upgraded width
pub fn upgrade_thumbnail(url: &str) -> String {
    let Some(caps) = THUMB_WIDTH.captures(url) else {
        return url.to_string();
    };
    let width: u32 = caps[1].parse().unwrap_or(UPGRADED_WIDTH);
    if width >= UPGRADED_WIDTH {
        return url.to_string();
    }
    THUMB_WIDTH
        .replace(url, format!("/{}px-", UPGRADED_WIDTH).as_str())
        .into_owned()
}
