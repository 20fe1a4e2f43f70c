//! CrossRef works API client.

use crate::error::PaperError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const CROSSREF_BASE_URL: &str = "https://api.crossref.org";
pub const DEFAULT_MAILTO: &str = "user@example.com";

/// Bibliographic record printed by `extract-doi`.
///
/// Fields CrossRef does not provide are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoiMetadata {
    pub title: String,
    pub authors: String,
    pub publication_date: String,
    pub conference: String,
    pub doi: String,
    pub url: String,
}

impl DoiMetadata {
    /// Record carrying only the DOI and its resolver URL.
    pub fn fallback(doi: &str) -> Self {
        Self {
            doi: doi.to_string(),
            url: resolver_url(doi),
            ..Default::default()
        }
    }
}

fn resolver_url(doi: &str) -> String {
    format!("https://doi.org/{doi}")
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CrossRefResponse {
    message: CrossRefWork,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossRefWork {
    title: Vec<String>,
    author: Vec<CrossRefAuthor>,
    #[serde(rename = "published-print")]
    published_print: Option<CrossRefDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrossRefDate>,
    #[serde(rename = "container-title")]
    container_title: Vec<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossRefAuthor {
    given: String,
    family: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossRefDate {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossRefDate {
    /// `Y-MM-DD`, `Y-MM` or `Y` depending on how many parts are present.
    fn format(&self) -> Option<String> {
        let parts: Vec<i64> = self
            .date_parts
            .first()?
            .iter()
            .map_while(|p| *p)
            .collect();
        match parts.as_slice() {
            [y, m, d, ..] => Some(format!("{y}-{m:02}-{d:02}")),
            [y, m] => Some(format!("{y}-{m:02}")),
            [y] => Some(y.to_string()),
            [] => None,
        }
    }
}

impl CrossRefWork {
    fn into_metadata(self, doi: &str) -> DoiMetadata {
        let authors = self
            .author
            .iter()
            .map(|a| format!("{} {}", a.given, a.family).trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let publication_date = self
            .published_print
            .as_ref()
            .filter(|d| !d.date_parts.is_empty())
            .or(self.published_online.as_ref())
            .and_then(CrossRefDate::format)
            .unwrap_or_default();

        DoiMetadata {
            title: self.title.into_iter().next().unwrap_or_default(),
            authors,
            publication_date,
            conference: self.container_title.into_iter().next().unwrap_or_default(),
            doi: doi.to_string(),
            url: self.url.unwrap_or_else(|| resolver_url(doi)),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// Thin client for `GET {base}/works/{doi}`.
#[derive(Debug, Clone)]
pub struct CrossRefClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl CrossRefClient {
    /// Client against the public API. CrossRef routes requests that carry a
    /// contact address to its polite pool.
    pub fn new(mailto: &str, timeout_secs: u64) -> Result<Self, PaperError> {
        Self::with_base_url(CROSSREF_BASE_URL, mailto, timeout_secs)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        mailto: &str,
        timeout_secs: u64,
    ) -> Result<Self, PaperError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PaperError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: format!(
                "FormPaper3001/{} (mailto:{mailto})",
                env!("CARGO_PKG_VERSION")
            ),
        })
    }

    /// Fetch and map the work record for `doi`.
    pub async fn lookup(&self, doi: &str) -> Result<DoiMetadata, PaperError> {
        let url = format!("{}/works/{}", self.base_url, doi);
        debug!("CrossRef lookup: {}", url);
        let failed = |reason: String| PaperError::LookupFailed {
            doi: doi.to_string(),
            reason,
        };

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let body: CrossRefResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {e}")))?;
        Ok(body.message.into_metadata(doi))
    }

    /// [`lookup`](Self::lookup), falling back to a DOI-only record.
    pub async fn lookup_or_fallback(&self, doi: &str) -> DoiMetadata {
        match self.lookup(doi).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("{}", e);
                DoiMetadata::fallback(doi)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path as AxumPath, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn work(value: serde_json::Value) -> CrossRefWork {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_full_record() {
        let meta = work(json!({
            "title": ["Attention Is All You Need"],
            "author": [
                {"given": "Ashish", "family": "Vaswani"},
                {"family": "Shazeer"},
                {"given": "", "family": ""}
            ],
            "published-print": {"date-parts": [[2017, 12, 4]]},
            "container-title": ["NeurIPS"],
            "URL": "http://dx.doi.org/10.5555/3295222"
        }))
        .into_metadata("10.5555/3295222");

        assert_eq!(meta.title, "Attention Is All You Need");
        assert_eq!(meta.authors, "Ashish Vaswani, Shazeer");
        assert_eq!(meta.publication_date, "2017-12-04");
        assert_eq!(meta.conference, "NeurIPS");
        assert_eq!(meta.url, "http://dx.doi.org/10.5555/3295222");
    }

    #[test]
    fn online_date_and_default_url() {
        let meta = work(json!({
            "published-online": {"date-parts": [[2020, 3]]}
        }))
        .into_metadata("10.1000/x");
        assert_eq!(meta.publication_date, "2020-03");
        assert_eq!(meta.url, "https://doi.org/10.1000/x");
        assert_eq!(meta.title, "");
        assert_eq!(meta.authors, "");
    }

    #[test]
    fn year_only_and_null_parts() {
        let d: CrossRefDate = serde_json::from_value(json!({"date-parts": [[1999]]})).unwrap();
        assert_eq!(d.format().as_deref(), Some("1999"));
        let d: CrossRefDate = serde_json::from_value(json!({"date-parts": [[null]]})).unwrap();
        assert_eq!(d.format(), None);
    }

    #[test]
    fn fallback_record() {
        let meta = DoiMetadata::fallback("10.1000/182");
        assert_eq!(meta.doi, "10.1000/182");
        assert_eq!(meta.url, "https://doi.org/10.1000/182");
        assert!(meta.title.is_empty() && meta.conference.is_empty());
    }

    async fn serve_fixture() -> String {
        let app = Router::new().route(
            "/works/*doi",
            get(|AxumPath(doi): AxumPath<String>| async move {
                if doi == "10.1000/known" {
                    Ok(Json(json!({
                        "status": "ok",
                        "message": {"title": ["Known"], "URL": "https://doi.org/10.1000/known"}
                    })))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn lookup_against_local_server() {
        let base = serve_fixture().await;
        let client = CrossRefClient::with_base_url(base, DEFAULT_MAILTO, 5).unwrap();

        let meta = client.lookup("10.1000/known").await.unwrap();
        assert_eq!(meta.title, "Known");

        let err = client.lookup("10.1000/unknown").await.unwrap_err();
        assert!(matches!(err, PaperError::LookupFailed { .. }));

        let fallback = client.lookup_or_fallback("10.1000/unknown").await;
        assert_eq!(fallback, DoiMetadata::fallback("10.1000/unknown"));
    }
}
