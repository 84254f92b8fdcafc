//! Fetch a web page and reduce it to article title and plain text

use super::ContentExtractor;
use async_trait::async_trait;
use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Article containers tried in order before falling back to `<body>`
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".article-body",
    ".story-body",
    ".entry-content",
    ".post-content",
    ".content",
];

/// Elements whose text is never article content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Error)]
pub enum ArticleExtractionError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Failed to fetch article: {0}")]
    Fetch(String),
}

/// Title and plain text of a fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub text: String,
}

pub struct HttpArticleExtractor {
    http_client: reqwest::Client,
}

impl HttpArticleExtractor {
    pub fn new() -> Result<Self, ArticleExtractionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ArticleExtractionError::Client(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl ContentExtractor for HttpArticleExtractor {
    async fn extract(&self, url: &Url) -> Result<ExtractedArticle, ArticleExtractionError> {
        debug!(url = %url, "Fetching article");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ArticleExtractionError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ArticleExtractionError::Fetch(format!(
                "server returned {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ArticleExtractionError::Fetch(e.to_string()))?;

        Ok(parse_article(&html))
    }
}

/// Extract title and readable text from an HTML document
pub fn parse_article(html: &str) -> ExtractedArticle {
    let document = Html::parse_document(html);

    let title = selector("title")
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let container = CONTENT_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| document.select(&sel).next())
        .or_else(|| selector("body").and_then(|sel| document.select(&sel).next()));

    let text = container
        .map(|el| clean_text(&visible_text(el)))
        .unwrap_or_default();

    ExtractedArticle { title, text }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Text nodes under `root`, skipping script-like elements
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !skipped {
            out.push_str(text);
        }
        out.push('\n');
    }
    out
}

/// Trim each line, drop blanks, rejoin with newlines
fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_container_preferred() {
        let html = r#"<html><head><title> Storm hits coast </title>
            <style>body { color: red }</style></head>
            <body><nav>Home | World</nav>
            <article><h1>Storm</h1><p>Winds reached Miami overnight.</p>
            <script>track("view")</script><p>  Tampa braced next. </p></article>
            </body></html>"#;

        let article = parse_article(html);

        assert_eq!(article.title.as_deref(), Some("Storm hits coast"));
        assert_eq!(article.text, "Storm\nWinds reached Miami overnight.\nTampa braced next.");
    }

    #[test]
    fn test_body_fallback_without_container() {
        let html = "<html><body><div>First line</div>\n\n<div>Second line</div></body></html>";
        let article = parse_article(html);

        assert!(article.title.is_none());
        assert_eq!(article.text, "First line\nSecond line");
    }

    #[test]
    fn test_empty_document() {
        let article = parse_article("");
        assert!(article.title.is_none());
        assert!(article.text.is_empty());
    }
}
