//! Submission payload and its validation

use reqwest::Url;
use serde::Deserialize;
use std::net::IpAddr;
use thiserror::Error;

/// Upper bound on raw submitted input, in characters
pub const MAX_INPUT_CHARS: usize = 100_000;

/// Title used when the input is article text rather than a URL
pub const TEXT_INPUT_TITLE: &str = "Article Text";

/// `POST /api/extract` request body
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub input: Option<String>,
}

/// Validated job input
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleInput {
    Url(Url),
    Text(String),
}

impl ArticleInput {
    /// Raw input as the user supplied it (trimmed)
    pub fn as_str(&self) -> &str {
        match self {
            ArticleInput::Url(url) => url.as_str(),
            ArticleInput::Text(text) => text,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, ArticleInput::Url(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Input is required")]
    Missing,

    #[error("Input must not be empty")]
    Empty,

    #[error("Input too large")]
    TooLarge,

    #[error("URL not allowed for security reasons")]
    UrlNotAllowed,
}

impl InputError {
    pub fn code(&self) -> &'static str {
        match self {
            InputError::Missing => "MISSING_INPUT",
            InputError::Empty => "INVALID_INPUT",
            InputError::TooLarge => "INPUT_TOO_LARGE",
            InputError::UrlNotAllowed => "URL_NOT_ALLOWED",
        }
    }
}

/// Validate raw submitted input and classify it as URL or article text
pub fn parse_input(raw: Option<&str>) -> Result<ArticleInput, InputError> {
    let raw = raw.ok_or(InputError::Missing)?;
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    if trimmed.chars().count() > MAX_INPUT_CHARS {
        return Err(InputError::TooLarge);
    }

    match detect_url(trimmed) {
        Some(url) if is_blocked_host(&url) => Err(InputError::UrlNotAllowed),
        Some(url) => Ok(ArticleInput::Url(url)),
        None => Ok(ArticleInput::Text(trimmed.to_string())),
    }
}

/// Input counts as a URL only if it looks like one end to end
///
/// `https://incomplete` (no dot, not an IP) is treated as text.
fn detect_url(input: &str) -> Option<Url> {
    if !(input.starts_with("http://") || input.starts_with("https://")) {
        return None;
    }
    if input.chars().any(char::is_whitespace) {
        return None;
    }

    let url = Url::parse(input).ok()?;
    let host = url.host_str()?;
    if host.contains('.') || parse_ip(host).is_some() || host.eq_ignore_ascii_case("localhost") {
        Some(url)
    } else {
        None
    }
}

fn parse_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

fn is_blocked_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return true;
    };
    let host = host.to_ascii_lowercase();
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    match parse_ip(&host) {
        Some(IpAddr::V4(ip)) => {
            ip.is_loopback()
                || ip.is_private()
                || ip.is_link_local()
                || ip.is_unspecified()
                || ip.is_broadcast()
        }
        Some(IpAddr::V6(ip)) => {
            let first = ip.segments()[0];
            ip.is_loopback()
                || ip.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link-local
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || ip.to_ipv4_mapped().is_some_and(|v4| {
                    v4.is_loopback() || v4.is_private() || v4.is_link_local()
                })
        }
        None => false,
    }
}
