//! Wikipedia article graph backed by the MediaWiki query API
//!
//! Forward expansion lists the main-namespace links of an article, backward
//! expansion lists the main-namespace articles linking to it. Both follow
//! the API's continuation tokens until the list is complete.

use crate::search::expander::{ExpandError, NodeExpander};
use crate::search::node::Direction;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Used for bare titles given without a URL.
pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("wikipath/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum WikipediaError {
    #[error("'{0}' is not a Wikipedia article URL")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("cannot decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },
}

impl From<WikipediaError> for ExpandError {
    fn from(err: WikipediaError) -> Self {
        let transient = match &err {
            WikipediaError::Http(e) => e.is_timeout() || e.is_connect(),
            WikipediaError::Status(code) => is_transient_status(*code),
            WikipediaError::Api { code, .. } => code == "maxlag" || code == "ratelimited",
            WikipediaError::InvalidUrl(_) | WikipediaError::Decode(_) => false,
        };
        if transient {
            ExpandError::Transient(err.to_string())
        } else {
            ExpandError::Fatal(err.to_string())
        }
    }
}

/// Throttling and server-side failures are worth retrying.
fn is_transient_status(code: u16) -> bool {
    code == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..600).contains(&code)
}

/// An article reference split into wiki and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    /// Scheme and host, e.g. `https://fi.wikipedia.org`
    pub base_url: String,
    /// Title with underscores turned into spaces
    pub title: String,
}

/// Parse `https://<lang>.wikipedia.org/wiki/<Title>` or a bare title.
pub fn parse_article_ref(input: &str) -> Result<ArticleRef, WikipediaError> {
    let input = input.trim();
    if !input.contains("://") {
        let title = normalize_title(&percent_decode(input));
        if title.is_empty() {
            return Err(WikipediaError::InvalidUrl(input.to_string()));
        }
        return Ok(ArticleRef {
            base_url: DEFAULT_BASE_URL.to_string(),
            title,
        });
    }

    let url = Url::parse(input).map_err(|_| WikipediaError::InvalidUrl(input.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| WikipediaError::InvalidUrl(input.to_string()))?;
    let raw_title = url
        .path()
        .strip_prefix("/wiki/")
        .ok_or_else(|| WikipediaError::InvalidUrl(input.to_string()))?;
    let title = normalize_title(&percent_decode(raw_title));
    if title.is_empty() {
        return Err(WikipediaError::InvalidUrl(input.to_string()));
    }

    let base_url = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Ok(ArticleRef { base_url, title })
}

/// Titles use spaces where URLs use underscores, and main-namespace titles
/// start with a capital letter.
pub fn normalize_title(title: &str) -> String {
    let title = title.replace('_', " ");
    let mut chars = title.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Decode `%XX` escapes; malformed escapes are kept as they are.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            out.push((hex_value(bytes[i + 1]) << 4) | hex_value(bytes[i + 2]));
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default, rename = "continue")]
    continuation: Option<HashMap<String, String>>,
    #[serde(default)]
    query: Option<Query>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Query {
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    backlinks: Vec<Link>,
    #[serde(default)]
    normalized: Vec<TitleMapping>,
    #[serde(default)]
    redirects: Vec<TitleMapping>,
}

#[derive(Debug, Deserialize)]
struct TitleMapping {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

/// Titles carried by one response page, in API order.
fn titles_in(response: &ApiResponse) -> Vec<String> {
    let Some(query) = &response.query else {
        return Vec::new();
    };
    query
        .pages
        .iter()
        .flat_map(|page| page.links.iter())
        .chain(query.backlinks.iter())
        .map(|link| link.title.clone())
        .collect()
}

/// Follow the title normalization and redirects the API reported.
fn canonical_in(title: &str, response: &ApiResponse) -> String {
    let mut current = title.to_string();
    let Some(query) = &response.query else {
        return current;
    };
    for mapping in query.normalized.iter().chain(query.redirects.iter()) {
        if mapping.from == current {
            current = mapping.to.clone();
        }
    }
    current
}

/// Article graph expander for one wiki and one direction.
#[derive(Debug, Clone)]
pub struct WikipediaExpander {
    client: Client,
    base_url: String,
    api_url: String,
    direction: Direction,
}

impl WikipediaExpander {
    pub fn new(base_url: &str, direction: Direction, timeout: Duration) -> Result<Self, WikipediaError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            api_url: format!("{}/w/api.php", base_url),
            base_url,
            direction,
        })
    }

    /// Outgoing links of articles on `base_url`'s wiki.
    pub fn forward(base_url: &str, timeout: Duration) -> Result<Self, WikipediaError> {
        Self::new(base_url, Direction::Forward, timeout)
    }

    /// Incoming links of articles on `base_url`'s wiki.
    pub fn backward(base_url: &str, timeout: Duration) -> Result<Self, WikipediaError> {
        Self::new(base_url, Direction::Backward, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn base_params(&self, title: &str) -> Vec<(String, String)> {
        let mut params = vec![("action", "query"), ("format", "json"), ("formatversion", "2")];
        match self.direction {
            Direction::Forward => params.extend([
                ("prop", "links"),
                ("titles", title),
                ("plnamespace", "0"),
                ("pllimit", "max"),
            ]),
            Direction::Backward => params.extend([
                ("list", "backlinks"),
                ("bltitle", title),
                ("blnamespace", "0"),
                ("bllimit", "max"),
            ]),
        }
        params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn fetch(&self, params: &[(String, String)]) -> Result<ApiResponse, WikipediaError> {
        let response = self.client.get(&self.api_url).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(WikipediaError::Status(status.as_u16()));
        }
        let body = response.text()?;
        let mut parsed: ApiResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error.take() {
            return Err(WikipediaError::Api {
                code: error.code,
                info: error.info,
            });
        }
        Ok(parsed)
    }

    /// The title the API files `title` under, redirects resolved.
    ///
    /// Link lists only carry canonical titles, so a seed spelled any other
    /// way would never be met by the opposite direction.
    pub fn canonical_title(&self, title: &str) -> Result<String, WikipediaError> {
        let params: Vec<(String, String)> = [
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("redirects", "1"),
            ("titles", title),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let response = self.fetch(&params)?;
        Ok(canonical_in(title, &response))
    }

    /// All neighbor titles of `title`, following continuation.
    pub fn neighbors(&self, title: &str) -> Result<Vec<String>, WikipediaError> {
        let mut titles = Vec::new();
        let mut continuation: HashMap<String, String> = HashMap::new();
        loop {
            let mut params = self.base_params(title);
            params.extend(continuation.drain());
            let response = self.fetch(&params)?;
            titles.extend(titles_in(&response));

            match response.continuation {
                Some(next) if !next.is_empty() => continuation = next,
                _ => break,
            }
        }
        debug!(direction = %self.direction, title, count = titles.len(), "fetched links");
        Ok(titles)
    }
}

impl NodeExpander<String> for WikipediaExpander {
    fn expand(&self, node: &String) -> Result<Vec<String>, ExpandError> {
        Ok(self.neighbors(node)?)
    }

    /// The wiki's base URL: articles in different languages live in
    /// different graphs.
    fn domain(&self) -> &str {
        &self.base_url
    }
}
