//! Fetching TOC text from a book page.
//!
//! Book catalogue pages (Douban style) carry the table of contents in a
//! `<div id="dir_<id>_full">` block, one entry per `<br>`. The HTML
//! extraction is always available; the download itself needs the `fetch`
//! feature.

use regex::{Captures, Regex};

use crate::error::{Error, Result};

/// User agent sent with TOC downloads.
#[cfg(feature = "fetch")]
const USER_AGENT: &str = concat!("tocmark/", env!("CARGO_PKG_VERSION"));

/// Check if the input looks like a URL to fetch rather than TOC text.
///
/// # Example
///
/// ```
/// use tocmark::fetch::is_toc_url;
///
/// assert!(is_toc_url("  https://book.douban.com/subject/1/"));
/// assert!(!is_toc_url("Chapter 1 ..... 5"));
/// ```
pub fn is_toc_url(text: &str) -> bool {
    let lower = text.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Download a page and extract its TOC text.
///
/// No timeout is applied.
#[cfg(feature = "fetch")]
pub fn fetch_toc_text(url: &str) -> Result<String> {
    fetch_toc_text_with_timeout(url, None)
}

/// Download a page and extract its TOC text, giving up after `timeout`.
#[cfg(feature = "fetch")]
pub fn fetch_toc_text_with_timeout(
    url: &str,
    timeout: Option<std::time::Duration>,
) -> Result<String> {
    let url = url.trim();
    if !is_toc_url(url) {
        return Err(Error::Fetch(format!("not an http(s) URL: {}", url)));
    }

    log::debug!("Fetching TOC from {}", url);
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    let html = client.get(url).send()?.error_for_status()?.text()?;
    log::debug!("Fetched {} bytes of HTML", html.len());

    extract_toc_from_html(&html)
}

/// Extract TOC text from a book page.
pub fn extract_toc_from_html(html: &str) -> Result<String> {
    HtmlTocExtractor::new().extract(html)
}

/// Pulls the table of contents block out of a book page.
pub struct HtmlTocExtractor {
    full_block: Regex,
    short_block: Regex,
    line_break: Regex,
    tag: Regex,
    entity: Regex,
    fold_marker: Regex,
}

impl HtmlTocExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self {
            full_block: Regex::new(
                r#"(?is)<div[^>]*\bid\s*=\s*["']dir_\d+_full["'][^>]*>(.*?)</div>"#,
            )
            .unwrap(),
            short_block: Regex::new(
                r#"(?is)<div[^>]*\bid\s*=\s*["']dir_\d+_short["'][^>]*>(.*?)</div>"#,
            )
            .unwrap(),
            line_break: Regex::new(r"(?i)<br\s*/?>").unwrap(),
            tag: Regex::new(r"(?s)<[^>]*>").unwrap(),
            entity: Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap(),
            fold_marker: Regex::new(r"^[\s·.]*(?:\(\s*(?:收起|更多|展开全部)\s*\))?\s*$").unwrap(),
        }
    }

    /// Extract the TOC lines, one entry per line.
    ///
    /// Leading no-break and ideographic spaces are kept as indentation;
    /// source formatting whitespace is not.
    pub fn extract(&self, html: &str) -> Result<String> {
        let block = self
            .full_block
            .captures(html)
            .or_else(|| self.short_block.captures(html))
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| Error::Fetch("no table of contents found on page".to_string()))?;

        let text = self.line_break.replace_all(&block, "\n");
        let text = self.tag.replace_all(&text, "");
        let text = self.decode_entities(&text);

        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_start_matches(|c: char| c.is_ascii_whitespace()).trim_end())
            .filter(|line| !line.is_empty() && !self.fold_marker.is_match(line))
            .collect();

        if lines.is_empty() {
            return Err(Error::Fetch("table of contents block is empty".to_string()));
        }
        Ok(lines.join("\n"))
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                let decoded = match name {
                    "nbsp" => Some('\u{a0}'),
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "middot" => Some('·'),
                    "hellip" => Some('…'),
                    _ => numeric_reference(name).and_then(char::from_u32),
                };
                decoded.map_or_else(|| caps[0].to_string(), String::from)
            })
            .into_owned()
    }
}

/// Code point of a `#123` or `#x7B` character reference.
fn numeric_reference(name: &str) -> Option<u32> {
    let hex = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
    match hex {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => name.strip_prefix('#').and_then(|dec| dec.parse().ok()),
    }
}

impl Default for HtmlTocExtractor {
    fn default() -> Self {
        Self::new()
    }
}
