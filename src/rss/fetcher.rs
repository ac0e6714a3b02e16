//! Feed fetcher with security measures.
//!
//! This module fetches and parses RSS/Atom feeds with SSRF protection and
//! resource limits.

use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;

use feed_rs::model::Entry;
use feed_rs::parser;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::config::RssConfig;
use crate::error::{NewsdeskError, Result};
use crate::rss::types::{FeedEntry, ParsedFeed};

static IMG_SRC_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).ok());

/// User agent string for feed fetching.
const USER_AGENT: &str = "Newsdesk/0.1 (Feed Ingestion)";

/// Feed fetcher with security measures.
#[derive(Clone)]
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
    allow_private_hosts: bool,
}

impl FeedFetcher {
    /// Create a fetcher from the feed configuration.
    pub fn new(config: &RssConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NewsdeskError::Feed(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Fetch and parse a feed from the given URL.
    ///
    /// This method performs SSRF validation and enforces the size limit on
    /// both the declared and the received length.
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        if self.allow_private_hosts {
            validate_scheme(url)?;
        } else {
            validate_url(url)?;
        }

        debug!("Fetching feed {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsdeskError::Feed(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NewsdeskError::Feed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(NewsdeskError::Feed(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NewsdeskError::Feed(format!("failed to read response: {}", e)))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_feed_size {
                return Err(NewsdeskError::Feed(format!(
                    "feed too large: more than {} bytes",
                    self.max_feed_size
                )));
            }
        }

        parse_feed(&body)
    }
}

/// Validate that a URL is absolute http(s).
fn validate_scheme(url: &str) -> Result<url::Url> {
    let parsed =
        url::Url::parse(url).map_err(|e| NewsdeskError::Feed(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(NewsdeskError::Feed(format!(
            "unsupported URL scheme: {}",
            scheme
        ))),
    }
}

/// Validate a URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address
/// - The host is not a reserved hostname
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = validate_scheme(url)?;

    let host = parsed
        .host()
        .ok_or_else(|| NewsdeskError::Feed("URL has no host".to_string()))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(NewsdeskError::Feed(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => {
            let ip = IpAddr::V4(ipv4);
            if is_private_ip(&ip) {
                return Err(NewsdeskError::Feed(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
        url::Host::Ipv6(ipv6) => {
            let ip = IpAddr::V6(ipv6);
            if is_private_ip(&ip) {
                return Err(NewsdeskError::Feed(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
    }

    Ok(())
}

/// Check if a hostname is forbidden.
fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    let forbidden_suffixes = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    forbidden_suffixes
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();

            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Documentation: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
                || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
                || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
        }
        IpAddr::V6(ipv6) => {
            let segments = ipv6.segments();

            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse feed bytes into a ParsedFeed.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)
        .map_err(|e| NewsdeskError::Feed(format!("failed to parse feed: {}", e)))?;

    let title = feed.title.map(|t| t.content);
    let site_url = feed.links.first().map(|l| l.href.clone());
    let entries = feed.entries.into_iter().map(map_entry).collect();

    Ok(ParsedFeed {
        title,
        site_url,
        entries,
    })
}

fn map_entry(entry: Entry) -> FeedEntry {
    let content = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
        .unwrap_or_default();
    let thumbnail_url = media_thumbnail(&entry).or_else(|| first_image_src(&content));

    FeedEntry {
        external_id: entry.id,
        title: entry.title.map(|t| t.content),
        thumbnail_url,
        link: entry.links.first().map(|l| l.href.clone()),
        published_at: entry.published.or(entry.updated),
        content,
    }
}

/// First media thumbnail, else first image media content (which includes
/// RSS enclosures).
fn media_thumbnail(entry: &Entry) -> Option<String> {
    let thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .next();
    if thumbnail.is_some() {
        return thumbnail;
    }

    entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter(|c| {
            let declared_image = c
                .content_type
                .as_ref()
                .map(|ct| ct.to_string().starts_with("image/"));
            let url = c.url.as_ref().map(|u| u.as_str()).unwrap_or_default();
            declared_image.unwrap_or_else(|| has_image_extension(url))
        })
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
}

fn has_image_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default().to_lowercase();
    [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Extract the `src` of the first `<img>` tag in an HTML fragment.
fn first_image_src(html: &str) -> Option<String> {
    IMG_SRC_RE
        .as_ref()?
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
        assert!(validate_url("http://example.com/feed.xml").is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        let result = validate_url("ftp://example.com/feed.xml");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported URL scheme"));
    }

    #[test]
    fn test_validate_url_not_a_url() {
        let result = validate_url("not a url");
        assert!(result.unwrap_err().to_string().contains("invalid URL"));
    }

    #[test]
    fn test_validate_url_forbidden_hosts() {
        for url in [
            "http://localhost/feed.xml",
            "http://server.local/feed.xml",
            "http://api.internal/feed.xml",
        ] {
            let result = validate_url(url);
            assert!(result.unwrap_err().to_string().contains("forbidden host"), "{url}");
        }
    }

    #[test]
    fn test_validate_url_private_ips() {
        for url in [
            "http://127.0.0.1/feed.xml",
            "http://10.0.0.1/feed.xml",
            "http://172.16.0.1/feed.xml",
            "http://192.168.1.1/feed.xml",
            "http://169.254.1.1/feed.xml",
            "http://[::1]/feed.xml",
        ] {
            let result = validate_url(url);
            assert!(result.unwrap_err().to_string().contains("private IP"), "{url}");
        }

        // 172.32 is public
        assert!(validate_url("http://172.32.0.1/feed.xml").is_ok());
    }

    #[test]
    fn test_is_forbidden_hostname() {
        assert!(is_forbidden_hostname("localhost"));
        assert!(is_forbidden_hostname("LOCALHOST"));
        assert!(is_forbidden_hostname("api.localhost"));
        assert!(is_forbidden_hostname("corp.intranet"));
        assert!(is_forbidden_hostname("nas.lan"));

        assert!(!is_forbidden_hostname("example.com"));
        assert!(!is_forbidden_hostname("localhost.example.com"));
    }

    #[test]
    fn test_is_private_ip() {
        assert!(is_private_ip(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_ip(&"10.255.255.255".parse().unwrap()));
        assert!(is_private_ip(&"172.31.255.255".parse().unwrap()));
        assert!(is_private_ip(&"192.0.2.10".parse().unwrap()));
        assert!(is_private_ip(&"0.0.0.0".parse().unwrap()));
        assert!(!is_private_ip(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_ip(&"93.184.216.34".parse().unwrap()));

        assert!(is_private_ip(&"::".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));
        assert!(is_private_ip(&"fd00::1".parse().unwrap()));
        assert!(!is_private_ip(&"2001:4860:4860::8888".parse().unwrap()));
    }

    #[test]
    fn test_parse_feed_rss() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <description>&lt;p&gt;Hello &lt;img src="https://example.com/pic.png"&gt;&lt;/p&gt;</description>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <guid>guid-2</guid>
      <description>No title here</description>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Test Feed"));
        assert!(feed
            .site_url
            .as_ref()
            .unwrap()
            .starts_with("https://example.com"));
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.external_id, "guid-1");
        assert_eq!(first.title.as_deref(), Some("First Article"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/1"));
        assert!(first.content.contains("<p>Hello"));
        assert_eq!(
            first.thumbnail_url.as_deref(),
            Some("https://example.com/pic.png")
        );
        assert!(first.published_at.is_some());

        assert!(feed.entries[1].title.is_none());
    }

    #[test]
    fn test_parse_feed_prefers_content_over_summary() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Content Feed</title>
    <item>
      <title>Full</title>
      <guid>full-1</guid>
      <description>Short summary</description>
      <content:encoded><![CDATA[<p>Full body</p>]]></content:encoded>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.entries[0].content, "<p>Full body</p>");
    }

    #[test]
    fn test_parse_feed_enclosure_thumbnail() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Enclosures</title>
    <item>
      <title>With image</title>
      <guid>enc-1</guid>
      <enclosure url="https://cdn.example.com/cover.jpg" length="1000" type="image/jpeg"/>
      <description>&lt;img src="https://example.com/inline.png"&gt;</description>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(
            feed.entries[0].thumbnail_url.as_deref(),
            Some("https://cdn.example.com/cover.jpg")
        );
    }

    #[test]
    fn test_parse_feed_atom() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <link href="https://example.com"/>
  <id>urn:uuid:feed</id>
  <updated>2025-01-01T00:00:00Z</updated>
  <entry>
    <id>urn:uuid:1</id>
    <title>Atom Entry</title>
    <link href="https://example.com/entry"/>
    <summary>Entry summary</summary>
    <updated>2025-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

        let feed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Atom Feed"));
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed.entries[0].external_id, "urn:uuid:1");
        assert_eq!(feed.entries[0].content, "Entry summary");
        assert!(feed.entries[0].thumbnail_url.is_none());
        assert!(feed.entries[0].published_at.is_some());
    }

    #[test]
    fn test_parse_feed_invalid() {
        assert!(parse_feed(b"This is not XML").is_err());
    }

    #[test]
    fn test_first_image_src() {
        assert!(IMG_SRC_RE.is_some());
        assert_eq!(
            first_image_src(r#"<p>x</p><IMG class="a" SRC='https://e.com/a.gif'>"#).as_deref(),
            Some("https://e.com/a.gif")
        );
        assert_eq!(first_image_src("<p>no images</p>"), None);
    }

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension("https://e.com/a.PNG"));
        assert!(has_image_extension("https://e.com/a.jpg?w=200"));
        assert!(!has_image_extension("https://e.com/episode.mp3"));
    }

    #[tokio::test]
    async fn test_fetcher_rejects_private_hosts_by_default() {
        let fetcher = FeedFetcher::new(&RssConfig::default()).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/feed.xml").await;
        assert!(result.unwrap_err().to_string().contains("private IP"));
    }

    #[tokio::test]
    async fn test_fetcher_allow_private_still_checks_scheme() {
        let config = RssConfig {
            allow_private_hosts: true,
            ..RssConfig::default()
        };
        let fetcher = FeedFetcher::new(&config).unwrap();
        let result = fetcher.fetch("file:///etc/passwd").await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported URL scheme"));
    }
}
