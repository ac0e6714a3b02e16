//! OPML subscription list parsing.

use ::opml::{Outline, OPML};

use crate::error::{NewsdeskError, Result};
use crate::rss::types::OpmlSubscription;

/// Parse an OPML document into its feed subscriptions.
///
/// Nested outlines (folders) are flattened in document order. An outline is a
/// subscription when it carries an `xmlUrl`; a URL listed twice is kept
/// once, at its first position.
pub fn parse_opml(document: &str) -> Result<Vec<OpmlSubscription>> {
    let opml = OPML::from_str(document)
        .map_err(|e| NewsdeskError::Opml(format!("failed to parse OPML: {}", e)))?;

    let mut subscriptions = Vec::new();
    collect(&opml.body.outlines, &mut subscriptions);
    Ok(subscriptions)
}

fn collect(outlines: &[Outline], out: &mut Vec<OpmlSubscription>) {
    for outline in outlines {
        if let Some(url) = outline.xml_url.as_deref().map(str::trim) {
            if !url.is_empty() && !out.iter().any(|s| s.rss_url == url) {
                out.push(OpmlSubscription {
                    name: subscription_name(outline, url),
                    rss_url: url.to_string(),
                });
            }
        }
        collect(&outline.outlines, out);
    }
}

/// `title`, else `text`, else the feed host.
fn subscription_name(outline: &Outline, url: &str) -> String {
    outline
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| Some(outline.text.trim()).filter(|t| !t.is_empty()))
        .map(String::from)
        .or_else(|| {
            url::Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(String::from))
        })
        .unwrap_or_else(|| url.to_string())
}
