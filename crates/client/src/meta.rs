//! Social graph and document metadata extraction from HTML.
//!
//! `<meta>` tags are bucketed by namespace: Open Graph (`og:`), Twitter Card
//! (`twitter:`), Dublin Core (`dc.`) and DC terms (`dcterms.`). When a page
//! has none of these, plain `description` and `author`/`creator` tags are
//! used instead. The `<title>` text is always included when present.

use std::collections::BTreeMap;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Metadata extracted from one HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcterms: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PageMeta {
    /// Whether any namespaced bucket was found.
    pub fn has_social_graph(&self) -> bool {
        self.og.is_some() || self.twitter.is_some() || self.dc.is_some() || self.dcterms.is_some()
    }
}

/// Extract metadata from an HTML document.
pub fn extract_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);
    let mut meta = PageMeta::default();

    let (Ok(meta_selector), Ok(title_selector)) = (Selector::parse("meta"), Selector::parse("title")) else {
        return meta;
    };

    let mut og = BTreeMap::new();
    let mut twitter = BTreeMap::new();
    let mut dc = BTreeMap::new();
    let mut dcterms = BTreeMap::new();
    let mut plain = Vec::new();

    for element in document.select(&meta_selector) {
        let attrs = element.value();
        // Pages mix `name` and `property`, and `content` and `value`.
        let name = non_empty(attrs.attr("name")).or_else(|| non_empty(attrs.attr("property"))).unwrap_or_default();
        let name = name.to_lowercase();
        let content = non_empty(attrs.attr("content")).or_else(|| non_empty(attrs.attr("value"))).unwrap_or_default();

        if name.starts_with("og:") {
            og.insert(name, content.to_string());
        } else if name.starts_with("twitter:") {
            twitter.insert(name, content.to_string());
        } else if name.starts_with("dc.") {
            dc.insert(name, content.to_string());
        } else if name.starts_with("dcterms.") {
            dcterms.insert(name, content.to_string());
        } else {
            plain.push((name, content));
        }
    }

    meta.og = Some(og).filter(|bucket| !bucket.is_empty());
    meta.twitter = Some(twitter).filter(|bucket| !bucket.is_empty());
    meta.dc = Some(dc).filter(|bucket| !bucket.is_empty());
    meta.dcterms = Some(dcterms).filter(|bucket| !bucket.is_empty());

    if !meta.has_social_graph() {
        for (name, content) in plain {
            match name.as_str() {
                "description" => meta.description = Some(content.to_string()),
                "author" | "creator" => meta.author = Some(content.to_string()),
                _ => {}
            }
        }
    }

    let title: String = document.select(&title_selector).flat_map(|el| el.text()).collect();
    let title = title.trim();
    if !title.is_empty() {
        meta.title = Some(title.to_string());
    }

    meta
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_graph_buckets() {
        let html = r#"
            <html>
                <head>
                    <title>Example Page</title>
                    <meta property="og:title" content="This is a title">
                    <meta name="og:url" content="http://foo.com">
                    <meta name="twitter:title" content="This is also a title">
                    <meta name="description" content="ignored when social graph exists">
                </head>
            </html>
        "#;

        let meta = extract_meta(html);
        let og = meta.og.as_ref().unwrap();
        assert_eq!(og["og:title"], "This is a title");
        assert_eq!(og["og:url"], "http://foo.com");
        assert_eq!(meta.twitter.as_ref().unwrap()["twitter:title"], "This is also a title");
        assert!(meta.dc.is_none());
        assert!(meta.description.is_none());
        assert_eq!(meta.title.as_deref(), Some("Example Page"));
    }

    #[test]
    fn test_dublin_core() {
        let html = r#"
            <head>
                <meta name="DC.Creator" content="Jane Roe">
                <meta name="dcterms.created" content="2013-04-01">
            </head>
        "#;

        let meta = extract_meta(html);
        assert_eq!(meta.dc.as_ref().unwrap()["dc.creator"], "Jane Roe");
        assert_eq!(meta.dcterms.as_ref().unwrap()["dcterms.created"], "2013-04-01");
    }

    #[test]
    fn test_fallback_to_plain_metadata() {
        let html = r#"
            <head>
                <title>Plain</title>
                <meta name="description" content="A plain page">
                <meta name="author" content="First Author">
                <meta name="creator" content="Second Author">
                <meta name="keywords" content="ignored">
            </head>
        "#;

        let meta = extract_meta(html);
        assert!(!meta.has_social_graph());
        assert_eq!(meta.description.as_deref(), Some("A plain page"));
        assert_eq!(meta.author.as_deref(), Some("Second Author"));
        assert_eq!(meta.title.as_deref(), Some("Plain"));
    }

    #[test]
    fn test_value_attribute_and_lowercased_names() {
        let html = r#"<head><meta property="OG:Image" value="http://foo.com/a.png"></head>"#;

        let meta = extract_meta(html);
        assert_eq!(meta.og.unwrap()["og:image"], "http://foo.com/a.png");
    }

    #[test]
    fn test_empty_document() {
        let meta = extract_meta("<html><head><title>   </title></head></html>");
        assert_eq!(meta, PageMeta::default());
        assert_eq!(serde_json::to_string(&meta).unwrap(), "{}");
    }

    #[test]
    fn test_serialization_shape() {
        let meta = extract_meta(r#"<head><title>T</title><meta name="twitter:card" content="summary"></head>"#);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["twitter"]["twitter:card"], "summary");
        assert_eq!(json["title"], "T");
        assert!(json.get("og").is_none());
    }
}
