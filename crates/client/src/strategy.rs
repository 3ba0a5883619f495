//! The three URL resolution strategies.
//!
//! Each strategy fetches the URL, builds a serializable result and plugs into
//! [`hubble_core::resolve_cached`] through the [`Resolver`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use hubble_core::{Error, Resolver};

use crate::fetch::{FetchClient, FetchResponse};
use crate::image::{ImageSize, image_size};
use crate::meta::{PageMeta, extract_meta};

/// Content type of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeInfo {
    /// Final URL after redirects.
    pub href: String,
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MimeInfo {
    pub fn from_response(response: &FetchResponse) -> Self {
        Self { href: response.final_url.to_string(), content_type: response.content_type.clone() }
    }
}

/// Social graph and document metadata of an HTML page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub href: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub meta: PageMeta,
}

impl MetaInfo {
    /// Extract metadata from a fetched page. Fails unless the page is HTML.
    pub fn from_response(response: &FetchResponse) -> Result<Self, Error> {
        let content_type = match &response.content_type {
            Some(ct) if response.is_html() => ct.clone(),
            other => {
                return Err(Error::UnexpectedContentType(format!(
                    "expected text/html, found {}",
                    other.as_deref().unwrap_or("no content type")
                )));
            }
        };

        let html = String::from_utf8_lossy(&response.bytes);
        Ok(Self { href: response.final_url.to_string(), content_type, meta: extract_meta(&html) })
    }
}

/// Pixel dimensions of an image resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub href: String,
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: ImageSize,
}

impl ImageInfo {
    pub fn from_response(response: &FetchResponse) -> Result<Self, Error> {
        let size = image_size(&response.bytes)?;
        Ok(Self { href: response.final_url.to_string(), content_type: response.content_type.clone(), size })
    }
}

/// Looks up a resource's content type with a HEAD request.
pub struct MimeResolver {
    client: Arc<FetchClient>,
}

impl MimeResolver {
    pub const SUFFIX: &'static str = ":mime";

    pub fn new(client: Arc<FetchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver for MimeResolver {
    type Output = MimeInfo;

    fn suffix(&self) -> &'static str {
        Self::SUFFIX
    }

    fn failure_message(&self) -> &'static str {
        "Unable to determine content type."
    }

    async fn resolve(&self, url: &str) -> Result<MimeInfo, Error> {
        let response = self.client.head(url).await?;
        Ok(MimeInfo::from_response(&response))
    }
}

/// Fetches an HTML page and extracts its metadata.
pub struct MetaResolver {
    client: Arc<FetchClient>,
}

impl MetaResolver {
    pub const SUFFIX: &'static str = ":meta";

    pub fn new(client: Arc<FetchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver for MetaResolver {
    type Output = MetaInfo;

    fn suffix(&self) -> &'static str {
        Self::SUFFIX
    }

    fn failure_message(&self) -> &'static str {
        "Unable to read Social Graph or metadata for URL."
    }

    async fn resolve(&self, url: &str) -> Result<MetaInfo, Error> {
        let response = self.client.get(url).await?;
        MetaInfo::from_response(&response)
    }
}

/// Downloads an image and reads its dimensions.
pub struct ImageResolver {
    client: Arc<FetchClient>,
}

impl ImageResolver {
    pub const SUFFIX: &'static str = ":img";

    pub fn new(client: Arc<FetchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver for ImageResolver {
    type Output = ImageInfo;

    fn suffix(&self) -> &'static str {
        Self::SUFFIX
    }

    fn failure_message(&self) -> &'static str {
        "Unable to determine image size."
    }

    async fn resolve(&self, url: &str) -> Result<ImageInfo, Error> {
        let response = self.client.get(url).await?;
        ImageInfo::from_response(&response)
    }
}
