//! HTML directory listing scraper

use async_trait::async_trait;
use portpatch_config::{expand_template, SourcesConfig};
use portpatch_errors::Error;
use portpatch_net::{fetch_text, NetClient};
use portpatch_types::{has_patch_suffix, PatchCandidate, PatchSource, StrategyKind};
use regex::Regex;

use crate::DiscoveryStrategy;

/// Scrapes `href` attributes out of a listing page
///
/// Only the last path segment of each link is kept, so relative links, full
/// blob URLs and raw URLs all reduce to the same file name.
pub struct DirectoryListing {
    client: NetClient,
    listing_url: String,
    raw_url: String,
    suffixes: Vec<String>,
    href: Regex,
}

impl DirectoryListing {
    /// # Errors
    ///
    /// Returns an error if the link pattern fails to compile.
    pub fn new(
        client: NetClient,
        listing_url: impl Into<String>,
        raw_url: impl Into<String>,
        suffixes: Vec<String>,
    ) -> Result<Self, Error> {
        let href = Regex::new(r#"href\s*=\s*["']?([^"'\s>]+)"#)
            .map_err(|e| Error::internal(format!("invalid href pattern: {e}")))?;
        Ok(Self {
            client,
            listing_url: listing_url.into(),
            raw_url: raw_url.into(),
            suffixes,
            href,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the link pattern fails to compile.
    pub fn from_config(client: NetClient, config: &SourcesConfig) -> Result<Self, Error> {
        Self::new(
            client,
            &config.listing_url,
            &config.raw_url,
            config.suffixes.clone(),
        )
    }

    /// File names linked from `html` that carry a patch suffix, in page order
    #[must_use]
    pub fn extract_file_names(&self, html: &str) -> Vec<String> {
        self.href
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| link_file_name(m.as_str()))
            .filter(|name| has_patch_suffix(name, &self.suffixes))
            .map(ToString::to_string)
            .collect()
    }
}

fn link_file_name(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    (!name.is_empty()).then_some(name)
}

#[async_trait]
impl DiscoveryStrategy for DirectoryListing {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectoryListing
    }

    async fn list_patches(&self, source: &PatchSource) -> Result<Vec<PatchCandidate>, Error> {
        let url = expand_template(&self.listing_url, &source.id, &source.reference, None);
        let html = fetch_text(&self.client, &url).await?;

        Ok(self
            .extract_file_names(&html)
            .into_iter()
            .map(|file_name| PatchCandidate {
                url: expand_template(
                    &self.raw_url,
                    &source.id,
                    &source.reference,
                    Some(&file_name),
                ),
                source: source.id.clone(),
                file_name,
                strategy: StrategyKind::DirectoryListing,
            })
            .collect())
    }
}
