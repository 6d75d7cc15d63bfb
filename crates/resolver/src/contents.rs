//! Structured contents API listing

use async_trait::async_trait;
use portpatch_config::{expand_template, SourcesConfig};
use portpatch_errors::Error;
use portpatch_net::{fetch_json, NetClient};
use portpatch_types::{has_patch_suffix, PatchCandidate, PatchSource, StrategyKind};
use serde::Deserialize;

use crate::DiscoveryStrategy;

/// One entry of a contents API response
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

/// Reads a JSON array of directory entries
pub struct ContentsApi {
    client: NetClient,
    api_url: String,
    raw_url: String,
    suffixes: Vec<String>,
    token: Option<String>,
}

impl ContentsApi {
    #[must_use]
    pub fn new(
        client: NetClient,
        api_url: impl Into<String>,
        raw_url: impl Into<String>,
        suffixes: Vec<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            raw_url: raw_url.into(),
            suffixes,
            token: None,
        }
    }

    #[must_use]
    pub fn from_config(client: NetClient, config: &SourcesConfig) -> Self {
        Self::new(
            client,
            &config.api_url,
            &config.raw_url,
            config.suffixes.clone(),
        )
        .with_token(config.api_token.clone())
    }

    /// Bearer token sent with every API request
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[async_trait]
impl DiscoveryStrategy for ContentsApi {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ContentsApi
    }

    async fn list_patches(&self, source: &PatchSource) -> Result<Vec<PatchCandidate>, Error> {
        let url = expand_template(&self.api_url, &source.id, &source.reference, None);

        let authorization = self.token.as_ref().map(|t| format!("Bearer {t}"));
        let mut headers = vec![("Accept", "application/json")];
        if let Some(value) = authorization.as_deref() {
            headers.push(("Authorization", value));
        }

        let entries: Vec<ContentEntry> = fetch_json(&self.client, &url, &headers).await?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind.as_deref().is_none_or(|kind| kind == "file"))
            .filter(|entry| has_patch_suffix(&entry.name, &self.suffixes))
            .map(|entry| PatchCandidate {
                url: entry.download_url.unwrap_or_else(|| {
                    expand_template(
                        &self.raw_url,
                        &source.id,
                        &source.reference,
                        Some(&entry.name),
                    )
                }),
                source: source.id.clone(),
                file_name: entry.name,
                strategy: StrategyKind::ContentsApi,
            })
            .collect())
    }
}
