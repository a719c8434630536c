//! HTTP client for the catalog service.
//!
//! One client covers the three catalog-facing contracts: resolving
//! free-text suggestions, enumerating source collections and mutating
//! the live collection.

use crate::config::CatalogSettings;
use crate::rotation::{
    CatalogLookup, LiveItem, LiveListMutator, ResolvedItem, SourceCollectionReader, SourceItem,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Page size for collection item requests.
const PAGE_SIZE: usize = 100;
/// Result cap for the free-text search fallback.
const FALLBACK_SEARCH_LIMIT: usize = 5;

pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<CatalogTrack>,
}

#[derive(Deserialize)]
struct CatalogTrack {
    item_id: String,
    performer: String,
    #[serde(default)]
    release_date: String,
}

#[derive(Deserialize)]
struct CollectionResponse {
    name: String,
}

#[derive(Deserialize)]
struct CollectionItemsResponse {
    items: Vec<CollectionMember>,
    /// Offset of the next page, absent on the last one.
    next_offset: Option<usize>,
}

#[derive(Deserialize)]
struct CollectionMember {
    item_id: String,
    performer: String,
    title: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    added_at: Option<String>,
}

#[derive(Serialize)]
struct MutateItemsRequest<'a> {
    item_ids: &'a [String],
}

impl CatalogClient {
    pub fn new(settings: &CatalogSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
        })
    }

    fn get(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        let mut builder = self.client.get(url);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn post(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        let mut builder = self.client.post(url);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn search(&self, query: &[(&str, String)]) -> Result<Vec<CatalogTrack>> {
        let url = format!("{}/api/search", self.base_url);
        let response = self
            .get(&url)
            .query(query)
            .send()
            .context("Search request failed")?;
        if !response.status().is_success() {
            bail!("Search returned status {}", response.status());
        }
        let body: SearchResponse = response.json().context("Invalid search response")?;
        Ok(body.items)
    }

    fn collection_page(
        &self,
        collection_id: &str,
        offset: usize,
    ) -> Result<CollectionItemsResponse> {
        let url = format!("{}/api/collections/{}/items", self.base_url, collection_id);
        let response = self
            .get(&url)
            .query(&[("offset", offset.to_string()), ("limit", PAGE_SIZE.to_string())])
            .send()
            .with_context(|| format!("Failed to fetch items of collection {}", collection_id))?;
        if !response.status().is_success() {
            bail!(
                "Collection {} items returned status {}",
                collection_id,
                response.status()
            );
        }
        response.json().context("Invalid collection items response")
    }

    fn all_collection_members(&self, collection_id: &str) -> Result<Vec<CollectionMember>> {
        let mut members = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.collection_page(collection_id, offset)?;
            members.extend(page.items);
            match page.next_offset {
                Some(next) => offset = next,
                None => break,
            }
        }
        Ok(members)
    }

    fn mutate_collection(&self, collection_id: &str, action: &str, item_ids: &[String]) -> Result<()> {
        let url = format!(
            "{}/api/collections/{}/items/{}",
            self.base_url, collection_id, action
        );
        let response = self
            .post(&url)
            .json(&MutateItemsRequest { item_ids })
            .send()
            .with_context(|| format!("Failed to {} items in collection {}", action, collection_id))?;
        if !response.status().is_success() {
            bail!(
                "Collection {} {} returned status {}",
                collection_id,
                action,
                response.status()
            );
        }
        Ok(())
    }
}

impl CatalogLookup for CatalogClient {
    fn resolve(&self, performer: &str, title: &str) -> Result<Option<ResolvedItem>> {
        // Precise pass first
        let precise = self.search(&[
            ("performer", performer.to_string()),
            ("title", title.to_string()),
            ("limit", "1".to_string()),
        ])?;
        if let Some(track) = precise.into_iter().next() {
            return Ok(Some(ResolvedItem {
                item_id: track.item_id,
                release_date: track.release_date,
            }));
        }

        // Free-text fallback, kept only when the performer matches
        let fallback = self.search(&[
            ("q", format!("{} {}", performer, title)),
            ("limit", FALLBACK_SEARCH_LIMIT.to_string()),
        ])?;
        let wanted = performer.to_lowercase();
        for track in fallback {
            if track.performer.to_lowercase().contains(&wanted) {
                debug!(performer, title, item = %track.item_id, "Resolved via free-text search");
                return Ok(Some(ResolvedItem {
                    item_id: track.item_id,
                    release_date: track.release_date,
                }));
            }
        }
        Ok(None)
    }
}

impl SourceCollectionReader for CatalogClient {
    fn collection_name(&self, collection_id: &str) -> Result<String> {
        let url = format!("{}/api/collections/{}", self.base_url, collection_id);
        let response = self
            .get(&url)
            .send()
            .with_context(|| format!("Failed to fetch collection {}", collection_id))?;
        if !response.status().is_success() {
            bail!(
                "Collection {} returned status {}",
                collection_id,
                response.status()
            );
        }
        let body: CollectionResponse = response.json().context("Invalid collection response")?;
        Ok(body.name)
    }

    fn collection_items(&self, collection_id: &str) -> Result<Vec<SourceItem>> {
        let members = self.all_collection_members(collection_id)?;
        Ok(members
            .into_iter()
            .map(|member| SourceItem {
                item_id: member.item_id,
                performer: member.performer,
                title: member.title,
                album: member.album,
                release_date: member.release_date,
            })
            .collect())
    }
}

impl LiveListMutator for CatalogClient {
    fn add_items(&self, collection_id: &str, item_ids: &[String]) -> Result<()> {
        self.mutate_collection(collection_id, "add", item_ids)
    }

    fn remove_items(&self, collection_id: &str, item_ids: &[String]) -> Result<()> {
        self.mutate_collection(collection_id, "remove", item_ids)
    }

    fn list_items(&self, collection_id: &str) -> Result<Vec<LiveItem>> {
        let members = self.all_collection_members(collection_id)?;
        Ok(members
            .into_iter()
            .map(|member| LiveItem {
                added_at: member.added_at.as_deref().and_then(parse_added_at),
                item_id: member.item_id,
                performer: member.performer,
                title: member.title,
                release_date: member.release_date,
            })
            .collect())
    }
}

/// Parse an RFC 3339 addition timestamp; malformed values become `None`.
fn parse_added_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
