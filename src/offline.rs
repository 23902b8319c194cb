//! Offline cache planner
//!
//! The browser's service worker pre-fetches every file a game needs into a
//! versioned cache, answers requests from that cache first, and drops caches
//! left over from older versions. This module holds the decisions; the
//! network and the cache store are behind [`Network`] and [`CacheStorage`]
//! so the same logic runs headless.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game name that stands for every game in the manifest, and cache prefix
pub const ALL_GAMES: &str = "games2d";

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("no game_name in the worker's query string")]
    MissingGame,
    #[error("game '{0}' is not in the manifest")]
    UnknownGame(String),
    #[error("fetch of '{url}' failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("fetch of '{url}' returned status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Files to cache, per game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    files: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, OfflineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, game: &str, files: Vec<String>) {
        self.files.insert(game.to_string(), files);
    }

    /// Files to pre-fetch for `game`, duplicates removed keeping the first
    /// occurrence. [`ALL_GAMES`] takes the union of every game, in name
    /// order.
    pub fn install_list(&self, game: &str) -> Result<Vec<String>, OfflineError> {
        let files: Vec<&String> = if game == ALL_GAMES {
            self.files.values().flatten().collect()
        } else {
            self.files
                .get(game)
                .ok_or_else(|| OfflineError::UnknownGame(game.to_string()))?
                .iter()
                .collect()
        };

        let mut list: Vec<String> = Vec::with_capacity(files.len());
        for file in files {
            if !list.contains(file) {
                list.push(file.clone());
            }
        }
        Ok(list)
    }
}

/// Split a `?a=1&b=2` query string. A key without `=` maps to "".
pub fn query_params(search: &str) -> BTreeMap<String, String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (kv.to_string(), String::new()),
        })
        .collect()
}

/// The `game_name` the worker was registered with
pub fn game_name(search: &str) -> Option<String> {
    query_params(search)
        .remove("game_name")
        .filter(|name| !name.is_empty())
}

/// Cache name for a release
pub fn cache_name(version: &str) -> String {
    format!("{}-{}", ALL_GAMES, version)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where [`OfflineCache::fetch`] found a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

pub trait Network {
    fn fetch(&mut self, url: &str) -> Result<Response, OfflineError>;
}

/// Named caches of responses keyed by URL (the browser's `caches`)
pub trait CacheStorage {
    /// Store `responses` in cache `name`, creating it if needed
    fn put_all(&mut self, name: &str, responses: Vec<Response>);
    /// First cached response for `url` across all caches
    fn match_url(&self, url: &str) -> Option<Response>;
    fn keys(&self) -> Vec<String>;
    fn delete(&mut self, name: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCaches {
    caches: BTreeMap<String, BTreeMap<String, Response>>,
}

impl MemoryCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, name: &str) -> usize {
        self.caches.get(name).map_or(0, BTreeMap::len)
    }
}

impl CacheStorage for MemoryCaches {
    fn put_all(&mut self, name: &str, responses: Vec<Response>) {
        let cache = self.caches.entry(name.to_string()).or_default();
        for response in responses {
            cache.insert(response.url.clone(), response);
        }
    }

    fn match_url(&self, url: &str) -> Option<Response> {
        self.caches
            .values()
            .find_map(|cache| cache.get(url))
            .cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }
}

/// The worker's three lifecycle steps for one release
#[derive(Debug, Clone)]
pub struct OfflineCache {
    name: String,
}

impl OfflineCache {
    pub fn new(version: &str) -> Self {
        Self {
            name: cache_name(version),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pre-fetch every file for `game`. Nothing is stored unless every
    /// fetch succeeds with an ok status.
    pub fn install(
        &self,
        manifest: &Manifest,
        game: &str,
        caches: &mut dyn CacheStorage,
        network: &mut dyn Network,
    ) -> Result<usize, OfflineError> {
        let files = manifest.install_list(game)?;
        log::info!("{}: installing {} files into {}", game, files.len(), self.name);

        let mut responses = Vec::with_capacity(files.len());
        for url in &files {
            let response = network.fetch(url)?;
            if !response.ok() {
                return Err(OfflineError::Status {
                    url: url.clone(),
                    status: response.status,
                });
            }
            responses.push(response);
        }

        let count = responses.len();
        caches.put_all(&self.name, responses);
        Ok(count)
    }

    /// Serve `url` from the cache, else from the network without storing it
    pub fn fetch(
        &self,
        url: &str,
        caches: &dyn CacheStorage,
        network: &mut dyn Network,
    ) -> Result<(Response, Source), OfflineError> {
        if let Some(response) = caches.match_url(url) {
            log::debug!("{} served from cache", url);
            return Ok((response, Source::Cache));
        }
        log::debug!("{} not cached", url);
        Ok((network.fetch(url)?, Source::Network))
    }

    /// Delete caches from other releases; returns their names
    pub fn activate(&self, caches: &mut dyn CacheStorage) -> Vec<String> {
        let stale: Vec<String> = caches
            .keys()
            .into_iter()
            .filter(|name| *name != self.name)
            .collect();
        for name in &stale {
            caches.delete(name);
            log::info!("Deleted stale cache {}", name);
        }
        stale
    }
}
