//! Shared source registry.

use super::{Source, SourceId};
use crate::lock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use url::Url;

/// Cross-thread store of sources that threads register into.
///
/// Implementations must tolerate interleaved calls from several threads.
pub trait SourceContainer: Send + Sync {
    fn add_source(&self, source: Arc<Source>);

    /// Remove every given source in one step.
    fn remove_sources(&self, sources: &[Arc<Source>]);

    /// Associate a resolved source map URL with a registered source.
    /// Fetching and parsing the map is up to the container.
    fn attach_source_map(&self, source: &Arc<Source>, source_map_url: Url);
}

#[derive(Debug)]
struct Entry {
    source: Arc<Source>,
    source_map_url: Option<Url>,
}

/// In-memory [`SourceContainer`] keyed by [`SourceId`].
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Mutex<HashMap<SourceId, Entry>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SourceId) -> Option<Arc<Source>> {
        lock(&self.entries).get(&id).map(|e| e.source.clone())
    }

    /// Sources registered under `url`, oldest first.
    pub fn find_by_url(&self, url: &str) -> Vec<Arc<Source>> {
        let mut found: Vec<_> = lock(&self.entries)
            .values()
            .filter(|e| e.source.url() == url)
            .map(|e| e.source.clone())
            .collect();
        found.sort_by_key(|s| s.id());
        found
    }

    pub fn source_map_url(&self, id: SourceId) -> Option<Url> {
        lock(&self.entries)
            .get(&id)
            .and_then(|e| e.source_map_url.clone())
    }

    /// All sources, oldest first.
    pub fn sources(&self) -> Vec<Arc<Source>> {
        let mut all: Vec<_> = lock(&self.entries)
            .values()
            .map(|e| e.source.clone())
            .collect();
        all.sort_by_key(|s| s.id());
        all
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SourceContainer for SourceRegistry {
    fn add_source(&self, source: Arc<Source>) {
        debug!(source = %source.id(), url = source.url(), "Adding source");
        lock(&self.entries).entry(source.id()).or_insert(Entry {
            source,
            source_map_url: None,
        });
    }

    fn remove_sources(&self, sources: &[Arc<Source>]) {
        let mut entries = lock(&self.entries);
        for source in sources {
            entries.remove(&source.id());
        }
        debug!(count = sources.len(), remaining = entries.len(), "Removed sources");
    }

    fn attach_source_map(&self, source: &Arc<Source>, source_map_url: Url) {
        match lock(&self.entries).get_mut(&source.id()) {
            Some(entry) => {
                debug!(source = %source.id(), map = %source_map_url, "Attaching source map");
                entry.source_map_url = Some(source_map_url);
            }
            None => debug!(source = %source.id(), "Source map for unregistered source ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> Arc<Source> {
        Arc::new(Source::from_text(url, ""))
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = SourceRegistry::new();
        let a = source("a.js");
        registry.add_source(a.clone());
        registry.add_source(a.clone());
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get(a.id()).unwrap(), &a));
    }

    #[test]
    fn test_remove_only_given_sources() {
        let registry = SourceRegistry::new();
        let a = source("a.js");
        let b = source("b.js");
        let c = source("c.js");
        for s in [&a, &b, &c] {
            registry.add_source(s.clone());
        }

        registry.remove_sources(&[a.clone(), c.clone()]);
        let left = registry.sources();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id(), b.id());
    }

    #[test]
    fn test_attach_source_map() {
        let registry = SourceRegistry::new();
        let a = source("https://x/app.js");
        registry.add_source(a.clone());

        let map = Url::parse("https://x/app.js.map").unwrap();
        registry.attach_source_map(&a, map.clone());
        assert_eq!(registry.source_map_url(a.id()), Some(map));
    }

    #[test]
    fn test_attach_to_unknown_source_is_ignored() {
        let registry = SourceRegistry::new();
        let a = source("a.js");
        registry.attach_source_map(&a, Url::parse("https://x/a.js.map").unwrap());
        assert!(registry.is_empty());
        assert!(registry.source_map_url(a.id()).is_none());
    }

    #[test]
    fn test_find_by_url() {
        let registry = SourceRegistry::new();
        let first = source("VM1");
        let second = source("VM1");
        registry.add_source(second.clone());
        registry.add_source(first.clone());
        registry.add_source(source("VM2"));

        let found = registry.find_by_url("VM1");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id(), first.id());
    }
}
