//! The session object a thread belongs to.

use crate::protocol::ProtocolClient;
use crate::source::SourceContainer;
use std::sync::{Arc, RwLock};

/// Owner of a thread: protocol access, the current document URL and the
/// shared source registry.
pub trait Target: Send + Sync {
    fn protocol(&self) -> Arc<dyn ProtocolClient>;

    /// Current document URL. Empty when the target has not navigated.
    fn url(&self) -> String;

    fn source_container(&self) -> Arc<dyn SourceContainer>;
}

/// Plain [`Target`] over an existing client and registry.
pub struct StaticTarget {
    protocol: Arc<dyn ProtocolClient>,
    sources: Arc<dyn SourceContainer>,
    url: RwLock<String>,
}

impl StaticTarget {
    pub fn new(protocol: Arc<dyn ProtocolClient>, sources: Arc<dyn SourceContainer>) -> Self {
        Self {
            protocol,
            sources,
            url: RwLock::new(String::new()),
        }
    }

    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.set_url(url);
        self
    }

    pub fn set_url(&self, url: impl Into<String>) {
        let mut guard = self.url.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = url.into();
    }
}

impl Target for StaticTarget {
    fn protocol(&self) -> Arc<dyn ProtocolClient> {
        self.protocol.clone()
    }

    fn url(&self) -> String {
        self.url
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn source_container(&self) -> Arc<dyn SourceContainer> {
        self.sources.clone()
    }
}
