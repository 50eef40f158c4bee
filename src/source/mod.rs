//! Script sources and the registry they are shared through.

mod registry;

pub use registry::{SourceContainer, SourceRegistry};

use crate::error::Result;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// Future returned by a [`ContentGetter`].
pub type ContentFuture = BoxFuture<'static, Result<String>>;

/// Deferred content retrieval bound to a source when it is created.
pub type ContentGetter = Box<dyn Fn() -> ContentFuture + Send + Sync>;

/// Registry-wide identifier of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl SourceId {
    /// Generate a new unique source ID.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// A script known to the debugger, with lazily fetched text.
///
/// The getter runs on the first [`Source::content`] call. A successful
/// result is cached; a failed one is returned to the caller and the next
/// call tries again.
pub struct Source {
    id: SourceId,
    url: String,
    content: OnceCell<String>,
    getter: ContentGetter,
}

impl Source {
    pub fn new(url: impl Into<String>, getter: ContentGetter) -> Self {
        Self {
            id: SourceId::new(),
            url: url.into(),
            content: OnceCell::new(),
            getter,
        }
    }

    /// Source whose text is already known.
    pub fn from_text(url: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let getter: ContentGetter = Box::new(move || {
            let text = text.clone();
            async move { Ok(text) }.boxed()
        });
        Self::new(url, getter)
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Display URL: the script URL, or a synthetic `VM<id>` name.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn content(&self) -> Result<String> {
        self.content
            .get_or_try_init(|| (self.getter)())
            .await
            .cloned()
    }

    pub fn is_content_loaded(&self) -> bool {
        self.content.initialized()
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("loaded", &self.is_content_loaded())
            .finish()
    }
}
