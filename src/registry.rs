use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::models::Platform;

/// Platforms known before the backend has answered once.
pub fn default_platforms() -> Vec<Platform> {
    vec![
        Platform::new("zhihu", "知乎热榜", "#0066ff"),
        Platform::new("weibo", "微博热搜", "#ff6b35"),
        Platform::new("bilibili", "B站热榜", "#fb7299"),
        Platform::new("douyin", "抖音热榜", "#000000"),
        Platform::new("baidu", "百度热搜", "#2932e1"),
        Platform::new("toutiao", "头条热榜", "#ff4757"),
    ]
}

/// Shared handle to the authoritative platform list.
///
/// The fetch pipeline is the only writer; it swaps the whole list after every
/// successful fetch. Readers always see either the old or the new list, never a mix.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    inner: Arc<RwLock<Vec<Platform>>>,
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::with_platforms(default_platforms())
    }

    pub fn with_platforms(platforms: Vec<Platform>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(platforms)),
        }
    }

    /// Full replacement, no merge with the previous list.
    pub fn replace(&self, platforms: Vec<Platform>) {
        debug!(count = platforms.len(), "replacing platform registry");
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = platforms;
    }

    pub fn get_by_id(&self, id: &str) -> Option<Platform> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<Platform> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
