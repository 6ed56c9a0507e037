use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FetchResult, HotlistItem};

/// Last-known hot list plus the flags the UI layer renders around it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreSnapshot {
    pub items: Vec<HotlistItem>,
    pub last_updated: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
    pub source: Option<String>,
}

/// Per-request view over the item list. An empty query returns everything in source order.
#[derive(Debug, Clone, Default)]
pub struct HotlistQuery {
    pub search: Option<String>,
    pub platforms: Vec<String>,
    pub sort_by_hot: bool,
    pub limit: Option<usize>,
}

impl HotlistQuery {
    pub fn matches(&self, item: &HotlistItem) -> bool {
        if !self.platforms.is_empty() && !self.platforms.iter().any(|p| *p == item.platform) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                item.title.to_lowercase().contains(&q) || item.platform_name.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }

    pub fn apply(&self, items: &[HotlistItem]) -> Vec<HotlistItem> {
        let mut out: Vec<HotlistItem> = items.iter().filter(|i| self.matches(i)).cloned().collect();
        if self.sort_by_hot {
            sort_by_hot_desc(&mut out);
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

/// Stable, so equal scores keep source order.
pub fn sort_by_hot_desc(items: &mut [HotlistItem]) {
    items.sort_by(|a, b| b.hot.partial_cmp(&a.hot).unwrap_or(Ordering::Equal));
}

#[derive(Debug, Clone, Default)]
pub struct HotlistStore {
    inner: Arc<RwLock<StoreSnapshot>>,
}

impl HotlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a successful fetch. Clears any previous error.
    pub fn set_items(&self, result: FetchResult) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.items = result.data;
        state.last_updated = Some(result.timestamp);
        state.source = Some(result.source);
        state.error = result.error;
        state.loading = false;
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).loading = loading;
    }

    /// Record a failed refresh. Previously published items stay visible.
    pub fn set_error(&self, message: impl Into<String>) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.error = Some(message.into());
        state.loading = false;
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn item_count(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).items.len()
    }

    pub fn filtered(&self, query: &HotlistQuery) -> Vec<HotlistItem> {
        query.apply(&self.inner.read().unwrap_or_else(PoisonError::into_inner).items)
    }

    /// Items of one platform, hottest first.
    pub fn by_platform(&self, platform_id: &str, limit: Option<usize>) -> Vec<HotlistItem> {
        self.filtered(&HotlistQuery {
            platforms: vec![platform_id.to_string()],
            sort_by_hot: true,
            limit,
            ..Default::default()
        })
    }
}
