use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::hot::format_hot_score;
use crate::models::HotlistItem;
use crate::registry::PlatformRegistry;
use crate::store::{HotlistQuery, HotlistStore};

#[derive(Clone)]
pub struct AppState {
    pub store: HotlistStore,
    pub registry: PlatformRegistry,
    pub refresh: mpsc::Sender<()>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/hotlist", get(hotlist_handler))
        .route("/api/platforms", get(platforms_handler))
        .route("/api/platforms/{id}", get(platform_handler))
        .route("/api/platforms/{id}/items", get(platform_items_handler))
        .route("/api/status", get(status_handler))
        .route("/api/refresh", post(refresh_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct HotlistParams {
    q: Option<String>,
    /// Comma-separated platform ids.
    platform: Option<String>,
    /// `hot` sorts hottest first; anything else keeps source order.
    sort: Option<String>,
    limit: Option<usize>,
}

impl HotlistParams {
    fn to_query(&self) -> HotlistQuery {
        let platforms = self
            .platform
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        HotlistQuery {
            search: self.q.clone(),
            platforms,
            sort_by_hot: self.sort.as_deref() == Some("hot"),
            limit: self.limit,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemView {
    #[serde(flatten)]
    item: HotlistItem,
    hot_display: String,
}

impl From<HotlistItem> for ItemView {
    fn from(item: HotlistItem) -> Self {
        let hot_display = format_hot_score(item.hot);
        Self { item, hot_display }
    }
}

#[derive(Serialize)]
struct HotlistResponse {
    data: Vec<ItemView>,
    source: Option<String>,
    /// Milliseconds since the epoch of the last successful fetch.
    timestamp: Option<i64>,
    error: Option<String>,
    total: usize,
    count: usize,
}

async fn hotlist_handler(State(state): State<AppState>, Query(params): Query<HotlistParams>) -> Json<HotlistResponse> {
    let query = params.to_query();
    let snapshot = state.store.snapshot();
    let data: Vec<ItemView> = query.apply(&snapshot.items).into_iter().map(ItemView::from).collect();

    debug!(total = snapshot.items.len(), count = data.len(), "serving hot list");

    Json(HotlistResponse {
        total: snapshot.items.len(),
        count: data.len(),
        data,
        source: snapshot.source,
        timestamp: snapshot.last_updated.map(|t| t.timestamp_millis()),
        error: snapshot.error,
    })
}

async fn platforms_handler(State(state): State<AppState>) -> Response {
    Json(state.registry.all()).into_response()
}

async fn platform_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.registry.get_by_id(&id) {
        Some(platform) => Json(platform).into_response(),
        None => (StatusCode::NOT_FOUND, format!("No platform '{id}'")).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    limit: Option<usize>,
}

async fn platform_items_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Response {
    if state.registry.get_by_id(&id).is_none() {
        return (StatusCode::NOT_FOUND, format!("No platform '{id}'")).into_response();
    }
    let items: Vec<ItemView> = state
        .store
        .by_platform(&id, params.limit)
        .into_iter()
        .map(ItemView::from)
        .collect();
    Json(items).into_response()
}

#[derive(Serialize)]
struct StatusResponse {
    loading: bool,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
    source: Option<String>,
    items: usize,
    platforms: usize,
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.store.snapshot();
    Json(StatusResponse {
        items: snapshot.items.len(),
        loading: snapshot.loading,
        error: snapshot.error,
        last_updated: snapshot.last_updated,
        source: snapshot.source,
        platforms: state.registry.all().len(),
    })
}

async fn refresh_handler(State(state): State<AppState>) -> Response {
    match state.refresh.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => (StatusCode::ACCEPTED, "refresh scheduled").into_response(),
        Err(TrySendError::Closed(())) => {
            warn!("refresh requested but poller is not running");
            (StatusCode::SERVICE_UNAVAILABLE, "poller is not running").into_response()
        }
    }
}
