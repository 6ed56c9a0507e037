use tracing::debug;

use crate::hot::{HotUnit, parse_hot_score};
use crate::models::{HotlistItem, Platform, PlatformRecord, non_empty};

pub const DEFAULT_PLATFORM_COLOR: &str = "#666666";

/// Platform list as announced by one response, in response order.
pub fn derive_platforms(records: &[PlatformRecord]) -> Vec<Platform> {
    records
        .iter()
        .filter_map(|record| {
            let id = record.platform_id()?;
            Some(Platform {
                id: id.to_string(),
                name: record.name.clone().unwrap_or_else(|| id.to_string()),
                key: id.to_string(),
                color: non_empty(record.icon_color.as_deref())
                    .unwrap_or(DEFAULT_PLATFORM_COLOR)
                    .to_string(),
            })
        })
        .collect()
}

/// Flatten per-platform records into items, preserving source order.
///
/// Records without a data array or without any usable id are skipped; entries
/// missing a title or link are dropped. Pure function of its input.
pub fn transform(records: &[PlatformRecord], units: &[HotUnit]) -> Vec<HotlistItem> {
    let mut items = Vec::new();

    for record in records {
        let Some(entries) = record.data.as_ref() else {
            continue;
        };
        let Some(platform_id) = record.platform_id() else {
            debug!(record_id = ?record.id, "skipping platform record without key or name");
            continue;
        };
        let platform_name = record.name.as_deref().unwrap_or(platform_id);

        for (index, entry) in entries.iter().enumerate() {
            let (Some(title), Some(url)) = (non_empty(entry.title.as_deref()), non_empty(entry.link.as_deref()))
            else {
                debug!(platform = %platform_id, index, "dropping entry without title or link");
                continue;
            };

            let extra = entry.extra_text();
            let suffix = entry.source_id().unwrap_or_else(|| index.to_string());

            items.push(HotlistItem {
                id: format!("{platform_id}-{suffix}"),
                title: title.to_string(),
                url: url.to_string(),
                hot: parse_hot_score(extra.as_deref(), units),
                platform: platform_id.to_string(),
                platform_name: platform_name.to_string(),
            });
        }
    }

    items
}
