use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A content source whose hot list is aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub key: String,
    pub color: String,
}

impl Platform {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            key: id.to_string(),
            color: color.to_string(),
        }
    }
}

/// One trending entry after normalization. `title` and `url` are never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotlistItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub hot: f64,
    pub platform: String,
    pub platform_name: String,
}

/// Output of one successful pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub data: Vec<HotlistItem>,
    pub source: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---- Wire format of the aggregation backend ----
//
// Everything except `status` is optional. Fields of the wrong JSON type
// deserialize to `None` so a single odd record never fails the whole envelope.

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub data: Option<Vec<PlatformRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    // Backend display order; records already arrive sorted.
    #[allow(dead_code)]
    #[serde(default, deserialize_with = "lenient_i64")]
    pub sort: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub icon_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub data: Option<Vec<ItemRecord>>,
}

impl PlatformRecord {
    /// `source_key` when present, else the display name.
    pub fn platform_id(&self) -> Option<&str> {
        non_empty(self.source_key.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default)]
    pub extra: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
}

impl ItemRecord {
    /// Upstream id as text. Zero and empty ids count as absent.
    pub fn source_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// The raw popularity text, e.g. `"1731 万"`. Bare numbers are accepted too.
    pub fn extra_text(&self) -> Option<String> {
        match self.extra.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Non-arrays become `None`; array entries that are not objects of the right shape are dropped.
fn lenient_records<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(entries)) => Some(
            entries
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_odd_field_types() {
        let raw = r#"{
            "status": 100000,
            "message": "ok",
            "data": [
                {"id": 1, "sort": "2", "name": "知乎热榜", "source_key": "zhihu", "icon_color": null,
                 "data": [{"id": 7, "title": "a", "extra": "1.2万", "link": "https://a"}, 5, null]},
                {"id": 2, "name": "微博热搜", "source_key": 3, "data": "not a list"},
                "garbage"
            ]
        }"#;
        let env: Envelope = serde_json::from_str(raw).unwrap();
        let records = env.data.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sort, Some(2));
        assert_eq!(records[0].icon_color, None);
        assert_eq!(records[0].data.as_ref().unwrap().len(), 1);
        assert_eq!(records[1].source_key, None);
        assert!(records[1].data.is_none());
        assert_eq!(records[1].platform_id(), Some("微博热搜"));
    }

    #[test]
    fn source_id_treats_zero_and_empty_as_missing() {
        let rec = |id: Value| ItemRecord {
            id: Some(id),
            ..Default::default()
        };
        assert_eq!(rec(Value::from(42)).source_id().as_deref(), Some("42"));
        assert_eq!(rec(Value::from("abc")).source_id().as_deref(), Some("abc"));
        assert_eq!(rec(Value::from(0)).source_id(), None);
        assert_eq!(rec(Value::from("")).source_id(), None);
        assert_eq!(ItemRecord::default().source_id(), None);
    }

    #[test]
    fn hotlist_item_serializes_camel_case() {
        let item = HotlistItem {
            id: "zhihu-1".into(),
            title: "t".into(),
            url: "https://x".into(),
            hot: 1.0,
            platform: "zhihu".into(),
            platform_name: "知乎热榜".into(),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["platformName"], "知乎热榜");
        assert!(v.get("platform_name").is_none());
    }
}
