// Aggregation engine for event analytics.
//
// Takes the filter pipeline's output (events joined with their parent link,
// ascending by occurrence time) and buckets it by day, ISO week, calendar
// month, or calendar year. Buckets are then re-expanded into a dense daily
// series so downstream charting never sees a missing day. A CSV side-channel
// flattens each event's parent-link fields for tabular export.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::models::event::{EventRecord, EventResponse};
use crate::services::time_window::TimeWindow;

/// Bucketing granularity for /api/events/stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    /// Parse the stats `time` parameter; anything else is a window keyword,
    /// not a granularity.
    pub fn from_param(value: Option<&str>) -> Option<Granularity> {
        match value?.to_lowercase().as_str() {
            "daily" => Some(Granularity::Daily),
            "weekly" => Some(Granularity::Weekly),
            "monthly" => Some(Granularity::Monthly),
            "yearly" => Some(Granularity::Yearly),
            _ => None,
        }
    }

    /// Truncate a timestamp to this granularity's bucket key.
    pub fn truncate(&self, instant: DateTime<Utc>) -> NaiveDate {
        let date = instant.date_naive();
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
            Granularity::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }
}

/// One aggregation bucket: the truncated period, the member count, and the
/// full serialized members in ascending occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub period: NaiveDate,
    pub count: usize,
    pub events: Vec<EventResponse>,
}

/// Densification inputs derived from the same request parameters as the
/// time-window resolver: a trailing-days keyword anchors the series start,
/// explicit start/end bounds override, and the end defaults to today.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailySeriesSpec {
    pub trailing_days: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DailySeriesSpec {
    /// Derive series bounds from the resolved window. A trailing-days
    /// keyword anchors the start and an explicit range carries its own
    /// bounds; any other window still honors explicit `start`/`end`
    /// parameters, so a keyword filter and explicit series bounds can be
    /// combined in one request.
    pub fn from_window(
        window: &TimeWindow,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        match window {
            TimeWindow::TrailingDays(days) => DailySeriesSpec {
                trailing_days: Some(*days),
                start: None,
                end: None,
            },
            TimeWindow::Range { start, end } => DailySeriesSpec {
                trailing_days: None,
                start: *start,
                end: *end,
            },
            _ => DailySeriesSpec {
                trailing_days: None,
                start,
                end,
            },
        }
    }
}

/// Full stats payload: dense daily series plus the raw tabular export.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub data: Vec<Bucket>,
    pub raw_csv: String,
    pub raw: Vec<serde_json::Value>,
}

/// Partition events into non-empty buckets keyed by truncated period.
/// Input order (ascending occurred_at) is preserved within each bucket;
/// buckets come out in ascending period order.
pub fn bucket_events(events: &[EventRecord], granularity: Granularity) -> Vec<Bucket> {
    let mut buckets: BTreeMap<NaiveDate, Vec<EventResponse>> = BTreeMap::new();
    for event in events {
        buckets
            .entry(granularity.truncate(event.occurred_at))
            .or_default()
            .push(event.to_response());
    }

    buckets
        .into_iter()
        .map(|(period, events)| Bucket {
            period,
            count: events.len(),
            events,
        })
        .collect()
}

/// Re-expand buckets into one entry per calendar day from the resolved start
/// day through the end day, with zero-count placeholders for days that have
/// no bucket. Start defaults to the earliest bucket's day (or today when
/// there are none); a trailing-days window anchors it instead; explicit
/// start/end bounds override; end defaults to today.
pub fn densify_daily(buckets: Vec<Bucket>, spec: &DailySeriesSpec, now: DateTime<Utc>) -> Vec<Bucket> {
    let today = now.date_naive();

    let mut start_day = buckets.first().map(|b| b.period).unwrap_or(today);
    let mut end_day = today;

    if let Some(days) = spec.trailing_days {
        start_day = today - Duration::days(days);
    } else {
        if let Some(start) = spec.start {
            start_day = start.date_naive();
        }
        if let Some(end) = spec.end {
            end_day = end.date_naive();
        }
    }

    let mut by_period: BTreeMap<NaiveDate, Bucket> =
        buckets.into_iter().map(|b| (b.period, b)).collect();

    let mut output = Vec::new();
    let mut day = start_day;
    while day <= end_day {
        output.push(by_period.remove(&day).unwrap_or(Bucket {
            period: day,
            count: 0,
            events: Vec::new(),
        }));
        day += Duration::days(1);
    }
    output
}

/// Flatten events into CSV text and the same rows as JSON arrays. Columns:
/// event id, occurrence time, then the parent link's url/order/text.
pub fn generate_csv(events: &[EventRecord]) -> (String, Vec<serde_json::Value>) {
    let mut csv = String::from("id,occurred_at,url,order,text\n");
    let mut rows = Vec::with_capacity(events.len());

    for event in events {
        let url = event.link.as_ref().map(|l| l.url.as_str()).unwrap_or("");
        let order = event.link.as_ref().and_then(|l| l.order);
        let text = event
            .link
            .as_ref()
            .and_then(|l| l.text.as_deref())
            .unwrap_or("");
        let occurred_at = event.occurred_at.to_rfc3339();

        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            event.id,
            occurred_at,
            csv_escape(url),
            order.map(|o| o.to_string()).unwrap_or_default(),
            csv_escape(text),
        ));
        rows.push(json!([event.id, occurred_at, url, order, text]));
    }

    (csv, rows)
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
