// End-to-end aggregation pipeline over in-memory events: bucketing,
// daily densification, and the CSV export, wired the way the stats
// endpoint wires them.

use chrono::{DateTime, Utc};
use shopyourlinks_backend::models::event::{EventLinkInfo, EventRecord};
use shopyourlinks_backend::services::aggregation::{
    bucket_events, densify_daily, generate_csv, DailySeriesSpec, Granularity,
};
use uuid::Uuid;

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn event(occurred_at: &str, url: &str) -> EventRecord {
    EventRecord {
        id: Uuid::new_v4(),
        occurred_at: utc(occurred_at),
        link: Some(EventLinkInfo {
            id: Uuid::new_v4(),
            url: url.to_string(),
            order: Some(3),
            text: Some("My shop".to_string()),
        }),
    }
}

#[test]
fn weekly_buckets_start_on_monday() {
    let events = vec![
        event("2024-03-11T08:00:00Z", "https://a.example"), // Monday
        event("2024-03-13T08:00:00Z", "https://a.example"), // Wednesday
        event("2024-03-18T08:00:00Z", "https://a.example"), // next Monday
    ];
    let buckets = bucket_events(&events, Granularity::Weekly);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].period, "2024-03-11".parse().unwrap());
    assert_eq!(buckets[0].count, 2);
    assert_eq!(buckets[1].period, "2024-03-18".parse().unwrap());
    assert_eq!(buckets[1].count, 1);
}

#[test]
fn daily_series_is_dense_over_a_trailing_window() {
    let events = vec![
        event("2024-03-08T10:00:00Z", "https://a.example"),
        event("2024-03-10T10:00:00Z", "https://a.example"),
        event("2024-03-10T11:00:00Z", "https://a.example"),
    ];
    let now = utc("2024-03-13T15:30:00Z");
    let buckets = bucket_events(&events, Granularity::Daily);
    let series = densify_daily(
        buckets,
        &DailySeriesSpec {
            trailing_days: Some(7),
            ..Default::default()
        },
        now,
    );

    // 2024-03-06 through 2024-03-13, one entry per day
    assert_eq!(series.len(), 8);
    let counts: Vec<usize> = series.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![0, 0, 1, 0, 2, 0, 0, 0]);
    assert!(series
        .windows(2)
        .all(|w| w[1].period - w[0].period == chrono::Duration::days(1)));
}

#[test]
fn zero_days_carry_no_events() {
    let now = utc("2024-03-13T15:30:00Z");
    let series = densify_daily(
        Vec::new(),
        &DailySeriesSpec {
            trailing_days: Some(2),
            ..Default::default()
        },
        now,
    );
    assert_eq!(series.len(), 3);
    for bucket in &series {
        assert_eq!(bucket.count, 0);
        assert!(bucket.events.is_empty());
    }
}

#[test]
fn csv_rows_match_the_filtered_events() {
    let events = vec![
        event("2024-03-08T10:00:00Z", "https://a.example/one"),
        event("2024-03-10T10:00:00Z", "https://a.example/two"),
    ];
    let (csv, rows) = generate_csv(&events);

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "id,occurred_at,url,order,text");
    assert!(lines[1].contains("https://a.example/one"));
    assert!(lines[2].contains("https://a.example/two"));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], events[0].id.to_string());
    assert_eq!(rows[1][2], "https://a.example/two");
}

#[test]
fn orphaned_events_export_with_empty_link_columns() {
    let orphan = EventRecord {
        id: Uuid::new_v4(),
        occurred_at: utc("2024-03-08T10:00:00Z"),
        link: None,
    };
    let (csv, rows) = generate_csv(&[orphan]);
    let data_line = csv.lines().nth(1).unwrap();
    assert!(data_line.ends_with(",,,"));
    assert_eq!(rows[0][2], "");
    assert_eq!(rows[0][3], serde_json::Value::Null);
}

#[test]
fn monthly_buckets_follow_calendar_months() {
    let events = vec![
        event("2024-03-01T10:00:00Z", "https://a.example"),
        event("2024-03-31T23:00:00Z", "https://a.example"),
        event("2024-04-01T00:30:00Z", "https://a.example"),
    ];
    let buckets = bucket_events(&events, Granularity::Monthly);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].period, "2024-03-01".parse().unwrap());
    assert_eq!(buckets[0].count, 2);
    assert_eq!(buckets[1].period, "2024-04-01".parse().unwrap());
}
