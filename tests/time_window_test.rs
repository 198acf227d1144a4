// Time-window resolution behavior as seen by the events API:
// keyword precedence, fail-open parsing, and the concrete bounds each
// window resolves to.

use chrono::{DateTime, Utc};
use shopyourlinks_backend::services::time_window::{
    resolve_window, ResolvedWindow, TimeBounds, TimeWindow, UpperBound, WindowParams,
};
use uuid::Uuid;

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

// Wednesday mid-afternoon
fn now() -> DateTime<Utc> {
    utc("2024-03-13T15:30:00Z")
}

fn bounds_of(window: TimeWindow) -> (Option<DateTime<Utc>>, Option<UpperBound>) {
    match window.resolve(now()) {
        ResolvedWindow::Bounds(b) => (b.start, b.end),
        other => panic!("expected bounds, got {:?}", other),
    }
}

#[test]
fn today_window_covers_the_calendar_day() {
    let (start, end) = bounds_of(TimeWindow::Today);
    assert_eq!(start, Some(utc("2024-03-13T00:00:00Z")));
    assert_eq!(
        end,
        Some(UpperBound::Exclusive(utc("2024-03-14T00:00:00Z")))
    );
}

#[test]
fn week_window_spans_monday_to_monday_inclusive() {
    let (start, end) = bounds_of(TimeWindow::Week);
    assert_eq!(start, Some(utc("2024-03-11T00:00:00Z")));
    // The far Monday's midnight stays inside the window
    assert_eq!(
        end,
        Some(UpperBound::Inclusive(utc("2024-03-18T00:00:00Z")))
    );
}

#[test]
fn trailing_days_window_ends_at_now() {
    let (start, end) = bounds_of(TimeWindow::TrailingDays(7));
    assert_eq!(start, Some(utc("2024-03-06T00:00:00Z")));
    assert_eq!(end, Some(UpperBound::Inclusive(now())));
}

#[test]
fn explicit_month_uses_exclusive_next_month_start() {
    let (start, end) = bounds_of(TimeWindow::MonthOfYear {
        month: 12,
        year: 2023,
    });
    assert_eq!(start, Some(utc("2023-12-01T00:00:00Z")));
    assert_eq!(
        end,
        Some(UpperBound::Exclusive(utc("2024-01-01T00:00:00Z")))
    );
}

#[test]
fn explicit_range_keeps_end_of_day_inclusive() {
    let params = WindowParams {
        start: Some("2024-02-01"),
        end: Some("2024-02-10"),
        ..Default::default()
    };
    let window = resolve_window(&params, now());
    assert_eq!(
        window,
        TimeWindow::Range {
            start: Some(utc("2024-02-01T00:00:00Z")),
            end: Some(utc("2024-02-10T23:59:59Z")),
        }
    );

    let (_, end) = bounds_of(window);
    assert_eq!(
        end,
        Some(UpperBound::Inclusive(utc("2024-02-10T23:59:59Z")))
    );
}

#[test]
fn keyword_beats_month_and_range() {
    let params = WindowParams {
        keyword: Some("week"),
        month: Some("6"),
        year: Some("2020"),
        start: Some("2019-01-01"),
        end: Some("2019-12-31"),
    };
    assert_eq!(resolve_window(&params, now()), TimeWindow::Week);
}

#[test]
fn latest_is_an_ordering_not_a_bound() {
    let params = WindowParams {
        keyword: Some("latest"),
        ..Default::default()
    };
    let window = resolve_window(&params, now());
    assert_eq!(window.resolve(now()), ResolvedWindow::Latest);
}

#[test]
fn malformed_parameters_widen_instead_of_failing() {
    // A garbage month with no other filters matches everything
    let params = WindowParams {
        month: Some("banana"),
        ..Default::default()
    };
    assert_eq!(resolve_window(&params, now()), TimeWindow::All);

    // A garbage start with a good end degrades to an open-started range
    let params = WindowParams {
        start: Some("???"),
        end: Some("2024-02-10"),
        ..Default::default()
    };
    assert_eq!(
        resolve_window(&params, now()),
        TimeWindow::Range {
            start: None,
            end: Some(utc("2024-02-10T23:59:59Z")),
        }
    );
}

#[test]
fn out_of_range_month_and_year_are_ignored() {
    let params = WindowParams {
        month: Some("13"),
        year: Some("1312"),
        ..Default::default()
    };
    assert_eq!(resolve_window(&params, now()), TimeWindow::All);

    // A future year is treated the same way
    let params = WindowParams {
        year: Some("2199"),
        ..Default::default()
    };
    assert_eq!(resolve_window(&params, now()), TimeWindow::All);
}

#[test]
fn link_filter_composes_with_week_window() {
    let target = Uuid::new_v4();
    let other = Uuid::new_v4();

    // Two links, each with one event inside the current week and one before it
    let events = vec![
        (target, utc("2024-03-12T09:00:00Z")),
        (target, utc("2024-03-02T09:00:00Z")),
        (other, utc("2024-03-12T10:00:00Z")),
        (other, utc("2024-03-02T10:00:00Z")),
    ];

    let params = WindowParams {
        keyword: Some("week"),
        ..Default::default()
    };
    let bounds: TimeBounds = match resolve_window(&params, now()).resolve(now()) {
        ResolvedWindow::Bounds(b) => b,
        resolved => panic!("expected bounds, got {:?}", resolved),
    };

    // The filters stack the way the query pipeline applies them: the link
    // identity first, then the resolved time bounds.
    let matched: Vec<_> = events
        .iter()
        .filter(|(link, _)| *link == target)
        .filter(|(_, occurred_at)| bounds.contains(*occurred_at))
        .collect();

    assert_eq!(matched, vec![&(target, utc("2024-03-12T09:00:00Z"))]);
}

#[test]
fn year_only_selects_the_whole_calendar_year() {
    let params = WindowParams {
        year: Some("2023"),
        ..Default::default()
    };
    let window = resolve_window(&params, now());
    assert_eq!(window, TimeWindow::Year(2023));

    let (start, end) = bounds_of(window);
    assert_eq!(start, Some(utc("2023-01-01T00:00:00Z")));
    assert_eq!(
        end,
        Some(UpperBound::Exclusive(utc("2024-01-01T00:00:00Z")))
    );
}
