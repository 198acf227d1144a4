// Time-window resolution for event filtering.
//
// Request parameters (`time`/`limit` keyword, `month`/`year` pair, explicit
// `start`/`end` bounds) are resolved into a closed TimeWindow enum, and each
// variant resolves to concrete bounds against "now" via its own pure
// function. Malformed or out-of-range values are treated as absent, never as
// errors: analytics filters fail open so a bad query string degrades to a
// wider result set instead of a 400.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Earliest year accepted for explicit `year` filters.
const MIN_FILTER_YEAR: i32 = 1999;

/// Raw, optional query parameters feeding the resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowParams<'a> {
    /// Named window keyword (`latest`, `today`, `week`, ...)
    pub keyword: Option<&'a str>,
    pub month: Option<&'a str>,
    pub year: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
}

/// A requested time window. Precedence at resolution time:
/// named keyword > month/year pair > explicit range > All.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeWindow {
    /// Most recent single event
    Latest,
    /// Current calendar date
    Today,
    /// Most recent Monday through next Monday (both endpoints inclusive)
    Week,
    /// Current calendar month
    CurrentMonth,
    /// Trailing N-day window ending at now
    TrailingDays(i64),
    /// Explicit month within a year
    MonthOfYear { month: u32, year: i32 },
    /// Whole explicit year
    Year(i32),
    /// Explicit bounds; a missing side is open
    Range {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    /// Match everything
    All,
}

/// An upper bound: explicit ranges keep their inclusive 23:59:59 endpoint,
/// calendar windows use an exclusive next-period start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpperBound {
    Inclusive(DateTime<Utc>),
    Exclusive(DateTime<Utc>),
}

/// Concrete bounds a window resolves to at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeBounds {
    /// Inclusive lower bound
    pub start: Option<DateTime<Utc>>,
    pub end: Option<UpperBound>,
}

impl TimeBounds {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if instant < start {
                return false;
            }
        }
        match self.end {
            Some(UpperBound::Inclusive(end)) => instant <= end,
            Some(UpperBound::Exclusive(end)) => instant < end,
            None => true,
        }
    }
}

/// A window resolved against "now".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedWindow {
    /// Most recent single event (ordering concern, not a bound)
    Latest,
    Bounds(TimeBounds),
    All,
}

// =============================================================================
// PARSING (fail-open)
// =============================================================================

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Lenient date parsing: a malformed value is simply absent.
pub fn parse_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return start_of_day(date);
        }
    }
    None
}

/// Lenient integer parsing: a malformed value is simply absent.
pub fn parse_int(value: Option<&str>) -> Option<i64> {
    value?.trim().parse::<i64>().ok()
}

/// Normalize a range end to the last second of its calendar day.
pub fn end_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_opt(23, 59, 59)
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(instant)
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1).and_then(start_of_day)
}

fn next_month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve raw request parameters into a TimeWindow, honoring precedence:
/// named keyword > month/year pair > explicit start/end range > All.
pub fn resolve_window(params: &WindowParams<'_>, now: DateTime<Utc>) -> TimeWindow {
    if let Some(keyword) = params.keyword {
        if let Some(window) = keyword_window(keyword) {
            return window;
        }
        // Unknown keyword falls through to month/year resolution
    }
    month_year_window(params, now)
}

fn keyword_window(keyword: &str) -> Option<TimeWindow> {
    match keyword.to_lowercase().as_str() {
        "latest" => Some(TimeWindow::Latest),
        "today" => Some(TimeWindow::Today),
        "week" => Some(TimeWindow::Week),
        "month" => Some(TimeWindow::CurrentMonth),
        "7days" => Some(TimeWindow::TrailingDays(7)),
        "30days" => Some(TimeWindow::TrailingDays(30)),
        "90days" => Some(TimeWindow::TrailingDays(90)),
        _ => None,
    }
}

fn month_year_window(params: &WindowParams<'_>, now: DateTime<Utc>) -> TimeWindow {
    let month = parse_int(params.month).filter(|m| (1..=12).contains(m));
    let year = parse_int(params.year)
        .filter(|y| (MIN_FILTER_YEAR as i64..=now.year() as i64).contains(y));

    match (month, year) {
        (Some(month), Some(year)) => TimeWindow::MonthOfYear {
            month: month as u32,
            year: year as i32,
        },
        (Some(month), None) => TimeWindow::MonthOfYear {
            month: month as u32,
            year: now.year(),
        },
        (None, Some(year)) => TimeWindow::Year(year as i32),
        (None, None) => range_window(params),
    }
}

fn range_window(params: &WindowParams<'_>) -> TimeWindow {
    let start = parse_date(params.start);
    let end = parse_date(params.end).map(end_of_day);

    if start.is_none() && end.is_none() {
        TimeWindow::All
    } else {
        TimeWindow::Range { start, end }
    }
}

impl TimeWindow {
    /// Resolve this window against "now". One pure function per variant.
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedWindow {
        match *self {
            TimeWindow::Latest => ResolvedWindow::Latest,
            TimeWindow::Today => ResolvedWindow::Bounds(today_bounds(now)),
            TimeWindow::Week => ResolvedWindow::Bounds(week_bounds(now)),
            TimeWindow::CurrentMonth => {
                ResolvedWindow::Bounds(calendar_month_bounds(now.year(), now.month()))
            }
            TimeWindow::TrailingDays(days) => {
                ResolvedWindow::Bounds(trailing_days_bounds(days, now))
            }
            TimeWindow::MonthOfYear { month, year } => {
                ResolvedWindow::Bounds(calendar_month_bounds(year, month))
            }
            TimeWindow::Year(year) => ResolvedWindow::Bounds(calendar_year_bounds(year)),
            TimeWindow::Range { start, end } => ResolvedWindow::Bounds(TimeBounds {
                start,
                end: end.map(UpperBound::Inclusive),
            }),
            TimeWindow::All => ResolvedWindow::All,
        }
    }
}

fn today_bounds(now: DateTime<Utc>) -> TimeBounds {
    let today = now.date_naive();
    TimeBounds {
        start: start_of_day(today),
        end: start_of_day(today + Duration::days(1)).map(UpperBound::Exclusive),
    }
}

/// Most recently started Monday through the following Monday. The far
/// Monday's midnight is inclusive, so a week window touches eight calendar
/// days.
fn week_bounds(now: DateTime<Utc>) -> TimeBounds {
    let today = now.date_naive();
    let last_monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let next_monday = last_monday + Duration::days(7);
    TimeBounds {
        start: start_of_day(last_monday),
        end: start_of_day(next_monday).map(UpperBound::Inclusive),
    }
}

fn trailing_days_bounds(days: i64, now: DateTime<Utc>) -> TimeBounds {
    let anchor = now.date_naive() - Duration::days(days);
    TimeBounds {
        start: start_of_day(anchor),
        end: Some(UpperBound::Inclusive(now)),
    }
}

fn calendar_month_bounds(year: i32, month: u32) -> TimeBounds {
    TimeBounds {
        start: month_start(year, month),
        end: next_month_start(year, month).map(UpperBound::Exclusive),
    }
}

fn calendar_year_bounds(year: i32) -> TimeBounds {
    TimeBounds {
        start: month_start(year, 1),
        end: month_start(year + 1, 1).map(UpperBound::Exclusive),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    // Wednesday
    fn now() -> DateTime<Utc> {
        utc("2024-03-13T15:30:00Z")
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date(Some("2024-03-01")),
            Some(utc("2024-03-01T00:00:00Z"))
        );
        assert_eq!(
            parse_date(Some("2024-03-01T10:20:30Z")),
            Some(utc("2024-03-01T10:20:30Z"))
        );
        assert_eq!(
            parse_date(Some("2024-03-01 10:20:30")),
            Some(utc("2024-03-01T10:20:30Z"))
        );
        assert_eq!(
            parse_date(Some("03/01/2024")),
            Some(utc("2024-03-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_parse_date_fails_open() {
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("not-a-date")), None);
        assert_eq!(parse_date(Some("2024-13-40")), None);
    }

    #[test]
    fn test_parse_int_fails_open() {
        assert_eq!(parse_int(Some("12")), Some(12));
        assert_eq!(parse_int(Some(" 7 ")), Some(7));
        assert_eq!(parse_int(Some("twelve")), None);
        assert_eq!(parse_int(None), None);
    }

    #[test]
    fn test_keyword_takes_precedence() {
        let params = WindowParams {
            keyword: Some("today"),
            month: Some("6"),
            year: Some("2020"),
            start: Some("2019-01-01"),
            end: Some("2019-12-31"),
        };
        assert_eq!(resolve_window(&params, now()), TimeWindow::Today);
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let params = WindowParams {
            keyword: Some("30DAYS"),
            ..Default::default()
        };
        assert_eq!(resolve_window(&params, now()), TimeWindow::TrailingDays(30));
    }

    #[test]
    fn test_unknown_keyword_falls_through() {
        let params = WindowParams {
            keyword: Some("fortnight"),
            month: Some("6"),
            ..Default::default()
        };
        assert_eq!(
            resolve_window(&params, now()),
            TimeWindow::MonthOfYear {
                month: 6,
                year: 2024
            }
        );
    }

    #[test]
    fn test_month_without_year_uses_current_year() {
        let params = WindowParams {
            month: Some("2"),
            ..Default::default()
        };
        assert_eq!(
            resolve_window(&params, now()),
            TimeWindow::MonthOfYear {
                month: 2,
                year: 2024
            }
        );
    }

    #[test]
    fn test_year_without_month_filters_whole_year() {
        let params = WindowParams {
            year: Some("2021"),
            ..Default::default()
        };
        assert_eq!(resolve_window(&params, now()), TimeWindow::Year(2021));
    }

    #[test]
    fn test_out_of_range_month_treated_as_absent() {
        // month=13 is absent; the valid year still applies
        let params = WindowParams {
            month: Some("13"),
            year: Some("2021"),
            ..Default::default()
        };
        assert_eq!(resolve_window(&params, now()), TimeWindow::Year(2021));
    }

    #[test]
    fn test_out_of_range_year_treated_as_absent() {
        // year=1998 is below the floor; month alone gets the current year
        let params = WindowParams {
            month: Some("5"),
            year: Some("1998"),
            ..Default::default()
        };
        assert_eq!(
            resolve_window(&params, now()),
            TimeWindow::MonthOfYear {
                month: 5,
                year: 2024
            }
        );
    }

    #[test]
    fn test_future_year_treated_as_absent() {
        let params = WindowParams {
            year: Some("2030"),
            ..Default::default()
        };
        assert_eq!(resolve_window(&params, now()), TimeWindow::All);
    }

    #[test]
    fn test_malformed_range_falls_to_all() {
        let params = WindowParams {
            start: Some("bogus"),
            end: Some("also-bogus"),
            ..Default::default()
        };
        assert_eq!(resolve_window(&params, now()), TimeWindow::All);
    }

    #[test]
    fn test_end_only_range_normalized_to_end_of_day() {
        let params = WindowParams {
            end: Some("2024-03-01"),
            ..Default::default()
        };
        let window = resolve_window(&params, now());
        assert_eq!(
            window,
            TimeWindow::Range {
                start: None,
                end: Some(utc("2024-03-01T23:59:59Z")),
            }
        );

        let resolved = window.resolve(now());
        if let ResolvedWindow::Bounds(bounds) = resolved {
            assert!(bounds.contains(utc("2020-07-04T12:00:00Z")));
            assert!(bounds.contains(utc("2024-03-01T23:59:59Z")));
            assert!(!bounds.contains(utc("2024-03-02T00:00:00Z")));
        } else {
            panic!("expected bounds, got {:?}", resolved);
        }
    }

    #[test]
    fn test_today_boundaries() {
        let resolved = TimeWindow::Today.resolve(now());
        let ResolvedWindow::Bounds(bounds) = resolved else {
            panic!("expected bounds");
        };
        assert!(bounds.contains(utc("2024-03-13T00:00:00Z")));
        assert!(bounds.contains(utc("2024-03-13T23:59:59Z")));
        assert!(!bounds.contains(utc("2024-03-14T00:00:00Z")));
        assert!(!bounds.contains(utc("2024-03-12T23:59:59Z")));
    }

    #[test]
    fn test_week_spans_monday_to_monday() {
        // 2024-03-13 is a Wednesday; the week runs Mon 03-11 .. Mon 03-18
        let ResolvedWindow::Bounds(bounds) = TimeWindow::Week.resolve(now()) else {
            panic!("expected bounds");
        };
        assert_eq!(bounds.start, Some(utc("2024-03-11T00:00:00Z")));
        assert!(bounds.contains(utc("2024-03-11T00:00:00Z")));
        assert!(bounds.contains(utc("2024-03-17T23:59:59Z")));
        // Far Monday midnight stays inclusive
        assert!(bounds.contains(utc("2024-03-18T00:00:00Z")));
        assert!(!bounds.contains(utc("2024-03-18T00:00:01Z")));
        assert!(!bounds.contains(utc("2024-03-10T23:59:59Z")));
    }

    #[test]
    fn test_trailing_days_window() {
        let ResolvedWindow::Bounds(bounds) = TimeWindow::TrailingDays(7).resolve(now()) else {
            panic!("expected bounds");
        };
        assert_eq!(bounds.start, Some(utc("2024-03-06T00:00:00Z")));
        assert_eq!(bounds.end, Some(UpperBound::Inclusive(now())));
        assert!(bounds.contains(utc("2024-03-06T00:00:00Z")));
        assert!(!bounds.contains(utc("2024-03-13T15:30:01Z")));
    }

    #[test]
    fn test_current_month_bounds() {
        let ResolvedWindow::Bounds(bounds) = TimeWindow::CurrentMonth.resolve(now()) else {
            panic!("expected bounds");
        };
        assert!(bounds.contains(utc("2024-03-01T00:00:00Z")));
        assert!(bounds.contains(utc("2024-03-31T23:59:59Z")));
        assert!(!bounds.contains(utc("2024-04-01T00:00:00Z")));
        assert!(!bounds.contains(utc("2024-02-29T23:59:59Z")));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let window = TimeWindow::MonthOfYear {
            month: 12,
            year: 2023,
        };
        let ResolvedWindow::Bounds(bounds) = window.resolve(now()) else {
            panic!("expected bounds");
        };
        assert!(bounds.contains(utc("2023-12-31T23:59:59Z")));
        assert!(!bounds.contains(utc("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn test_year_bounds() {
        let ResolvedWindow::Bounds(bounds) = TimeWindow::Year(2021).resolve(now()) else {
            panic!("expected bounds");
        };
        assert!(bounds.contains(utc("2021-01-01T00:00:00Z")));
        assert!(bounds.contains(utc("2021-12-31T23:59:59Z")));
        assert!(!bounds.contains(utc("2022-01-01T00:00:00Z")));
    }

    #[test]
    fn test_latest_resolves_to_latest() {
        assert_eq!(TimeWindow::Latest.resolve(now()), ResolvedWindow::Latest);
    }

    #[test]
    fn test_no_params_matches_all() {
        let params = WindowParams::default();
        assert_eq!(resolve_window(&params, now()), TimeWindow::All);
        assert_eq!(TimeWindow::All.resolve(now()), ResolvedWindow::All);
    }
}
