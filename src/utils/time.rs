use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Returns start of the next day.
pub fn next_day_start(moment: NaiveDateTime) -> NaiveDateTime {
    (moment + Duration::days(1))
        .date()
        .and_time(NaiveTime::MIN)
}

/// Fractional hours between two moments.
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_seconds() as f64 / 3600.
}

/// Moves a date back to the Monday of its week. Dates already on a Monday stay put.
pub fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// This is the standard way of naming a week in orgtally. Keys follow the ISO
/// year, so December 31st can land in the first week of the next year.
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Human form of [week_key], like "Week 15 2024".
pub fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("Week {} {}", iso.week(), iso.year())
}

/// This is the standard way of naming a month in orgtally.
pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Human form of [month_key], like "March 2024".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Splits `[start, end)` at local midnights into per-day `(date, hours)` segments.
/// Segments are produced lazily and zero-width segments are never yielded.
pub fn day_segments(start: NaiveDateTime, end: NaiveDateTime) -> DaySegments {
    DaySegments { cursor: start, end }
}

pub struct DaySegments {
    cursor: NaiveDateTime,
    end: NaiveDateTime,
}

impl Iterator for DaySegments {
    type Item = (NaiveDate, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end {
            let segment_start = self.cursor;
            let segment_end = next_day_start(segment_start).min(self.end);
            self.cursor = segment_end;
            let hours = hours_between(segment_start, segment_end);
            if hours > 0. {
                return Some((segment_start.date(), hours));
            }
        }
        None
    }
}
