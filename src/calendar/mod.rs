pub mod bins;

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::warn;

use crate::{
    outline::{node::ClockWindow, source::LoadedOutline},
    utils::{
        percentage::ratio,
        time::{day_segments, monday_on_or_before, month_key, month_label, week_key, week_label},
    },
};

/// How many areas a bucket summary keeps.
const TOP_AREAS: usize = 5;

/// Clipped clock time bucketed by local day and ISO week, with a per-area
/// breakdown of every bucket.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActivityDetail {
    pub daily_hours: BTreeMap<NaiveDate, f64>,
    pub daily_areas: BTreeMap<NaiveDate, BTreeMap<Arc<str>, f64>>,
    pub week_hours: BTreeMap<String, f64>,
    pub week_areas: BTreeMap<String, BTreeMap<Arc<str>, f64>>,
}

impl ActivityDetail {
    fn add(&mut self, day: NaiveDate, area: &Arc<str>, hours: f64) {
        *self.daily_hours.entry(day).or_default() += hours;
        *self
            .daily_areas
            .entry(day)
            .or_default()
            .entry(area.clone())
            .or_default() += hours;

        let week = week_key(day);
        *self.week_hours.entry(week.clone()).or_default() += hours;
        *self
            .week_areas
            .entry(week)
            .or_default()
            .entry(area.clone())
            .or_default() += hours;
    }
}

/// Walks every outline and distributes its clipped clock entries over days.
/// Entries crossing midnight are split, so a day never collects more than 24
/// hours from one entry.
pub fn compute_activity(forest: &[LoadedOutline], window: &ClockWindow) -> ActivityDetail {
    let mut detail = ActivityDetail::default();
    for loaded in forest {
        let mut stack = vec![&loaded.root];
        while let Some(node) = stack.pop() {
            for entry in &node.clock {
                if entry.is_reversed() {
                    warn!(
                        "Clock entry under {:?} ends before it starts, counting it as zero",
                        node.heading
                    );
                    continue;
                }
                let Some((start, end)) = entry.clip(window) else {
                    continue;
                };
                for (day, hours) in day_segments(start, end) {
                    detail.add(day, &loaded.area, hours);
                }
            }
            stack.extend(&node.children);
        }
    }
    detail
}

/// Monday-aligned rows of seven days covering the reporting range. Every week
/// beginning before `end` gets a full row, so the last row can spill past the
/// end of the range.
pub fn build_weeks(start: NaiveDateTime, end: NaiveDateTime) -> Vec<[NaiveDate; 7]> {
    let mut weeks = vec![];
    let mut monday = monday_on_or_before(start.date());
    while monday.and_time(NaiveTime::MIN) < end {
        weeks.push(std::array::from_fn(|day| monday + Duration::days(day as i64)));
        monday += Duration::days(7);
    }
    weeks
}

/// Label positions for the grid header, one per first-of-month, pointing at
/// the week row containing it.
pub fn month_labels(weeks: &[[NaiveDate; 7]]) -> Vec<(String, usize)> {
    let mut labels = vec![];
    let mut seen = BTreeSet::new();
    for (index, week) in weeks.iter().enumerate() {
        for day in week {
            if day.day() == 1 && seen.insert((day.year(), day.month())) {
                labels.push((day.format("%b").to_string(), index));
            }
        }
    }
    labels
}

/// Hour samples for every day on the grid, zeros included, in grid order.
pub fn grid_values(detail: &ActivityDetail, weeks: &[[NaiveDate; 7]]) -> Vec<f64> {
    weeks
        .iter()
        .flatten()
        .map(|day| detail.daily_hours.get(day).copied().unwrap_or(0.))
        .collect()
}

/// The heaviest areas of one bucket, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaShare {
    pub name: Arc<str>,
    pub h: f64,
    pub pct: f64,
}

/// A day, week or month slice of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub total: f64,
    pub areas: Vec<AreaShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Everything a renderer needs for one activity calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarData {
    pub days: BTreeMap<String, BucketSummary>,
    pub weeks: BTreeMap<String, BucketSummary>,
    pub months: BTreeMap<String, BucketSummary>,
    pub day_to_week: BTreeMap<String, String>,
    pub day_to_month: BTreeMap<String, String>,
}

pub fn calendar_data(detail: &ActivityDetail, weeks: &[[NaiveDate; 7]]) -> CalendarData {
    let empty = BTreeMap::new();

    let mut days = BTreeMap::new();
    let mut day_to_week = BTreeMap::new();
    let mut day_to_month = BTreeMap::new();
    let mut month_dates = BTreeMap::new();
    for week in weeks {
        for day in week {
            let key = day.to_string();
            day_to_week.insert(key.clone(), week_key(*day));
            day_to_month.insert(key.clone(), month_key(*day));
            month_dates.entry(month_key(*day)).or_insert(*day);

            let total = detail.daily_hours.get(day).copied().unwrap_or(0.);
            let areas = detail.daily_areas.get(day).unwrap_or(&empty);
            days.insert(
                key,
                BucketSummary {
                    total: round2(total),
                    areas: top_areas(areas, total),
                    label: None,
                },
            );
        }
    }

    let mut week_summaries = BTreeMap::new();
    for week in weeks {
        let monday = week[0];
        let key = week_key(monday);
        let total = detail.week_hours.get(&key).copied().unwrap_or(0.);
        let areas = detail.week_areas.get(&key).unwrap_or(&empty);
        week_summaries.insert(
            key,
            BucketSummary {
                total: round2(total),
                areas: top_areas(areas, total),
                label: Some(week_label(monday)),
            },
        );
    }

    // month buckets are recomputed from grid days, so a month cut off by the
    // reporting range only counts its visible part
    let mut month_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut month_areas: BTreeMap<String, BTreeMap<Arc<str>, f64>> = BTreeMap::new();
    for week in weeks {
        for day in week {
            let Some(total) = detail.daily_hours.get(day) else {
                continue;
            };
            let month = month_key(*day);
            *month_totals.entry(month.clone()).or_default() += total;
            if let Some(areas) = detail.daily_areas.get(day) {
                let bucket = month_areas.entry(month).or_default();
                for (area, hours) in areas {
                    *bucket.entry(area.clone()).or_default() += hours;
                }
            }
        }
    }
    let mut months = BTreeMap::new();
    for (month, total) in month_totals {
        if total <= 0. {
            continue;
        }
        let areas = month_areas.get(&month).unwrap_or(&empty);
        let label = month_dates.get(&month).map(|day| month_label(*day));
        months.insert(
            month,
            BucketSummary {
                total: round2(total),
                areas: top_areas(areas, total),
                label,
            },
        );
    }

    CalendarData {
        days,
        weeks: week_summaries,
        months,
        day_to_week,
        day_to_month,
    }
}

fn top_areas(areas: &BTreeMap<Arc<str>, f64>, total: f64) -> Vec<AreaShare> {
    let mut entries: Vec<_> = areas.iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(a.1));
    entries
        .into_iter()
        .take(TOP_AREAS)
        .map(|(name, hours)| AreaShare {
            name: name.clone(),
            h: round2(*hours),
            pct: round1(ratio(*hours, total) * 100.),
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.).round() / 100.
}

fn round1(v: f64) -> f64 {
    (v * 10.).round() / 10.
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        outline::{
            node::{ClockEntry, ClockWindow, RawOutlineNode},
            source::LoadedOutline,
        },
        rollup::{grouping, ClockForest},
    };

    use super::{
        build_weeks, calendar_data, compute_activity, grid_values, month_labels, ActivityDetail,
    };

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn moment(day: NaiveDate, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDateTime::new(day, NaiveTime::from_hms_opt(hour, min, 0).unwrap())
    }

    fn entry(start: NaiveDateTime, end: NaiveDateTime) -> ClockEntry {
        ClockEntry {
            start,
            end: Some(end),
        }
    }

    fn outline(area: &str, clock: Vec<ClockEntry>) -> LoadedOutline {
        outline_tagged(area, &[], clock)
    }

    fn outline_tagged(area: &str, tags: &[&str], clock: Vec<ClockEntry>) -> LoadedOutline {
        LoadedOutline {
            area: area.into(),
            root: RawOutlineNode {
                heading: "file root".into(),
                level: 0,
                tags: vec![],
                clock: vec![],
                children: vec![RawOutlineNode {
                    heading: format!("{area} task").into(),
                    level: 1,
                    tags: tags.iter().map(|v| (*v).into()).collect(),
                    clock,
                    children: vec![],
                }],
            },
        }
    }

    #[test]
    fn activity_splits_at_midnight() {
        let forest = [outline(
            "work",
            vec![entry(
                moment(TEST_DATE, 23, 0),
                moment(date(2024, 1, 11), 1, 0),
            )],
        )];

        let detail = compute_activity(&forest, &ClockWindow::unbounded());
        assert_eq!(detail.daily_hours[&TEST_DATE], 1.0);
        assert_eq!(detail.daily_hours[&date(2024, 1, 11)], 1.0);
        assert_eq!(detail.daily_areas[&TEST_DATE]["work"], 1.0);
    }

    #[test]
    fn week_buckets_follow_iso_year() {
        let forest = [outline(
            "work",
            vec![entry(
                moment(date(2024, 12, 31), 9, 0),
                moment(date(2024, 12, 31), 11, 0),
            )],
        )];

        let detail = compute_activity(&forest, &ClockWindow::unbounded());
        assert_eq!(detail.week_hours["2025-W01"], 2.0);
        assert_eq!(detail.daily_hours[&date(2024, 12, 31)], 2.0);
    }

    #[test]
    fn midnight_split_can_cross_weeks() {
        // Sunday 2024-01-14 into Monday 2024-01-15
        let forest = [outline(
            "work",
            vec![entry(
                moment(date(2024, 1, 14), 23, 0),
                moment(date(2024, 1, 15), 1, 0),
            )],
        )];

        let detail = compute_activity(&forest, &ClockWindow::unbounded());
        assert_eq!(detail.week_hours["2024-W02"], 1.0);
        assert_eq!(detail.week_hours["2024-W03"], 1.0);
    }

    #[test]
    fn open_entries_add_nothing() {
        let forest = [outline(
            "work",
            vec![ClockEntry {
                start: moment(TEST_DATE, 9, 0),
                end: None,
            }],
        )];

        let detail = compute_activity(&forest, &ClockWindow::unbounded());
        assert!(detail.daily_hours.is_empty());
    }

    #[test]
    fn grid_rows_are_monday_aligned() {
        // 2024-01-10 is a Wednesday
        let weeks = build_weeks(moment(TEST_DATE, 9, 0), moment(date(2024, 1, 25), 0, 0));

        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[0][0], date(2024, 1, 8));
        assert_eq!(weeks[0][6], date(2024, 1, 14));
        assert_eq!(weeks[2][0], date(2024, 1, 22));
    }

    #[test]
    fn grid_stops_at_range_end() {
        let weeks = build_weeks(moment(TEST_DATE, 0, 0), moment(date(2024, 1, 22), 0, 0));
        assert_eq!(weeks.len(), 2);

        // a week starting inside the range still gets its full row
        let weeks = build_weeks(moment(TEST_DATE, 0, 0), moment(date(2024, 1, 22), 10, 0));
        assert_eq!(weeks.len(), 3);
    }

    #[test]
    fn month_labels_point_at_first_of_month_rows() {
        let weeks = build_weeks(moment(date(2024, 2, 27), 0, 0), moment(date(2024, 4, 3), 0, 0));

        let labels = month_labels(&weeks);
        assert_eq!(
            labels,
            vec![("Mar".to_string(), 0), ("Apr".to_string(), 5)]
        );
    }

    #[test]
    fn summaries_round_and_rank_areas() {
        let day = TEST_DATE;
        let forest = [
            outline("work", vec![entry(moment(day, 9, 0), moment(day, 12, 0))]),
            outline("home", vec![entry(moment(day, 13, 0), moment(day, 14, 0))]),
        ];

        let detail = compute_activity(&forest, &ClockWindow::unbounded());
        let weeks = build_weeks(moment(day, 0, 0), moment(date(2024, 1, 11), 0, 0));
        let data = calendar_data(&detail, &weeks);

        let summary = &data.days["2024-01-10"];
        assert_eq!(summary.total, 4.0);
        assert_eq!(&*summary.areas[0].name, "work");
        assert_eq!(summary.areas[0].h, 3.0);
        assert_eq!(summary.areas[0].pct, 75.0);
        assert_eq!(&*summary.areas[1].name, "home");
        assert_eq!(summary.areas[1].pct, 25.0);

        let week = &data.weeks["2024-W02"];
        assert_eq!(week.total, 4.0);
        assert_eq!(week.label.as_deref(), Some("Week 2 2024"));

        let empty_day = &data.days["2024-01-12"];
        assert_eq!(empty_day.total, 0.0);
        assert!(empty_day.areas.is_empty());
    }

    #[test]
    fn summaries_keep_only_top_areas() {
        let day = TEST_DATE;
        let forest: Vec<_> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                outline(
                    name,
                    vec![entry(moment(day, i as u32, 0), moment(day, i as u32 + 1, 0))],
                )
            })
            .collect();

        let detail = compute_activity(&forest, &ClockWindow::unbounded());
        let weeks = build_weeks(moment(day, 0, 0), moment(date(2024, 1, 11), 0, 0));
        let data = calendar_data(&detail, &weeks);

        assert_eq!(data.days["2024-01-10"].areas.len(), 5);
    }

    #[test]
    fn day_lookups_cover_the_grid() {
        let weeks = build_weeks(moment(date(2024, 12, 30), 0, 0), moment(date(2025, 1, 2), 0, 0));
        let data = calendar_data(&ActivityDetail::default(), &weeks);

        assert_eq!(data.day_to_week["2024-12-31"], "2025-W01");
        assert_eq!(data.day_to_month["2024-12-31"], "2024-12");
        assert_eq!(data.day_to_month["2025-01-01"], "2025-01");
    }

    #[test]
    fn months_count_only_visible_days() {
        let forest = [outline(
            "work",
            vec![
                entry(moment(date(2024, 3, 4), 9, 0), moment(date(2024, 3, 4), 11, 0)),
                entry(moment(date(2024, 3, 20), 9, 0), moment(date(2024, 3, 20), 10, 0)),
            ],
        )];

        // the range ends before March 20th, so that entry is out
        let window = ClockWindow::between(
            moment(date(2024, 3, 1), 0, 0),
            moment(date(2024, 3, 10), 0, 0),
        );
        let detail = compute_activity(&forest, &window);
        let weeks = build_weeks(moment(date(2024, 3, 1), 0, 0), moment(date(2024, 3, 10), 0, 0));
        let data = calendar_data(&detail, &weeks);

        let march = &data.months["2024-03"];
        assert_eq!(march.total, 2.0);
        assert_eq!(march.label.as_deref(), Some("March 2024"));
    }

    #[test]
    fn activity_matches_hierarchy_totals() {
        let files = [
            outline_tagged(
                "a",
                &["x"],
                vec![entry(moment(date(2024, 3, 4), 9, 0), moment(date(2024, 3, 4), 11, 0))],
            ),
            outline(
                "b",
                vec![entry(
                    moment(date(2024, 3, 4), 10, 0),
                    moment(date(2024, 3, 4), 10, 30),
                )],
            ),
        ];
        let window = ClockWindow::between(
            moment(date(2024, 3, 1), 0, 0),
            moment(date(2024, 4, 1), 0, 0),
        );

        let forest = ClockForest::aggregate(&files, &window);
        assert_eq!(forest.total_hours(), 2.5);

        let areas = grouping::by_area(&forest);
        assert_eq!(areas["a"], 2.0);
        assert_eq!(areas["b"], 0.5);

        let tags = grouping::by_tag(&forest);
        assert_eq!(tags["x"], 2.0);
        assert_eq!(tags.len(), 1);

        let detail = compute_activity(&files, &window);
        assert_eq!(detail.daily_hours[&date(2024, 3, 4)], 2.5);
        assert_eq!(detail.daily_areas[&date(2024, 3, 4)]["a"], 2.0);
        assert_eq!(detail.daily_areas[&date(2024, 3, 4)]["b"], 0.5);

        // day buckets and the hierarchy see the same clipped time
        let daily_sum: f64 = detail.daily_hours.values().sum();
        assert!((daily_sum - forest.total_hours()).abs() < 1e-9);

        let weeks = build_weeks(
            moment(date(2024, 3, 1), 0, 0),
            moment(date(2024, 4, 1), 0, 0),
        );
        let values = grid_values(&detail, &weeks);
        assert_eq!(values.iter().sum::<f64>(), 2.5);
    }
}
