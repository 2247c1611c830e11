use chrono::NaiveDateTime;

use serde::Deserialize;
use serde::Serialize;

use std::sync::Arc;

use crate::utils::time::hours_between;

/// One heading of a parsed outline document. A node owns the clock entries
/// that were recorded directly under it; time recorded on descendants is only
/// reachable through `children`.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct RawOutlineNode {
    pub heading: Arc<str>,
    pub level: i32,
    #[serde(default)]
    pub tags: Vec<Arc<str>>,
    #[serde(default)]
    pub clock: Vec<ClockEntry>,
    #[serde(default)]
    pub children: Vec<RawOutlineNode>,
}

/// A single clock line. `end` is absent while the entry is still running and
/// such entries never contribute time anywhere.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone, Copy)]
pub struct ClockEntry {
    pub start: NaiveDateTime,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
}

impl ClockEntry {
    /// An entry whose end precedes its start. These come from hand-edited
    /// files and are counted as zero rather than rejected.
    pub fn is_reversed(&self) -> bool {
        self.end.is_some_and(|end| end < self.start)
    }

    /// Returns the part of this entry that overlaps `window`. Open entries,
    /// entries fully outside the window and zero-width leftovers all
    /// disappear here.
    pub fn clip(&self, window: &ClockWindow) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let end = self.end?;
        let start = match window.start {
            Some(window_start) => self.start.max(window_start),
            None => self.start,
        };
        let end = match window.end {
            Some(window_end) => end.min(window_end),
            None => end,
        };
        if end <= start {
            None
        } else {
            Some((start, end))
        }
    }

    /// Hours this entry contributes inside `window`.
    pub fn clipped_hours(&self, window: &ClockWindow) -> f64 {
        self.clip(window)
            .map(|(start, end)| hours_between(start, end))
            .unwrap_or(0.)
    }
}

/// Half-open reporting range `[start, end)`. A missing bound leaves that side
/// unrestricted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl ClockWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use super::{ClockEntry, ClockWindow, RawOutlineNode};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDateTime::new(TEST_DATE, NaiveTime::from_hms_opt(hour, min, 0).unwrap())
    }

    fn entry(start: NaiveDateTime, end: NaiveDateTime) -> ClockEntry {
        ClockEntry {
            start,
            end: Some(end),
        }
    }

    #[test]
    fn clip_without_window_returns_entry() {
        let clipped = entry(at(9, 0), at(11, 0)).clip(&ClockWindow::unbounded());
        assert_eq!(clipped, Some((at(9, 0), at(11, 0))));
    }

    #[test]
    fn clip_trims_both_sides() {
        let window = ClockWindow::between(at(9, 30), at(10, 30));
        let clipped = entry(at(9, 0), at(11, 0)).clip(&window);
        assert_eq!(clipped, Some((at(9, 30), at(10, 30))));
    }

    #[test]
    fn clip_outside_window_is_none() {
        let window = ClockWindow::between(at(12, 0), at(13, 0));
        assert_eq!(entry(at(9, 0), at(11, 0)).clip(&window), None);
    }

    #[test]
    fn clip_touching_window_edge_is_none() {
        // the window is half-open, so an entry ending exactly at the start
        // contributes nothing
        let window = ClockWindow::between(at(11, 0), at(12, 0));
        assert_eq!(entry(at(9, 0), at(11, 0)).clip(&window), None);
    }

    #[test]
    fn open_entry_never_clips() {
        let open = ClockEntry {
            start: at(9, 0),
            end: None,
        };
        assert_eq!(open.clip(&ClockWindow::unbounded()), None);
        assert_eq!(open.clipped_hours(&ClockWindow::unbounded()), 0.);
    }

    #[test]
    fn reversed_entry_clips_to_none() {
        let reversed = entry(at(11, 0), at(9, 0));
        assert!(reversed.is_reversed());
        assert_eq!(reversed.clip(&ClockWindow::unbounded()), None);
    }

    #[test]
    fn clipped_hours_basic() {
        assert_eq!(
            entry(at(9, 0), at(11, 0)).clipped_hours(&ClockWindow::unbounded()),
            2.0
        );
    }

    #[test]
    fn parses_sparse_documents() {
        let parsed = serde_json::from_str::<RawOutlineNode>(
            r#"{
                "heading": "Work",
                "level": 1,
                "children": [
                    {
                        "heading": "Review",
                        "level": 2,
                        "tags": ["focus"],
                        "clock": [
                            {"start": "2024-03-04T09:00:00", "end": "2024-03-04T11:00:00"},
                            {"start": "2024-03-04T12:00:00"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(&*parsed.heading, "Work");
        assert!(parsed.clock.is_empty());
        let child = &parsed.children[0];
        assert_eq!(child.tags, vec!["focus".into()]);
        assert_eq!(child.clock[0].end, Some(at(11, 0)));
        assert_eq!(child.clock[1].end, None);
    }
}
