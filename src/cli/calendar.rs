use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use now::DateTimeNow;

use crate::{
    calendar::{
        bins::{heat_level, quantile_bins, HeatLevel, QuantileBins},
        build_weeks, calendar_data, compute_activity, grid_values, month_labels, ActivityDetail,
        CalendarData,
    },
    outline::{
        node::ClockWindow,
        source::{load_forest, JsonOutlineSource},
    },
    utils::time::monday_on_or_before,
};

use super::{resolve_scope, ScopeArgs};

/// Months shown when the period is open on the start side.
const DEFAULT_MONTHS_BACK: u32 = 12;

/// Week rows beyond which the textual breakdown switches to months.
const WEEK_LISTING_LIMIT: usize = 16;

#[derive(Debug, Parser)]
pub struct CalendarCommand {
    #[command(flatten)]
    scope: ScopeArgs,
    #[arg(
        long,
        help = "Print day, week and month summaries as json instead of drawing the grid"
    )]
    json: bool,
}

/// Command to process `calendar`. Draws tracked time as a week-per-column
/// grid shaded by daily intensity, followed by per-bucket breakdowns.
pub async fn process_calendar_command(
    CalendarCommand { scope, json }: CalendarCommand,
) -> Result<()> {
    let resolved = resolve_scope(scope)?;
    let (start, end) = calendar_range(&resolved.window);
    let window = ClockWindow::between(start, end);
    // an open scope gets concrete defaults here, so name the range it became
    let period = if resolved.window.start.is_some() && resolved.window.end.is_some() {
        resolved.period
    } else {
        format!("{} to {}", start.date(), end.date())
    };

    let forest = load_forest(&JsonOutlineSource, &resolved.files).await;
    let detail = compute_activity(&forest, &window);
    let weeks = build_weeks(start, end);
    let bins = quantile_bins(&grid_values(&detail, &weeks));
    let data = calendar_data(&detail, &weeks);

    if json {
        let payload = serde_json::json!({
            "period": period,
            "bins": bins,
            "calendar": data,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "{}",
        Style::new().bold().paint(format!("ACTIVITY - {period}"))
    );
    print_grid(&weeks, &detail, &bins);
    print_breakdown(&weeks, &data);
    Ok(())
}

/// Submitted dates are kept, a missing end stops after today and a missing
/// start reaches back [DEFAULT_MONTHS_BACK] whole months, Monday aligned.
fn calendar_range(window: &ClockWindow) -> (NaiveDateTime, NaiveDateTime) {
    let now = Local::now();
    let end = window
        .end
        .unwrap_or_else(|| (now + Duration::days(1)).beginning_of_day().naive_local());
    let start = window.start.unwrap_or_else(|| {
        let mut month_start = now.beginning_of_month();
        for _ in 1..DEFAULT_MONTHS_BACK {
            month_start = (month_start - Duration::days(1)).beginning_of_month();
        }
        monday_on_or_before(month_start.date_naive()).and_time(NaiveTime::MIN)
    });
    (start, end)
}

const DAY_LABELS: [&str; 7] = ["Mon", "", "Wed", "", "Fri", "", "Sun"];
const GUTTER: usize = 4;

fn print_grid(weeks: &[[NaiveDate; 7]], detail: &ActivityDetail, bins: &QuantileBins) {
    let mut header = vec![b' '; GUTTER + weeks.len() * 2];
    for (label, index) in month_labels(weeks) {
        let offset = GUTTER + index * 2;
        for (position, byte) in label.bytes().enumerate() {
            if offset + position < header.len() {
                header[offset + position] = byte;
            }
        }
    }
    println!("{}", String::from_utf8_lossy(&header));

    for row in 0..7 {
        let mut line = format!("{:<width$}", DAY_LABELS[row], width = GUTTER);
        for week in weeks {
            let hours = detail.daily_hours.get(&week[row]).copied().unwrap_or(0.);
            line.push_str(&cell(hours, bins));
            line.push(' ');
        }
        println!("{line}");
    }

    let mut legend = String::from("Less ");
    for level in [
        HeatLevel::Empty,
        HeatLevel::Low,
        HeatLevel::Medium,
        HeatLevel::High,
        HeatLevel::Peak,
    ] {
        legend.push_str(&heat_colour(level).paint("■").to_string());
    }
    legend.push_str(" More");
    println!("{legend}");
    println!(
        "Shades from non-zero daily quartiles: {:.2} / {:.2} / {:.2} h",
        bins.q1, bins.q2, bins.q3
    );
}

fn cell(hours: f64, bins: &QuantileBins) -> String {
    heat_colour(heat_level(hours, bins)).paint("■").to_string()
}

fn heat_colour(level: HeatLevel) -> Colour {
    match level {
        HeatLevel::Empty => Colour::RGB(235, 237, 240),
        HeatLevel::Low => Colour::RGB(155, 233, 168),
        HeatLevel::Medium => Colour::RGB(64, 196, 99),
        HeatLevel::High => Colour::RGB(48, 161, 78),
        HeatLevel::Peak => Colour::RGB(33, 110, 57),
    }
}

fn print_breakdown(weeks: &[[NaiveDate; 7]], data: &CalendarData) {
    // long ranges read better summarized by month
    let buckets = if weeks.len() <= WEEK_LISTING_LIMIT {
        &data.weeks
    } else {
        &data.months
    };

    println!();
    for (key, summary) in buckets {
        if summary.total <= 0. {
            continue;
        }
        let shares = summary
            .areas
            .iter()
            .map(|share| format!("{} {}%", share.name, share.pct))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{}\t{:.2}h\t{}",
            summary.label.as_deref().unwrap_or(key),
            summary.total,
            shares
        );
    }
}
