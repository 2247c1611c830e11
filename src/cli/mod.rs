pub mod calendar;
pub mod export;
pub mod summary;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use calendar::{process_calendar_command, CalendarCommand};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use export::{process_export_command, ExportCommand};
use now::DateTimeNow;
use summary::{process_summary_command, SummaryCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    outline::node::ClockWindow,
    utils::{
        dir::create_application_default_path, logging::enable_logging, time::month_label,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Orgtally", version, long_about = None)]
#[command(about = "Aggregates clocked outline files into time reports", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Print total and grouped time for a period")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "Display an activity calendar with day and week breakdowns")]
    Calendar {
        #[command(flatten)]
        command: CalendarCommand,
    },
    #[command(about = "Export the aggregated hierarchy as json")]
    Export {
        #[command(flatten)]
        command: ExportCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&create_application_default_path()?, logging_level, args.log)?;

    match args.commands {
        Commands::Summary { command } => process_summary_command(command).await,
        Commands::Calendar { command } => process_calendar_command(command).await,
        Commands::Export { command } => process_export_command(command).await,
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Input files and reporting period, shared by every subcommand.
#[derive(Debug, clap::Args)]
pub struct ScopeArgs {
    #[arg(
        short,
        long = "file",
        required = true,
        help = "Outline document to aggregate. Repeat for several files, report sections keep this order"
    )]
    files: Vec<PathBuf>,
    #[arg(
        long = "start",
        short,
        help = "Start of the period. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\", \"12 AM 16/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of the period. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\", \"12 AM 16/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long = "days",
        default_value_t = false,
        help = "Take inputs as whole days. For example if start and end are both 15/03/2025 this option allows to report the whole day"
    )]
    treat_as_days: bool,
    #[arg(
        long,
        conflicts_with_all = ["start_date", "end_date", "month", "year"],
        help = "Report an ISO week of the current year, or the current week when no number is given"
    )]
    week: Option<Option<u32>>,
    #[arg(
        long,
        conflicts_with_all = ["start_date", "end_date", "year"],
        help = "Report a month of the current year, or the current month when no number is given"
    )]
    month: Option<Option<u32>>,
    #[arg(
        long,
        conflicts_with_all = ["start_date", "end_date"],
        help = "Report a whole year, or the current year when none is given"
    )]
    year: Option<Option<i32>>,
}

/// A scope with every date argument resolved. `period` is the human name of
/// the window used in report headers.
pub struct ResolvedScope {
    pub files: Vec<PathBuf>,
    pub window: ClockWindow,
    pub period: String,
}

impl ResolvedScope {
    /// Whole days the period spans, at least one. None for open periods.
    pub fn days_spanned(&self) -> Option<i64> {
        match (self.window.start, self.window.end) {
            (Some(start), Some(end)) => Some((end - start).num_days().max(1)),
            _ => None,
        }
    }
}

/// Also provides sensible defaults: no dates at all means the whole journal.
pub fn resolve_scope(scope: ScopeArgs) -> Result<ResolvedScope> {
    let ScopeArgs {
        files,
        start_date,
        end_date,
        date_style,
        treat_as_days,
        week,
        month,
        year,
    } = scope;

    let now = Local::now();

    if let Some(week) = week {
        let (start, end, period) = week_window(week, now)?;
        return Ok(ResolvedScope {
            files,
            window: ClockWindow::between(start, end),
            period,
        });
    }
    if let Some(month) = month {
        let (start, end, period) = month_window(month, now)?;
        return Ok(ResolvedScope {
            files,
            window: ClockWindow::between(start, end),
            period,
        });
    }
    if let Some(year) = year {
        let (start, end, period) = year_window(year, now)?;
        return Ok(ResolvedScope {
            files,
            window: ClockWindow::between(start, end),
            period,
        });
    }

    let dialect: chrono_english::Dialect = date_style.into();
    let mut start = match start_date.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => Some(v.with_timezone(&Local)),
        Some(Err(e)) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate start date {e}"),
                )
                .into());
        }
        None => None,
    };
    let mut end = match end_date.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => Some(v.with_timezone(&Local)),
        Some(Err(e)) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate end date {e}"),
                )
                .into());
        }
        None => None,
    };
    if treat_as_days {
        start = start.map(|v| v.beginning_of_day());
        end = end.map(|v| (v + Duration::days(1)).beginning_of_day());
    }

    let window = ClockWindow {
        start: start.map(|v| v.naive_local()),
        end: end.map(|v| v.naive_local()),
    };
    let period = match (window.start, window.end) {
        (Some(start), Some(end)) => format!("{} to {}", start.date(), end.date()),
        (Some(start), None) => format!("since {}", start.date()),
        (None, Some(end)) => format!("until {}", end.date()),
        (None, None) => "all time".to_string(),
    };

    Ok(ResolvedScope {
        files,
        window,
        period,
    })
}

fn week_window(
    week: Option<u32>,
    now: DateTime<Local>,
) -> Result<(NaiveDateTime, NaiveDateTime, String)> {
    let iso_year = now.iso_week().year();
    let week_number = week.unwrap_or_else(|| now.iso_week().week());

    let Some(monday) = NaiveDate::from_isoywd_opt(iso_year, week_number, Weekday::Mon) else {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("{iso_year} has no week {week_number}"),
            )
            .into());
    };
    let start = monday.and_time(NaiveTime::MIN);
    Ok((
        start,
        start + Duration::days(7),
        format!("Week {week_number} {iso_year}"),
    ))
}

fn month_window(
    month: Option<u32>,
    now: DateTime<Local>,
) -> Result<(NaiveDateTime, NaiveDateTime, String)> {
    let year = now.year();
    let month_number = month.unwrap_or_else(|| now.month());

    let Some(first) = NaiveDate::from_ymd_opt(year, month_number, 1) else {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("{year} has no month {month_number}"),
            )
            .into());
    };
    let next = if month_number == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_number + 1, 1)
    }
    .expect("Start of the next month should always exist");

    Ok((
        first.and_time(NaiveTime::MIN),
        next.and_time(NaiveTime::MIN),
        month_label(first),
    ))
}

fn year_window(
    year: Option<i32>,
    now: DateTime<Local>,
) -> Result<(NaiveDateTime, NaiveDateTime, String)> {
    let year_number = year.unwrap_or_else(|| now.year());

    let Some(first) = NaiveDate::from_ymd_opt(year_number, 1, 1) else {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("{year_number} is out of range"),
            )
            .into());
    };
    let next = NaiveDate::from_ymd_opt(year_number + 1, 1, 1)
        .expect("Start of the next year should always exist");

    Ok((
        first.and_time(NaiveTime::MIN),
        next.and_time(NaiveTime::MIN),
        format!("Year {year_number}"),
    ))
}
