use std::collections::BTreeMap;

use ansi_term::Style;
use anyhow::Result;
use clap::Parser;

use crate::{
    outline::source::{load_forest, JsonOutlineSource},
    rollup::{grouping, ClockForest},
    utils::percentage::{hours_percentage, Percentage},
};

use super::{resolve_scope, ResolvedScope, ScopeArgs};

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[command(flatten)]
    scope: ScopeArgs,
    #[arg(
        short = 'n',
        long,
        default_value_t = 15,
        help = "How many topics and subtasks to list"
    )]
    top: usize,
    #[arg(
        short = 'p',
        long = "percentage",
        help = "Hide rows below this percentage of the total",
        default_value_t = Percentage::new_opt(0.1).unwrap()
    )]
    min_percentage: Percentage,
    #[arg(long, help = "Print the report as json instead of tables")]
    json: bool,
}

/// Command to process `summary`. Prints how the tracked time of a period
/// distributes over areas, topics, subtasks and tags.
pub async fn process_summary_command(
    SummaryCommand {
        scope,
        top,
        min_percentage,
        json,
    }: SummaryCommand,
) -> Result<()> {
    let resolved = resolve_scope(scope)?;

    let forest = load_forest(&JsonOutlineSource, &resolved.files).await;
    let tree = ClockForest::aggregate(&forest, &resolved.window);

    if tree.total_hours() <= 0. {
        println!("No time tracked in the specified period.");
        return Ok(());
    }

    if json {
        print_json(&tree, &resolved)?;
    } else {
        print_tables(&tree, &resolved, top, min_percentage);
    }
    Ok(())
}

fn print_json(tree: &ClockForest, resolved: &ResolvedScope) -> Result<()> {
    let payload = serde_json::json!({
        "period": resolved.period,
        "total": tree.total_hours(),
        "areas": grouping::by_area(tree),
        "topics": grouping::by_topic(tree),
        "subtasks": grouping::by_subtask(tree),
        "tags": grouping::by_tag(tree),
        "tasks": grouping::flatten(tree),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn print_tables(
    tree: &ClockForest,
    resolved: &ResolvedScope,
    top: usize,
    min_percentage: Percentage,
) {
    let bold = Style::new().bold();
    println!("{}", bold.paint(format!("TIME REPORT - {}", resolved.period)));
    println!("Total: {}", format_hours(tree.total_hours()));
    if let Some(days) = resolved.days_spanned() {
        println!(
            "Average per day: {}",
            format_hours(tree.total_hours() / days as f64)
        );
    }

    let whole = tree.total_hours();
    print_grouping("BY AREA", &grouping::by_area(tree), whole, usize::MAX, min_percentage);
    print_grouping("BY TOPIC", &grouping::by_topic(tree), whole, top, min_percentage);
    print_grouping("BY SUBTASK", &grouping::by_subtask(tree), whole, top, min_percentage);
    print_grouping("BY TAG", &grouping::by_tag(tree), whole, usize::MAX, min_percentage);
}

fn print_grouping(
    title: &str,
    hours: &BTreeMap<String, f64>,
    whole: f64,
    top: usize,
    min_percentage: Percentage,
) {
    let (visible, hidden) = select_rows(hours, whole, top, min_percentage);
    if visible.is_empty() {
        return;
    }

    println!();
    println!("{}", Style::new().bold().paint(title));
    for (name, hours) in &visible {
        println!(
            "{}\t{}%\t{}",
            format_hours(*hours),
            *hours_percentage(*hours, whole) as i32,
            name
        );
    }
    if hidden > 0 {
        println!("(+{hidden} more not shown)");
    }
}

/// Rows sorted by hours that survive both the top cutoff and the percentage
/// floor, plus how many rows either cut removed.
fn select_rows(
    hours: &BTreeMap<String, f64>,
    whole: f64,
    top: usize,
    min_percentage: Percentage,
) -> (Vec<(&str, f64)>, usize) {
    let mut entries: Vec<(&str, f64)> = hours.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total_count = entries.len();
    let visible: Vec<_> = entries
        .into_iter()
        .take(top)
        .filter(|(_, hours)| hours_percentage(*hours, whole) >= min_percentage)
        .collect();
    let hidden = total_count - visible.len();
    (visible, hidden)
}

fn format_hours(v: f64) -> String {
    format!("{v:.2}h")
}
