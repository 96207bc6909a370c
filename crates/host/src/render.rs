// crates/host/src/render.rs

//! Colored terminal output for insights and history.

use std::fmt::Display;

use perf_insights_core::history::{PerformanceHistory, QuarterSummary, TrendDirection};
use perf_insights_core::{Insight, InsightReport, InsightType, Priority};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";

fn type_style(insight_type: InsightType) -> (&'static str, &'static str) {
    match insight_type {
        InsightType::Positive => ("✓", GREEN),
        InsightType::Warning => ("!", RED),
        InsightType::Improvement => ("↗", BLUE),
        InsightType::Opportunity => ("★", MAGENTA),
        InsightType::Insight => ("※", YELLOW),
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => RED,
        Priority::Medium => YELLOW,
        Priority::Low => GREEN,
    }
}

/// Print a full insight report.
pub fn report(report: &InsightReport) {
    let summary = report.summary();
    println!(
        "{BOLD}AI Insights{RESET} {DIM}for {} ({} evaluations){RESET}",
        report.viewer_email,
        report.evaluations.len()
    );
    println!(
        "{DIM}total {}  ·  high priority {}  ·  strengths {}  ·  opportunities {}{RESET}\n",
        summary.total, summary.high_priority, summary.positive, summary.opportunities
    );
    for item in &report.insights {
        insight(item);
    }
    if let Some(avg) = report.analytics.team_average() {
        println!("{DIM}Team average rating: {:.1}/5{RESET}", avg);
    }
}

/// Print one insight card.
pub fn insight(item: &Insight) {
    let (symbol, color) = type_style(item.insight_type);
    println!(
        "{color}{BOLD}{symbol} {}{RESET}  {}{} PRIORITY{RESET}  {DIM}{}{RESET}",
        item.title,
        priority_color(item.priority),
        item.priority.as_str().to_uppercase(),
        item.category
    );
    println!("  {}", item.description);
    println!("  {BOLD}Recommendation:{RESET} {}", item.recommendation);
    println!("  {DIM}Confidence: {}%{RESET}\n", item.confidence);
}

/// Print history grouped by year and quarter, optionally a single year.
pub fn history(history: &PerformanceHistory, only_year: Option<i32>) {
    if history.is_empty() {
        info("No evaluations yet.");
        return;
    }

    for year in &history.years {
        if only_year.is_some_and(|y| y != year.year) {
            continue;
        }
        println!(
            "{BOLD}{}{RESET} {DIM}({} evaluations){RESET}",
            year.year,
            year.evaluation_count()
        );
        for q in &year.quarters {
            quarter(history, q);
        }
    }
}

fn quarter(history: &PerformanceHistory, q: &QuarterSummary) {
    let manager = q
        .average_manager_rating()
        .map(|m| format!("{:.1}", m))
        .unwrap_or_else(|| "-".to_string());

    let trend = match history.quarter_trend(q.year, q.quarter) {
        Some(t) => match t.direction {
            TrendDirection::Up => format!("{GREEN}↑ {}{RESET}", t.delta_label()),
            TrendDirection::Down => format!("{RED}↓ {}{RESET}", t.delta_label()),
            TrendDirection::Stable => format!("{DIM}→ stable{RESET}"),
        },
        None => String::new(),
    };

    println!(
        "  {}  self {:.1}  manager {}  {DIM}[{} evaluation(s)]{RESET} {}",
        q.label(),
        q.average_self_rating(),
        manager,
        q.evaluations.len(),
        trend
    );
}

/// Log info message.
pub fn info(message: impl Display) {
    println!("{DIM}[info]{RESET} {}", message);
}

/// Log a warning.
pub fn warn(message: impl Display) {
    eprintln!("{YELLOW}[warn]{RESET} {}", message);
}

/// Log success.
pub fn success(message: impl Display) {
    println!("{GREEN}[ok]{RESET} {}", message);
}

/// Log an error.
pub fn error(message: impl Display) {
    eprintln!("{RED}[error]{RESET} {}", message);
}
