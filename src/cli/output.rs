//! CLI output formatting

use crate::{
    core::{ExecutionStatus, PipelineStep, RunSummary, StepStatus},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Spinner shown while a batch run is in flight
pub fn create_spinner() -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} steps {msg}") {
        progress.set_style(template);
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// One line per step: status, depth, domain, keyword and what it found
pub fn format_step(step: &PipelineStep) -> String {
    let head = format!(
        "[d{}] {} {} {}",
        step.depth,
        style(step.domain_type).cyan(),
        style(format!("{:?}", step.search_parameter)).bold(),
        style(format!("({})", step.category)).dim()
    );

    match step.status() {
        StepStatus::Pending => format!("{}{}", SPINNER, head),
        StepStatus::Succeeded => format!(
            "{}{} {}",
            CHECK,
            head,
            style(format!("{} records, {} keywords", step.output.len(), step.keyword_count())).dim()
        ),
        StepStatus::Failed => format!(
            "{}{} {}",
            CROSS,
            head,
            style(step.error.as_deref().unwrap_or("failed")).red()
        ),
    }
}

/// Format run summary for display
pub fn format_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        _ => INFO,
    };

    format!(
        "{}{} - {} - {} ({} steps: {} ok, {} failed, depth {})",
        status_icon,
        style(&summary.id.to_string()[..8]).dim(),
        style(format!("{:?}", summary.query)).bold(),
        format_status(summary.status),
        summary.total_steps,
        style(summary.successful_steps).green(),
        style(summary.failed_steps).red(),
        summary.max_depth_reached
    )
}

/// Format an execution event for display
pub fn format_event(event: &ExecutionEvent) -> Option<String> {
    match event {
        ExecutionEvent::StepStarted(_) => None,
        ExecutionEvent::Step(step) => Some(format_step(step)),
        ExecutionEvent::Summary(summary) => Some(format!("\n{}", format_summary(summary))),
        ExecutionEvent::Error { message } => Some(format!("{}{}", WARN, style(message).red())),
        ExecutionEvent::Complete => Some(format!("{}{}", ROCKET, style("complete").green())),
    }
}

/// Clip a line to the terminal width
pub fn fit_to_terminal(line: &str) -> String {
    let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(120);
    truncate_visible(line, width)
}

/// Truncate by visible width, ignoring ANSI styling
pub fn truncate_visible(line: &str, width: usize) -> String {
    if console::measure_text_width(line) <= width {
        line.to_string()
    } else {
        console::truncate_str(line, width, "…").into_owned()
    }
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
