//! Terminal rendering for reload runs: banner, live progress, per-iteration
//! log lines, and the summary table. Everything here consumes outcome
//! records; none of it is visible to the reload loop itself.

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::runner::{ReloadOutcome, ReloadPlan};

/// Print the run header: target, count, delay range, headless flag.
pub fn print_banner(url: &str, plan: &ReloadPlan, headless: bool) {
    println!("{}", "Reload Automation".bold().cyan());
    println!("  {} {}", "Target:".dimmed(), url);
    println!(
        "  {} {} | {} {:.2}-{:.2}s | {} {}",
        "Reloads:".dimmed(),
        plan.count,
        "Delay:".dimmed(),
        plan.delay_min,
        plan.delay_max,
        "Headless:".dimmed(),
        headless
    );
    println!();
}

/// Create the live progress bar for a run of `count` reloads.
pub fn reload_bar(count: u32) -> ProgressBar {
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("valid progress template")
            .progress_chars("━╸─"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Advance the bar by one iteration, showing the latest outcome.
pub fn tick_bar(pb: &ProgressBar, record: &ReloadOutcome) {
    let marker = if record.status.is_success() {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    };
    pb.set_message(format!("{} reload {}", marker, record.seq));
    pb.inc(1);
}

/// One plain log line per iteration, used when the bar is suppressed.
pub fn print_record_line(record: &ReloadOutcome, total: u32) {
    match record.status.error_message() {
        None => println!(
            "{} Reload {}/{} ({:.2}s delay)",
            "✓".green(),
            record.seq,
            total,
            record.delay_secs
        ),
        Some(error) => println!(
            "{} Reload {}/{} ({:.2}s delay): {}",
            "✗".red(),
            record.seq,
            total,
            record.delay_secs,
            error
        ),
    }
}

/// Print the end-of-run summary table.
pub fn print_summary(records: &[ReloadOutcome]) {
    println!();
    println!("{}", "Reload Summary".bold().green());
    println!("  {}", "─".repeat(60).dimmed());
    println!(
        "  {:>4}  {:>8}  {:>9}  {:<6}  {}",
        "#".bold(),
        "Time".bold(),
        "Delay (s)".bold(),
        "Status".bold(),
        "Error".bold()
    );

    for record in records {
        let status = if record.status.is_success() {
            "OK".green().to_string()
        } else {
            "FAIL".red().to_string()
        };
        println!(
            "  {:>4}  {:>8}  {:>9}  {:<6}  {}",
            record.seq,
            record.completed_at.format("%H:%M:%S"),
            format!("{:.2}", record.delay_secs),
            status,
            record.status.error_message().unwrap_or("-")
        );
    }

    let (ok, failed) = tally(records);
    println!("  {}", "─".repeat(60).dimmed());
    println!(
        "  {} succeeded, {} failed",
        ok.to_string().green(),
        if failed > 0 {
            failed.to_string().red().to_string()
        } else {
            failed.to_string()
        }
    );
}

/// Count successful and failed records.
pub fn tally(records: &[ReloadOutcome]) -> (usize, usize) {
    let ok = records.iter().filter(|r| r.status.is_success()).count();
    (ok, records.len() - ok)
}
