//! Terminal progress rendering for the suite monitor.

use std::io::{self, Write};

use chrono::{DateTime, Utc};

/// Width used when the terminal does not report one.
const DEFAULT_WIDTH: usize = 80;

fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_WIDTH)
}

/// `Elapsed time: hh:mm:ss - experiments N (F failed)/T (P%)`.
pub fn format_status_message(
    elapsed_seconds: i64,
    experiments_num: usize,
    completed_num: usize,
    failed_num: usize,
    percentage: f64,
) -> String {
    let elapsed_minutes = elapsed_seconds / 60;
    format!(
        "Elapsed time: {:02}:{:02}:{:02} - experiments {}{}/{} ({}%)",
        elapsed_minutes / 60,
        elapsed_minutes % 60,
        elapsed_seconds % 60,
        completed_num,
        if failed_num == 0 {
            String::new()
        } else {
            format!(" ({} failed)", failed_num)
        },
        experiments_num,
        (percentage * 100.0) as i64,
    )
}

/// Build a `[###...]` bar whose fill is proportional to `percentage` of
/// `total_length` columns.
pub fn progress_bar(total_length: usize, percentage: f64) -> String {
    let bar_length = ((percentage * total_length as f64) as i64 - 2).max(0) as usize;
    format!("[{}]", "#".repeat(bar_length))
}

/// Redraw the in-place status bar on stdout.
pub fn print_status_bar(
    start_ts: DateTime<Utc>,
    experiments_num: usize,
    completed_num: usize,
    failed_num: usize,
) {
    let percentage = (completed_num + failed_num) as f64 / experiments_num as f64;
    let bar = progress_bar(terminal_width(), percentage);
    let elapsed_seconds = (Utc::now() - start_ts).num_seconds();
    let status_message = format_status_message(
        elapsed_seconds,
        experiments_num,
        completed_num,
        failed_num,
        percentage,
    );

    let overhead = 4;
    let status_bar = if status_message.len() + overhead >= bar.len() {
        format!("[ {} ]", status_message)
    } else {
        let padded_message = format!("[ {} ", status_message);
        let tail = &bar[padded_message.len()..];
        format!("{}{}", padded_message, tail)
    };
    print!("{}\r", status_bar);
    let _ = io::stdout().flush();
}

// ── Tests ─────────────────────────────────────────────────────────
