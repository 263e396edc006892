//! Colored CLI display utilities for deployment output.
//!
//! This module provides functions for printing colored, formatted output
//! to the terminal while a deployment is tailed.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::events::Severity;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum length, adding ellipsis if truncated.
///
/// Truncation happens on a character boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Bracketed tag shown in front of a log line.
#[must_use]
pub fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Debug => "[DEBUG]",
        Severity::Info => "[INFO]",
        Severity::Notice => "[NOTICE]",
        Severity::Warning => "[WARN]",
        Severity::Error => "[ERROR]",
    }
}

/// Print one deployment log line.
pub fn print_log_line(severity: Severity, message: &str) {
    let tag = severity_tag(severity);
    let tag = match severity {
        Severity::Debug => tag.dimmed().to_string(),
        Severity::Info => tag.blue().bold().to_string(),
        Severity::Notice => tag.cyan().bold().to_string(),
        Severity::Warning => tag.yellow().bold().to_string(),
        Severity::Error => tag.red().bold().to_string(),
    };
    println!("{} {} {}", timestamp().dimmed(), tag, message);
    let _ = io::stdout().flush();
}

/// Print deployment start information.
pub fn print_deploy_start(app_name: &str, deployment_id: &str) {
    println!(
        "{} {} app={}, deployment={}",
        timestamp().dimmed(),
        "[DEPLOY]".magenta().bold(),
        app_name.cyan(),
        truncate(deployment_id, 20).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print the final deployment result.
pub fn print_deploy_end(succeeded: bool, polls: u32) {
    let ts = timestamp();
    if succeeded {
        println!(
            "{} {} Deployment succeeded {}",
            ts.dimmed(),
            "[DEPLOY]".green().bold(),
            format!("polls={polls}").dimmed()
        );
    } else {
        println!(
            "{} {} Deployment failed {}",
            ts.dimmed(),
            "[DEPLOY]".red().bold(),
            format!("polls={polls}").dimmed()
        );
    }
    let _ = io::stdout().flush();
}

/// Print the reason a deployment failed.
pub fn print_failure(reason: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[FAILED]".red().bold(),
        truncate(reason, DEFAULT_MAX_LEN * 4).red()
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}
