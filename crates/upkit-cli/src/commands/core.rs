//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `RunContext` - Settings plus the clock value for one invocation
//! - `resolve_window` - Turn window arguments into start/end timestamps
//! - `open_source` - Build the Up API client
//! - `save_workbook` - Write a report workbook to the output directory
//! - `cmd_offset` - Print a shifted timestamp

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use upkit_core::time::{format_timestamp, parse_timestamp, shift_back};
use upkit_core::{write_workbook, ReportRequest, Settings, TimeUnit, UpClient, Workbook};

use crate::cli::{OutputArgs, WindowArgs};

/// Everything a command needs besides its own arguments
pub struct RunContext {
    pub settings: Settings,
    /// "Now" in the configured timezone, read once at start-up
    pub now: NaiveDateTime,
}

impl RunContext {
    pub fn new(settings: Settings, now: NaiveDateTime) -> Self {
        Self { settings, now }
    }

    /// Build a report request for `account` over the chosen window
    pub fn request(&self, account: &str, window: &WindowArgs) -> Result<ReportRequest> {
        let (start, end) = resolve_window(window, self.now)?;
        Ok(ReportRequest::new(
            account,
            start,
            end,
            self.now,
            self.settings.report.timezone,
        )
        .with_limit(window.limit))
    }

    /// Output directory and file name for a report
    pub fn output_target(&self, output: &OutputArgs, stem: &str) -> (PathBuf, String) {
        let dir = output
            .output_dir
            .clone()
            .unwrap_or_else(|| self.settings.report.output_dir.clone());
        let filename = output
            .output
            .clone()
            .unwrap_or_else(|| default_filename(&self.now, stem));
        (dir, filename)
    }
}

/// Resolve `--from/--to/--last/--unit` into an inclusive window.
///
/// A missing `--to` means now; a missing `--from` means `--last` units before the end.
pub fn resolve_window(window: &WindowArgs, now: NaiveDateTime) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let end = match &window.to {
        Some(to) => parse_timestamp(to).context("Invalid --to timestamp")?,
        None => now,
    };
    let start = match &window.from {
        Some(from) => parse_timestamp(from).context("Invalid --from timestamp")?,
        None => shift_back(end, window.unit, window.last)?,
    };
    Ok((start, end))
}

/// Report file name prefixed with the generation time, e.g. `2024-01-15-09-30-00-budget_vs_spend.xlsx`
pub fn default_filename(generated_at: &NaiveDateTime, stem: &str) -> String {
    let timestamp = format_timestamp(generated_at)
        .replace(':', "-")
        .replace(' ', "-");
    format!("{}-{}.xlsx", timestamp, stem)
}

/// Budget paths that don't exist as given are looked up in the input directory
pub fn resolve_input(path: &Path, input_dir: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        input_dir.join(path)
    }
}

pub fn open_source(settings: &Settings, token: Option<&str>) -> Result<UpClient> {
    UpClient::from_config(&settings.api, token).context("Failed to create Up API client")
}

/// Write `workbook`, creating the output directory if needed
pub fn save_workbook(workbook: &Workbook, dir: &Path, filename: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = write_workbook(workbook, dir, filename)
        .with_context(|| format!("Failed to write {}", dir.join(filename).display()))?;
    Ok(path)
}

/// Shift `from` (or now) back by `amount` units
pub fn cmd_offset(from: Option<&str>, unit: TimeUnit, amount: u32, now: NaiveDateTime) -> Result<String> {
    let start = match from {
        Some(from) => parse_timestamp(from).context("Invalid --from timestamp")?,
        None => now,
    };
    let shifted = shift_back(start, unit, amount)?;
    Ok(format_timestamp(&shifted))
}
