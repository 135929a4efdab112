//! Report export: JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: dated action log for spreadsheets
//! - **Markdown**: short human-readable summary
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::replay::{ReplayReport, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn report_json(report: &ReplayReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ReplayReport to JSON")
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<ReplayReport> {
    let report: ReplayReport =
        serde_json::from_str(json).context("failed to deserialize ReplayReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Action log as CSV. Columns: date, action, symbol, weight.
pub fn actions_csv(report: &ReplayReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "action", "symbol", "weight"])?;
    for timed in &report.actions {
        let action = &timed.action;
        let date = timed.date.to_string();
        let weight = action
            .weight()
            .map(|w| format!("{w:.6}"))
            .unwrap_or_default();
        wtr.write_record([
            date.as_str(),
            action.label(),
            action.symbol().unwrap_or(""),
            weight.as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown ───────────────────────────────────────────────────────

pub fn summary_markdown(report: &ReplayReport) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Replay Report\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", report.strategy));
    md.push_str(&format!("| Period | {} to {} |\n", report.start, report.end));
    md.push_str(&format!("| Data events | {} |\n", report.data_events));
    md.push_str(&format!("| Triggers | {} |\n", report.triggers));
    md.push_str(&format!("| Rebalances | {} |\n", report.rebalances.len()));
    md.push_str(&format!("| Errors | {} |\n", report.errors.len()));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }

    if let Some(last) = report.rebalances.last() {
        md.push_str(&format!("\n## Latest rebalance ({})\n\n", last.date));
        if last.liquidated {
            md.push_str("Liquidated all holdings first.\n\n");
        }
        for target in &last.targets {
            md.push_str(&format!("- {}: {:.4}\n", target.symbol, target.weight));
        }
    }

    if !report.errors.is_empty() {
        md.push_str("\n## Errors\n\n");
        for e in &report.errors {
            md.push_str(&format!("- {}: {}\n", e.date, e.message));
        }
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save a report under `output_dir/{strategy}_{timestamp}/`:
/// - `report.json`: the full `ReplayReport`
/// - `actions.csv`: the dated action log
/// - `summary.md`: human-readable summary
///
/// Returns the created directory.
pub fn save_report(report: &ReplayReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.strategy,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create report dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), report_json(report)?)?;
    std::fs::write(run_dir.join("actions.csv"), actions_csv(report)?)?;
    std::fs::write(run_dir.join("summary.md"), summary_markdown(report))?;

    Ok(run_dir)
}

/// Load a report from a directory written by [`save_report`].
pub fn load_report(dir: &Path) -> Result<ReplayReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
