//! Presentation: text and JSON formatting of command results.

use crate::cli::scenario::ScenarioReport;
use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::policy::{InputShaping, Policy};
use crate::scheduler::Snapshot;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn describe_policy(policy: &Policy) -> String {
    match policy {
        Policy::Multiple { capacity } => format!("multiple ({})", capacity),
        other => other.name().to_string(),
    }
}

fn describe_shaping(shaping: &InputShaping) -> String {
    match shaping {
        InputShaping::None => "-".to_string(),
        InputShaping::Debounce { window_ms } => format!("debounce {}ms", window_ms),
        InputShaping::Latest { window_ms } => format!("latest {}ms", window_ms),
    }
}

pub fn format_config_text(config: &OverlayConfig) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Containers"));
    if config.containers.is_empty() {
        out.push_str("No containers configured.");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Policy", "Delay", "Order", "Shaping"]);
    for name in config.container_names() {
        let container = &config.containers[name];
        table.add_row(vec![
            name.to_string(),
            describe_policy(&container.policy),
            format!("{}ms", container.delay_ms),
            format!("{:?}", container.display_order).to_lowercase(),
            describe_shaping(&container.input_shaping),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_config_json(config: &OverlayConfig) -> Result<String, OverlayError> {
    let containers: Vec<_> = config
        .container_names()
        .into_iter()
        .map(|name| json!({ "name": name, "config": config.containers[name] }))
        .collect();
    serde_json::to_string_pretty(&json!({ "valid": true, "containers": containers }))
        .map_err(|e| OverlayError::ConfigError(e.to_string()))
}

fn snapshot_table(report: &ScenarioReport, snapshot: &Snapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Queue", "Position", "Item", "Align", "Inserted"]);
    for (position, item) in snapshot.main.iter().enumerate() {
        table.add_row(vec![
            "main".to_string(),
            position.to_string(),
            report.label_for(item.id),
            format!("{:?}", item.display.alignment).to_lowercase(),
            item.inserted_at
                .map(|at| at.format("%H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    for (position, item) in snapshot.temporary.iter().enumerate() {
        table.add_row(vec![
            "temporary".to_string(),
            position.to_string(),
            report.label_for(item.id),
            format!("{:?}", item.display.alignment).to_lowercase(),
            "-".to_string(),
        ]);
    }
    table
}

pub fn format_report_text(report: &ScenarioReport) -> String {
    let mut out = String::new();
    for (at_ms, name, snapshot) in &report.queries {
        out.push_str(&format!(
            "{}\n",
            format_section_heading(&format!("Query {} @ {}ms", name, at_ms))
        ));
        out.push_str(&format!("{}\n\n", snapshot_table(report, snapshot)));
    }
    for (name, snapshot) in &report.containers {
        out.push_str(&format!("{}\n", format_section_heading(name)));
        if snapshot.is_empty() {
            out.push_str("(empty)\n\n");
        } else {
            out.push_str(&format!("{}\n\n", snapshot_table(report, snapshot)));
        }
    }
    out.trim_end().to_string()
}

fn labels_of(report: &ScenarioReport, snapshot: &Snapshot) -> serde_json::Value {
    json!({
        "main": snapshot.main.iter().map(|item| report.label_for(item.id)).collect::<Vec<_>>(),
        "temporary": snapshot.temporary.iter().map(|item| report.label_for(item.id)).collect::<Vec<_>>(),
    })
}

pub fn format_report_json(report: &ScenarioReport) -> Result<String, OverlayError> {
    let containers: serde_json::Map<String, serde_json::Value> = report
        .containers
        .iter()
        .map(|(name, snapshot)| (name.clone(), labels_of(report, snapshot)))
        .collect();
    let queries: Vec<_> = report
        .queries
        .iter()
        .map(|(at_ms, name, snapshot)| {
            json!({ "at_ms": at_ms, "container": name, "queues": labels_of(report, snapshot) })
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "containers": containers, "queries": queries }))
        .map_err(|e| OverlayError::ScenarioError(e.to_string()))
}
