//! Report rendering.

use std::path::Path;

use anyhow::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use paging_verify::{ConsistencyReport, Outcome, ScenarioReport};

use crate::OutputFormat;

/// Render all reports in the requested format.
pub fn render(reports: &[ConsistencyReport], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(reports).context("Failed to serialize reports")
        }
        OutputFormat::Table => Ok(format_table(reports)),
        OutputFormat::Markdown => Ok(format_markdown(reports)),
    }
}

/// Write rendered output to `path`, or stdout when there is none.
pub fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write report to {path:?}")),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

pub fn format_table(reports: &[ConsistencyReport]) -> String {
    let mut output = String::new();

    for report in reports {
        output.push_str(&format!(
            "{} (started {})\n",
            report.target,
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            "Scenario",
            "Page sizes",
            "Calls",
            "Items",
            "Duration",
            "Status",
            "Details",
        ]);

        for scenario in &report.scenarios {
            let status = match &scenario.outcome {
                Outcome::Passed => Cell::new("PASSED").fg(Color::Green),
                Outcome::Failed { .. } => Cell::new("FAILED").fg(Color::Red),
                Outcome::Aborted { .. } => Cell::new("ABORTED").fg(Color::Red),
                Outcome::Skipped { .. } => Cell::new("SKIPPED").fg(Color::Yellow),
            };
            table.add_row(vec![
                Cell::new(scenario.scenario),
                Cell::new(page_sizes(scenario)),
                Cell::new(scenario.calls),
                Cell::new(scenario.items),
                Cell::new(format!("{:.2}s", scenario.duration.as_secs_f64())),
                status,
                Cell::new(details(&scenario.outcome).join("\n")),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&report.summary());
        output.push_str("\n\n");
    }

    output.push_str(&overall(reports));
    output
}

pub fn format_markdown(reports: &[ConsistencyReport]) -> String {
    let mut output = String::new();

    output.push_str("# Pagination Consistency Report\n\n");
    output.push_str(&format!("**{}**\n\n", overall(reports)));

    for report in reports {
        output.push_str(&format!("## {}\n\n", report.target));
        output.push_str(&format!(
            "**Started at:** {}\n\n",
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str("| Scenario | Page sizes | Calls | Items | Duration | Status |\n");
        output.push_str("|----------|------------|-------|-------|----------|--------|\n");

        for scenario in &report.scenarios {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {:.2}s | {} |\n",
                scenario.scenario,
                page_sizes(scenario),
                scenario.calls,
                scenario.items,
                scenario.duration.as_secs_f64(),
                scenario.outcome.label()
            ));
        }
        output.push('\n');

        let problems: Vec<(&ScenarioReport, String)> = report
            .scenarios
            .iter()
            .flat_map(|s| details(&s.outcome).into_iter().map(move |d| (s, d)))
            .collect();
        if !problems.is_empty() {
            output.push_str("### Problems\n\n");
            for (scenario, detail) in problems {
                output.push_str(&format!("- **{}**: {}\n", scenario.scenario, detail));
            }
            output.push('\n');
        }
    }

    output
}

fn page_sizes(scenario: &ScenarioReport) -> String {
    if scenario.page_sizes.is_empty() {
        return "default".to_string();
    }
    scenario
        .page_sizes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn details(outcome: &Outcome) -> Vec<String> {
    match outcome {
        Outcome::Passed => Vec::new(),
        Outcome::Failed { violations } => violations.iter().map(ToString::to_string).collect(),
        Outcome::Aborted { error } => vec![error.clone()],
        Outcome::Skipped { reason } => vec![reason.clone()],
    }
}

fn overall(reports: &[ConsistencyReport]) -> String {
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed == 0 {
        format!("All {} targets PASSED", reports.len())
    } else {
        format!("{failed} of {} targets FAILED", reports.len())
    }
}
