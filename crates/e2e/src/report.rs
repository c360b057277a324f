//! Run summary and scenario listing output

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::error::{E2eResult, FailureKind};
use crate::runner::{Phase, ScenarioFilter, ScenarioResult, SuiteSummary};
use crate::scenario::Suite;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Setup => "setup",
        Phase::Baseline => "baseline",
        Phase::Scenario => "scenario",
    }
}

fn result_row(result: &ScenarioResult) -> Vec<Cell> {
    let (status, color) = if result.success {
        ("PASS", Color::Green)
    } else {
        ("FAIL", Color::Red)
    };
    let failure = result
        .failure
        .as_ref()
        .map(|f| format!("{} at {} step {}", f.kind, phase_label(f.phase), f.step))
        .unwrap_or_default();

    vec![
        Cell::new(&result.suite),
        Cell::new(&result.name),
        Cell::new(status).fg(color),
        Cell::new(format!("{} ms", result.duration_ms)),
        Cell::new(failure),
    ]
}

/// Render the summary in the requested format
pub fn render_summary(summary: &SuiteSummary, format: OutputFormat) -> E2eResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Suite", "Scenario", "Result", "Duration", "Failure"]);
            for result in &summary.results {
                table.add_row(result_row(result));
            }

            let mut out = format!("{table}\n");

            for result in summary.results.iter().filter(|r| !r.success) {
                if let Some(failure) = &result.failure {
                    out.push_str(&format!(
                        "\n{} {}/{}\n",
                        "✗".red(),
                        result.suite,
                        result.name.bold()
                    ));
                    out.push_str(&format!("    kind:     {}\n", failure.kind));
                    out.push_str(&format!("    step:     {}\n", failure.step));
                    if let Some(target) = &failure.target {
                        out.push_str(&format!("    target:   {}\n", target));
                    }
                    if let Some(expected) = &failure.expected {
                        out.push_str(&format!("    expected: {}\n", expected));
                    }
                    if let Some(actual) = &failure.actual {
                        out.push_str(&format!("    actual:   {}\n", actual));
                    }
                    out.push_str(&format!("    {}\n", failure.message.dimmed()));
                }
            }

            let totals = format!(
                "{} passed, {} failed ({} timeout, {} mismatch, {} navigation, {} harness) in {} ms",
                summary.passed,
                summary.failed,
                summary.count_kind(FailureKind::Timeout),
                summary.count_kind(FailureKind::PredicateMismatch),
                summary.count_kind(FailureKind::NavigationFailure),
                summary.count_kind(FailureKind::Harness),
                summary.duration_ms,
            );
            let totals = if summary.success() {
                totals.green()
            } else {
                totals.red()
            };
            out.push_str(&format!("\n{}\n", totals));
            Ok(out)
        }
    }
}

pub fn print_summary(summary: &SuiteSummary, format: OutputFormat) -> E2eResult<()> {
    print!("{}", render_summary(summary, format)?);
    Ok(())
}

#[derive(serde::Serialize)]
struct ListingEntry<'a> {
    suite: &'a str,
    scenario: &'a str,
    tags: &'a [String],
    steps: usize,
    description: &'a str,
}

/// Render the scenarios the filter selects, without running them
pub fn render_listing(suites: &[Suite], filter: &ScenarioFilter, format: OutputFormat) -> E2eResult<String> {
    let selected = filter.select(suites);
    let entries: Vec<ListingEntry<'_>> = selected
        .iter()
        .map(|(suite, scenario)| ListingEntry {
            suite: &suite.name,
            scenario: &scenario.name,
            tags: &scenario.tags,
            steps: suite.baseline.len() + scenario.steps.len(),
            description: &scenario.description,
        })
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => {
            if entries.is_empty() {
                return Ok("No scenarios selected.\n".to_string());
            }
            let mut table = new_table();
            table.set_header(vec!["Suite", "Scenario", "Tags", "Steps", "Description"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.suite.to_string(),
                    entry.scenario.to_string(),
                    entry.tags.join(", "),
                    entry.steps.to_string(),
                    entry.description.to_string(),
                ]);
            }
            Ok(format!("{table}\n"))
        }
    }
}
