//! Aggregate command: replay recorded sessions into personalization facts

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use exposure_core::{
    InMemoryContentRepository, JsonSessionExtractor, MemoryFactSink, PersonalizationAggregator,
    PersonalizationKey, PersonalizationValue, RunSummary, aggregate_sessions,
};
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigLoader, OutputFormat};

#[derive(Args)]
pub struct AggregateArgs {
    /// Newline-delimited JSON file of recorded sessions
    #[arg(short, long)]
    pub sessions: PathBuf,

    /// JSON content repository fixture (empty repository if omitted)
    #[arg(short, long)]
    pub repository: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Run with aggregation disabled (overrides config)
    #[arg(long)]
    pub disabled: bool,
}

/// One aggregated fact, flattened for JSON output
#[derive(Serialize)]
struct FactRow<'a> {
    #[serde(flatten)]
    key: &'a PersonalizationKey,
    #[serde(flatten)]
    value: &'a PersonalizationValue,
}

pub async fn run(args: AggregateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;

    let mut aggregation = config.aggregation;
    if args.disabled {
        aggregation.enabled = false;
    }
    let format = args.format.unwrap_or(config.output.format);

    let repository = match &args.repository {
        Some(path) => InMemoryContentRepository::load(path)
            .with_context(|| format!("Failed to load repository {}", path.display()))?,
        None => InMemoryContentRepository::new(),
    };

    let file = File::open(&args.sessions)
        .with_context(|| format!("Failed to open sessions {}", args.sessions.display()))?;
    let sessions = JsonSessionExtractor
        .extract_lines(BufReader::new(file))
        .with_context(|| format!("Failed to read sessions {}", args.sessions.display()))?;
    info!(sessions = sessions.len(), "Loaded sessions");

    let sink = Arc::new(MemoryFactSink::new());
    let aggregator = Arc::new(PersonalizationAggregator::new(
        aggregation,
        Arc::new(repository),
        sink.clone(),
    ));

    let summary = aggregate_sessions(aggregator, sessions).await?;
    let facts = sink.snapshot();

    match format {
        OutputFormat::Json => print_json(&facts)?,
        OutputFormat::Table => print_table(&facts, &summary, sink.emissions()),
    }
    Ok(())
}

fn print_json(facts: &[(PersonalizationKey, PersonalizationValue)]) -> Result<()> {
    let rows: Vec<FactRow<'_>> = facts
        .iter()
        .map(|(key, value)| FactRow { key, value })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_table(
    facts: &[(PersonalizationKey, PersonalizationValue)],
    summary: &RunSummary,
    emissions: u64,
) {
    if facts.is_empty() {
        println!("No facts emitted.");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Test").fg(Color::Cyan),
            Cell::new("Combination").fg(Color::Cyan),
            Cell::new("Date").fg(Color::Cyan),
            Cell::new("Rule set").fg(Color::Cyan),
            Cell::new("Rule").fg(Color::Cyan),
            Cell::new("Default").fg(Color::Cyan),
            Cell::new("Visits").fg(Color::Cyan),
            Cell::new("Visitors").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

        for (key, value) in facts {
            table.add_row(vec![
                Cell::new(key.test_set_id),
                Cell::new(format_combination(&key.test_values)),
                Cell::new(key.date),
                Cell::new(key.rule_set_id),
                Cell::new(key.rule_id),
                Cell::new(if key.is_default { "yes" } else { "no" }),
                Cell::new(value.visits),
                Cell::new(value.visitors),
                Cell::new(value.value),
            ]);
        }

        println!("{table}");
    }

    println!();
    println!(
        "{} sessions, {} pages, {} emissions, {} facts",
        summary.sessions,
        summary.pages,
        emissions,
        facts.len()
    );
}

fn format_combination(values: &[u8]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combination_is_comma_separated() {
        assert_eq!(format_combination(&[0, 2, 1]), "0,2,1");
        assert_eq!(format_combination(&[]), "");
    }
}
