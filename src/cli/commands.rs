//! Subcommand handlers
//!
//! Every handler returns `Ok` for degraded results (partial runs, missing
//! entities, empty categories). Errors are reserved for bad input and I/O.

use crate::analysis::aggregation::CategoryAnalysis;
use crate::analysis::category::Category;
use crate::analysis::export::export_stats_csv;
use crate::cli::output::Output;
use crate::cli::{CacheCommands, Commands};
use crate::data::client::EntitySource;
use crate::research::chart::{ChartRenderer, TextChartRenderer};
use crate::research::orchestrator::RunStatus;
use crate::research::planner::TaskPlanner;
use crate::research::report::ReportBuilder;
use crate::types::{FetchOutcome, Result};
use crate::AppState;
use std::path::Path;

pub async fn dispatch(command: Commands, state: &AppState, output: &Output) -> Result<()> {
    match command {
        Commands::Research {
            goal,
            output: report_path,
            chart_dir,
            csv,
            transcript,
        } => {
            research(
                state,
                output,
                &goal,
                report_path.as_deref(),
                chart_dir.as_deref(),
                csv.as_deref(),
                transcript,
            )
            .await
        }
        Commands::Plan { goal } => {
            plan(state, output, &goal);
            Ok(())
        }
        Commands::Analyze {
            category,
            chart_dir,
            csv,
        } => analyze(state, output, &category, chart_dir.as_deref(), csv.as_deref()).await,
        Commands::Lookup { name } => {
            lookup(state, output, &name).await;
            Ok(())
        }
        Commands::Cache(CacheCommands::Stats) => {
            cache_stats(state, output);
            Ok(())
        }
        Commands::Cache(CacheCommands::Clear) => {
            state.cache.clear()?;
            output.success("Cache cleared");
            Ok(())
        }
    }
}

pub async fn research(
    state: &AppState,
    output: &Output,
    goal: &str,
    report_path: Option<&Path>,
    chart_dir: Option<&Path>,
    csv: Option<&Path>,
    show_transcript: bool,
) -> Result<()> {
    output.info(&format!("Researching: {}", goal));

    let outcome = state.orchestrator().run(goal).await;

    match outcome.status {
        RunStatus::Completed => output.success(&format!(
            "Research completed in {} rounds",
            outcome.transcript.len()
        )),
        RunStatus::Partial { reason } => {
            output.warning(&format!("Research incomplete: {}", reason))
        }
    }

    let report = outcome.final_report();
    match report_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &report)?;
            output.created("report", &path.display().to_string());
        }
        None => output.result(&report),
    }

    if let Some(analysis) = &outcome.analysis {
        write_artifacts(output, analysis, chart_dir, csv);
    }

    if show_transcript {
        output.header("Transcript");
        eprint!("{}", outcome.transcript.render_text());
    }

    Ok(())
}

pub fn plan(state: &AppState, output: &Output, goal: &str) {
    let plan = TaskPlanner::new(state.config.analysis.sample_bound).create_plan(goal);
    output.result(&plan.to_string());
}

pub async fn analyze(
    state: &AppState,
    output: &Output,
    category: &str,
    chart_dir: Option<&Path>,
    csv: Option<&Path>,
) -> Result<()> {
    let category: Category = category.parse()?;
    let sample_bound = state.config.analysis.sample_bound;

    output.info(&format!(
        "Analyzing up to {} {}-type Pokémon",
        sample_bound,
        category.title()
    ));

    let analysis = state
        .aggregation
        .analyze_category_detailed(category, sample_bound)
        .await;

    let plan = TaskPlanner::new(sample_bound).create_plan(&format!("{} weaknesses", category));
    output.result(&ReportBuilder::new().build_report(&plan, &analysis.result));

    write_artifacts(output, &analysis, chart_dir, csv);
    Ok(())
}

pub async fn lookup(state: &AppState, output: &Output, name: &str) {
    match state.client.fetch_entity(name).await {
        FetchOutcome::Found(record) => {
            let mut fields = vec![("types", record.types.join(", "))];
            fields.extend(
                crate::types::BaseStats::NAMES
                    .iter()
                    .zip(record.stats.values())
                    .map(|(stat, value)| (*stat, value.to_string())),
            );
            fields.push(("total", record.stats.total().to_string()));
            fields.push(("weaknesses", join(&record.weaknesses)));
            fields.push(("resistances", join(&record.resistances)));
            output.result(&render_fields(&record.name, &fields));
        }
        FetchOutcome::NotFound => output.warning(&format!("No Pokémon named '{}'", name)),
        FetchOutcome::TransientFailure {
            attempts,
            last_error,
        } => output.warning(&format!(
            "Could not reach the data source after {} attempts: {}",
            attempts, last_error
        )),
    }
}

pub fn cache_stats(state: &AppState, output: &Output) {
    let stats = state.cache.stats();
    let mut fields = vec![("enabled", state.cache.is_enabled().to_string())];
    if state.cache.is_enabled() && state.config.cache.persist {
        fields.push(("directory", state.config.cache.directory.display().to_string()));
    }
    fields.push(("entries", stats.entries.to_string()));
    fields.push(("hits", stats.hits.to_string()));
    fields.push(("misses", stats.misses.to_string()));
    fields.push(("corrupt", stats.corrupt.to_string()));
    output.result(&render_fields("Entity cache", &fields));
}

/// Title line followed by indented `key: value` lines.
fn render_fields(title: &str, fields: &[(&str, String)]) -> String {
    let mut text = format!("{}\n", title);
    for (key, value) in fields {
        text.push_str(&format!("  {}: {}\n", key, value));
    }
    text
}

/// Write the optional chart and CSV. Failures are reported, not returned:
/// the report has already been delivered by the time this runs.
fn write_artifacts(
    output: &Output,
    analysis: &CategoryAnalysis,
    chart_dir: Option<&Path>,
    csv: Option<&Path>,
) {
    if let (Some(dir), Some(category)) = (chart_dir, analysis.result.category) {
        match TextChartRenderer::new(dir).render(category.as_str(), &analysis.result.percentages) {
            Ok(path) => output.created("chart", &path.display().to_string()),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Chart not written");
                output.warning(&format!("Could not write chart to {}: {}", dir.display(), e));
            }
        }
    }
    if let Some(path) = csv {
        match export_stats_csv(&analysis.records, path) {
            Ok(()) => output.created("csv", &path.display().to_string()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "CSV not written");
                output.warning(&format!("Could not write CSV to {}: {}", path.display(), e));
            }
        }
    }
}

fn join(set: &std::collections::BTreeSet<Category>) -> String {
    if set.is_empty() {
        return "(none)".to_string();
    }
    set.iter().map(Category::as_str).collect::<Vec<_>>().join(", ")
}
