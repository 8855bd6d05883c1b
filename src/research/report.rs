//! Markdown report rendering
//!
//! Section order is fixed. A section with nothing to say is left out rather
//! than rendered with an empty body.

use crate::analysis::aggregation::AggregationResult;
use crate::research::planner::TaskPlan;

pub const TITLE: &str = "# Pokémon Research Report";
pub const METHODOLOGY: &str =
    "Data collected via PokéAPI with statistical analysis performed on type effectiveness and base stats.";
pub const RECOMMENDATIONS: &str =
    "Based on the analysis, trainers should consider type coverage and defensive strategies when building teams.";

const STAT_LABELS: [&str; 6] = [
    "HP",
    "Attack",
    "Defense",
    "Special Attack",
    "Special Defense",
    "Speed",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render a complete report.
    pub fn build_report(&self, plan: &TaskPlan, result: &AggregationResult) -> String {
        let mut sections = vec![TITLE.to_string()];
        sections.extend(self.body(plan, result));
        sections.join("\n\n")
    }

    /// Render what exists when the run stopped early. Always states what was
    /// and was not analyzed.
    pub fn build_partial_report(
        &self,
        goal: &str,
        plan: Option<&TaskPlan>,
        result: Option<&AggregationResult>,
        reason: &str,
    ) -> String {
        let mut sections = vec![
            format!("{} (Partial)", TITLE),
            "## Status".to_string(),
            format!("Research stopped before completion: {}.", reason),
        ];

        match (plan, result) {
            (Some(plan), Some(result)) => sections.extend(self.body(plan, result)),
            (Some(plan), None) => {
                let target = match plan.goal_category {
                    Some(c) => format!("{}-type Pokémon", c.title()),
                    None => "the requested Pokémon".to_string(),
                };
                sections.push(format!(
                    "A research plan was created (\"{}\") but no data on {} was analyzed.",
                    plan.objective, target
                ));
            }
            (None, _) => {
                sections.push(format!(
                    "No research plan was produced for \"{}\"; nothing was analyzed.",
                    goal.trim()
                ));
            }
        }

        sections.join("\n\n")
    }

    fn body(&self, plan: &TaskPlan, result: &AggregationResult) -> Vec<String> {
        let mut sections = Vec::new();

        sections.push("## Executive Summary".to_string());
        sections.push(self.summary(plan, result));

        sections.push("## Methodology".to_string());
        sections.push(METHODOLOGY.to_string());

        sections.push("## Key Findings".to_string());
        sections.push(self.findings(result));

        if let Some(averages) = &result.average_stats {
            sections.push("## Base Stat Averages".to_string());
            sections.push(
                STAT_LABELS
                    .iter()
                    .zip(averages.values())
                    .map(|(label, v)| format!("- {}: {:.1}", label, v))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        if !result.skipped.is_empty() {
            sections.push("## Coverage".to_string());
            sections.push(format!(
                "- Analyzed {} of {} sampled identifiers ({} category members reported)\n- Not analyzed: {}",
                result.count,
                result.requested,
                result.members_total,
                result.skipped.join(", ")
            ));
        }

        sections.push("## Strategic Recommendations".to_string());
        sections.push(RECOMMENDATIONS.to_string());

        sections
    }

    fn summary(&self, plan: &TaskPlan, result: &AggregationResult) -> String {
        match result.category {
            Some(category) if result.has_data() => format!(
                "Analysis of {} {}-type Pokémon reveals significant strategic insights.",
                result.count,
                category.title()
            ),
            Some(category) => format!(
                "No data was available for {}-type Pokémon, so no statistics could be computed.",
                category.title()
            ),
            None => format!(
                "No Pokémon category could be identified in \"{}\", so no statistics could be computed.",
                plan.goal.trim()
            ),
        }
    }

    fn findings(&self, result: &AggregationResult) -> String {
        let mut lines = vec![format!("- Analyzed {} Pokémon specimens", result.count)];

        if let Some(highest) = &result.highest {
            lines.push(format!(
                "- Most common weakness: {} type ({:.1}% of analyzed Pokémon)",
                highest.category.title(),
                highest.percentage
            ));
        }

        let sorted = result.sorted_by_percentage();
        if !sorted.is_empty() {
            lines.push("- Weakness distribution:".to_string());
            for share in sorted {
                lines.push(format!(
                    "  - {}: {:.1}%",
                    share.category.title(),
                    share.percentage
                ));
            }
        }

        lines.join("\n")
    }
}
