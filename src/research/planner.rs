//! Goal decomposition
//!
//! [`TaskPlanner`] turns a free-text goal into a [`TaskPlan`] by keyword
//! matching. Matching is word-based over the lowercased goal, so `Water-type`
//! matches `water` and `firefly` matches nothing.

use crate::analysis::aggregation::DEFAULT_SAMPLE_BOUND;
use crate::analysis::category::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Word prefixes that mark a goal as being about weaknesses or defense.
const DEFENSE_PREFIXES: [&str; 5] = ["weak", "defen", "resist", "vulnerab", "counter"];

/// Expected output identifiers
pub mod outputs {
    pub const WEAKNESS_DISTRIBUTION: &str = "weakness_distribution";
    pub const STAT_AVERAGES: &str = "stat_averages";
    pub const WEAKNESS_CHART: &str = "weakness_chart";
    pub const REPORT: &str = "report";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanKind {
    /// Weakness analysis of one category
    CategoryAnalysis { category: Category },
    Generic,
}

/// Structured research plan. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPlan {
    pub goal: String,
    pub kind: PlanKind,
    pub objective: String,
    /// Category the collector should analyze, if any
    pub goal_category: Option<Category>,
    pub methodology: Vec<String>,
    pub expected_outputs: Vec<String>,
    pub collaborators: Vec<String>,
    pub success_criteria: Vec<String>,
}

impl TaskPlan {
    pub fn expects(&self, output: &str) -> bool {
        self.expected_outputs.iter().any(|o| o == output)
    }
}

impl fmt::Display for TaskPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Objective: {}", self.objective)?;
        match self.goal_category {
            Some(category) => writeln!(f, "Category: {}", category)?,
            None => writeln!(f, "Category: (none)")?,
        }

        let sections = [
            ("Methodology", &self.methodology),
            ("Expected outputs", &self.expected_outputs),
            ("Collaborators", &self.collaborators),
            ("Success criteria", &self.success_criteria),
        ];
        for (title, items) in sections {
            writeln!(f, "\n{}:", title)?;
            for (i, item) in items.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, item)?;
            }
        }
        Ok(())
    }
}

/// Deterministic keyword planner. No I/O.
#[derive(Debug, Clone)]
pub struct TaskPlanner {
    sample_bound: usize,
    collaborators: Vec<String>,
}

impl Default for TaskPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_BOUND)
    }
}

impl TaskPlanner {
    pub fn new(sample_bound: usize) -> Self {
        Self {
            sample_bound,
            collaborators: vec![
                "planner".to_string(),
                "collector".to_string(),
                "reporter".to_string(),
            ],
        }
    }

    /// First category named in `goal`, scanning categories in enumeration order.
    pub fn match_category(goal: &str) -> Option<Category> {
        let words = words(goal);
        Category::ALL
            .into_iter()
            .find(|c| words.iter().any(|w| w == c.as_str()))
    }

    pub fn mentions_defense(goal: &str) -> bool {
        words(goal)
            .iter()
            .any(|w| DEFENSE_PREFIXES.iter().any(|p| w.starts_with(p)))
    }

    pub fn create_plan(&self, goal: &str) -> TaskPlan {
        let category = Self::match_category(goal);
        let defense = Self::mentions_defense(goal);

        let plan = match category {
            Some(category) if defense => self.category_plan(goal, category),
            _ => self.generic_plan(goal, category),
        };

        tracing::info!(
            goal,
            kind = ?plan.kind,
            category = ?plan.goal_category,
            "Created research plan"
        );
        plan
    }

    fn category_plan(&self, goal: &str, category: Category) -> TaskPlan {
        let title = category.title();
        TaskPlan {
            goal: goal.to_string(),
            kind: PlanKind::CategoryAnalysis { category },
            objective: format!("Analyze {}-type Pokémon weaknesses and vulnerabilities", title),
            goal_category: Some(category),
            methodology: vec![
                format!("Fetch the list of all {}-type Pokémon", title),
                format!(
                    "Get detailed stats for up to {} {}-type Pokémon",
                    self.sample_bound, title
                ),
                "Derive type effectiveness for each sampled Pokémon".to_string(),
                "Calculate average base stats".to_string(),
                "Identify the most common weaknesses".to_string(),
                "Analyze defensive capabilities".to_string(),
            ],
            expected_outputs: vec![
                outputs::WEAKNESS_DISTRIBUTION.to_string(),
                outputs::STAT_AVERAGES.to_string(),
                outputs::WEAKNESS_CHART.to_string(),
                outputs::REPORT.to_string(),
            ],
            collaborators: self.collaborators.clone(),
            success_criteria: vec![
                format!(
                    "Complete data for at least {} {}-type Pokémon",
                    self.sample_bound, title
                ),
                "Clear identification of the top 3 weaknesses".to_string(),
                "Visual representation of the weakness distribution".to_string(),
                "Actionable strategic insights".to_string(),
            ],
        }
    }

    fn generic_plan(&self, goal: &str, category: Option<Category>) -> TaskPlan {
        TaskPlan {
            goal: goal.to_string(),
            kind: PlanKind::Generic,
            objective: format!("Research and analyze: {}", goal.trim()),
            goal_category: category,
            methodology: vec![
                "Collect relevant Pokémon data".to_string(),
                "Perform statistical analysis".to_string(),
            ],
            expected_outputs: vec![outputs::REPORT.to_string()],
            collaborators: self.collaborators.clone(),
            success_criteria: vec!["Complete analysis with insights".to_string()],
        }
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("analyze Water-type Pokémon defense stats", Some(Category::Water))]
    #[case("Analyze Fire-type Pokemon weaknesses", Some(Category::Fire))]
    #[case("What resists DRAGON moves?", Some(Category::Dragon))]
    #[case("fire and water weaknesses", Some(Category::Fire))]
    #[case("how strong is a firefly", None)]
    #[case("", None)]
    fn test_match_category(#[case] goal: &str, #[case] expected: Option<Category>) {
        assert_eq!(TaskPlanner::match_category(goal), expected);
    }

    #[rstest]
    #[case("Fire weaknesses", true)]
    #[case("defensive profile", true)]
    #[case("what are they vulnerable to", true)]
    #[case("average speed", false)]
    fn test_mentions_defense(#[case] goal: &str, #[case] expected: bool) {
        assert_eq!(TaskPlanner::mentions_defense(goal), expected);
    }

    #[test]
    fn test_water_defense_goal_selects_water_plan() {
        let plan = TaskPlanner::default().create_plan("analyze Water-type Pokémon defense stats");

        assert_eq!(plan.kind, PlanKind::CategoryAnalysis { category: Category::Water });
        assert_eq!(plan.goal_category, Some(Category::Water));
        assert!(plan.objective.contains("Water-type"));
        assert!(plan.expects(outputs::WEAKNESS_DISTRIBUTION));
        assert!(plan.expects(outputs::REPORT));
        assert!(plan.success_criteria[0].contains("at least 10"));
        assert_eq!(plan.collaborators, vec!["planner", "collector", "reporter"]);
    }

    #[test]
    fn test_category_without_defense_keyword_is_generic() {
        let plan = TaskPlanner::default().create_plan("average speed of electric pokemon");
        assert_eq!(plan.kind, PlanKind::Generic);
        assert_eq!(plan.goal_category, Some(Category::Electric));
        assert_eq!(plan.expected_outputs, vec![outputs::REPORT]);
    }

    #[test]
    fn test_unmatched_goal_is_generic_without_category() {
        let plan = TaskPlanner::default().create_plan("tell me about legendary birds");
        assert_eq!(plan.kind, PlanKind::Generic);
        assert_eq!(plan.goal_category, None);
        assert_eq!(plan.objective, "Research and analyze: tell me about legendary birds");
    }

    #[test]
    fn test_planner_is_deterministic() {
        let planner = TaskPlanner::new(5);
        let goal = "Ghost weaknesses";
        assert_eq!(planner.create_plan(goal), planner.create_plan(goal));
        assert!(planner.create_plan(goal).methodology[1].contains("up to 5"));
    }

    #[test]
    fn test_display_lists_sections() {
        let text = TaskPlanner::default().create_plan("ice weakness").to_string();
        assert!(text.starts_with("Objective: Analyze Ice-type"));
        assert!(text.contains("Category: ice"));
        assert!(text.contains("Success criteria:"));
        assert!(text.contains("  1. Fetch the list of all Ice-type Pokémon"));
    }
}
