//! Turn log of a research run.

use crate::analysis::aggregation::CategoryAnalysis;
use crate::research::planner::TaskPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Planner,
    Collector,
    Reporter,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Planner => "planner",
            RoleKind::Collector => "collector",
            RoleKind::Reporter => "reporter",
        }
    }

    /// Name the role speaks under in narration.
    pub fn persona(&self) -> &'static str {
        match self {
            RoleKind::Planner => "Professor Oak",
            RoleKind::Collector => "Researcher",
            RoleKind::Reporter => "Reporter",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a turn produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TurnPayload {
    Plan(TaskPlan),
    Analysis(CategoryAnalysis),
    Report(String),
    /// The role made no progress this round
    Stalled(String),
}

impl TurnPayload {
    pub fn is_progress(&self) -> bool {
        !matches!(self, TurnPayload::Stalled(_))
    }

    /// One-line description for logs and narration prompts.
    pub fn summary(&self) -> String {
        match self {
            TurnPayload::Plan(plan) => match plan.goal_category {
                Some(c) => format!("created plan ({}): {}", c, plan.objective),
                None => format!("created plan: {}", plan.objective),
            },
            TurnPayload::Analysis(analysis) => match (analysis.result.category, &analysis.result.highest) {
                (Some(c), Some(h)) => format!(
                    "analyzed {} {} entities; most common weakness {} ({:.1}%)",
                    analysis.result.count, c, h.category, h.percentage
                ),
                (Some(c), None) => format!("analyzed {} {} entities", analysis.result.count, c),
                (None, _) => "no category to analyze".to_string(),
            },
            TurnPayload::Report(text) => format!("wrote report ({} lines)", text.lines().count()),
            TurnPayload::Stalled(reason) => format!("no progress: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based
    pub round: usize,
    pub role: RoleKind,
    pub payload: TurnPayload,
    /// Narrator utterance, if a narrator is attached
    pub commentary: Option<String>,
    pub at: DateTime<Utc>,
}

/// Append-only, owned by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<TurnRecord>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: TurnRecord) {
        self.turns.push(record);
    }

    pub(crate) fn set_commentary(&mut self, commentary: String) {
        if let Some(last) = self.turns.last_mut() {
            last.commentary = Some(commentary);
        }
    }

    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&TurnRecord> {
        self.turns.last()
    }

    /// Plain-text log, one line per turn (plus commentary lines).
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            out.push_str(&format!(
                "[round {}] {}: {}\n",
                turn.round,
                turn.role.persona(),
                turn.payload.summary()
            ));
            if let Some(commentary) = &turn.commentary {
                out.push_str(&format!("    \"{}\"\n", commentary.trim()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::category::Category;

    fn turn(round: usize, role: RoleKind, payload: TurnPayload) -> TurnRecord {
        TurnRecord {
            round,
            role,
            payload,
            commentary: None,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_render_text() {
        let mut transcript = Transcript::new();
        transcript.push(turn(
            1,
            RoleKind::Collector,
            TurnPayload::Analysis(CategoryAnalysis::empty(Some(Category::Fire))),
        ));
        transcript.set_commentary("Nothing to see here.".to_string());
        transcript.push(turn(2, RoleKind::Reporter, TurnPayload::Stalled("waiting".to_string())));

        let text = transcript.render_text();
        assert_eq!(
            text,
            "[round 1] Researcher: analyzed 0 fire entities\n    \"Nothing to see here.\"\n[round 2] Reporter: no progress: waiting\n"
        );
    }

    #[test]
    fn test_stalled_is_not_progress() {
        assert!(!TurnPayload::Stalled("x".into()).is_progress());
        assert!(TurnPayload::Report("x".into()).is_progress());
    }

    #[test]
    fn test_payload_serializes_tagged() {
        let value = serde_json::to_value(TurnPayload::Report("# R".into())).unwrap();
        assert_eq!(value["type"], "report");
        assert_eq!(value["data"], "# R");
    }
}
