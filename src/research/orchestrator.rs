//! Research orchestration
//!
//! A sequential state machine over three roles:
//!
//! ```text
//! Planning --plan--> Collecting --analysis--> Reporting --report--> Done
//! ```
//!
//! Each round invokes exactly one role, the one owning the current phase.
//! The run always ends with a [`ResearchOutcome`]; hitting the round ceiling
//! or the consecutive no-progress ceiling yields a partial outcome instead of
//! an error.

use crate::analysis::aggregation::{AggregationEngine, CategoryAnalysis};
use crate::research::narrator::Narrator;
use crate::research::planner::{TaskPlan, TaskPlanner};
use crate::research::report::ReportBuilder;
use crate::research::transcript::{RoleKind, Transcript, TurnPayload, TurnRecord};
use crate::types::Result;
use crate::utils::config::OrchestratorConfig;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Planning,
    Collecting,
    Reporting,
    Done,
}

impl Phase {
    /// Role that acts in this phase. `None` once done.
    pub fn role(&self) -> Option<RoleKind> {
        match self {
            Phase::Planning => Some(RoleKind::Planner),
            Phase::Collecting => Some(RoleKind::Collector),
            Phase::Reporting => Some(RoleKind::Reporter),
            Phase::Done => None,
        }
    }
}

/// Shared, read-only view of the run handed to each role.
#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    pub goal: String,
    pub plan: Option<TaskPlan>,
    pub analysis: Option<CategoryAnalysis>,
    pub report: Option<String>,
}

impl Blackboard {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Default::default()
        }
    }
}

/// Result of one role invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleOutcome {
    Produced(TurnPayload),
    /// Not ready; the reason is recorded in the transcript
    Pending(String),
}

#[async_trait]
pub trait ResearchRole: Send + Sync {
    fn kind(&self) -> RoleKind;

    async fn act(&self, board: &Blackboard) -> Result<RoleOutcome>;
}

// ============= Standard Roles =============

pub struct PlannerRole {
    planner: TaskPlanner,
}

impl PlannerRole {
    pub fn new(planner: TaskPlanner) -> Self {
        Self { planner }
    }
}

#[async_trait]
impl ResearchRole for PlannerRole {
    fn kind(&self) -> RoleKind {
        RoleKind::Planner
    }

    async fn act(&self, board: &Blackboard) -> Result<RoleOutcome> {
        Ok(RoleOutcome::Produced(TurnPayload::Plan(
            self.planner.create_plan(&board.goal),
        )))
    }
}

pub struct CollectorRole {
    engine: Arc<AggregationEngine>,
    sample_bound: usize,
}

impl CollectorRole {
    pub fn new(engine: Arc<AggregationEngine>, sample_bound: usize) -> Self {
        Self {
            engine,
            sample_bound,
        }
    }
}

#[async_trait]
impl ResearchRole for CollectorRole {
    fn kind(&self) -> RoleKind {
        RoleKind::Collector
    }

    async fn act(&self, board: &Blackboard) -> Result<RoleOutcome> {
        let Some(plan) = &board.plan else {
            return Ok(RoleOutcome::Pending("no plan to collect for".to_string()));
        };

        let analysis = match plan.goal_category {
            Some(category) => {
                self.engine
                    .analyze_category_detailed(category, self.sample_bound)
                    .await
            }
            None => {
                tracing::info!("Plan names no category; collecting nothing");
                CategoryAnalysis::empty(None)
            }
        };

        Ok(RoleOutcome::Produced(TurnPayload::Analysis(analysis)))
    }
}

#[derive(Default)]
pub struct ReporterRole {
    builder: ReportBuilder,
}

impl ReporterRole {
    pub fn new(builder: ReportBuilder) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl ResearchRole for ReporterRole {
    fn kind(&self) -> RoleKind {
        RoleKind::Reporter
    }

    async fn act(&self, board: &Blackboard) -> Result<RoleOutcome> {
        match (&board.plan, &board.analysis) {
            (Some(plan), Some(analysis)) => Ok(RoleOutcome::Produced(TurnPayload::Report(
                self.builder.build_report(plan, &analysis.result),
            ))),
            _ => Ok(RoleOutcome::Pending("nothing to report yet".to_string())),
        }
    }
}

// ============= Outcome =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReason {
    RoundLimit,
    NoProgressLimit,
}

impl fmt::Display for PartialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialReason::RoundLimit => f.write_str("round limit reached"),
            PartialReason::NoProgressLimit => f.write_str("too many rounds without progress"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Partial { reason: PartialReason },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub run_id: Uuid,
    pub goal: String,
    pub status: RunStatus,
    pub plan: Option<TaskPlan>,
    pub analysis: Option<CategoryAnalysis>,
    pub report: Option<String>,
    pub transcript: Transcript,
}

impl ResearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Produced report, or a partial one describing what was reached.
    pub fn final_report(&self) -> String {
        match (&self.status, &self.report) {
            (RunStatus::Completed, Some(report)) => report.clone(),
            (RunStatus::Partial { reason }, _) => ReportBuilder::new().build_partial_report(
                &self.goal,
                self.plan.as_ref(),
                self.analysis.as_ref().map(|a| &a.result),
                &reason.to_string(),
            ),
            (RunStatus::Completed, None) => ReportBuilder::new().build_partial_report(
                &self.goal,
                self.plan.as_ref(),
                self.analysis.as_ref().map(|a| &a.result),
                "no report was produced",
            ),
        }
    }
}

// ============= Orchestrator =============

pub struct Orchestrator {
    planner: Box<dyn ResearchRole>,
    collector: Box<dyn ResearchRole>,
    reporter: Box<dyn ResearchRole>,
    narrator: Option<Arc<dyn Narrator>>,
    max_rounds: usize,
    max_no_progress: usize,
}

impl Orchestrator {
    pub fn new(
        planner: Box<dyn ResearchRole>,
        collector: Box<dyn ResearchRole>,
        reporter: Box<dyn ResearchRole>,
        limits: &OrchestratorConfig,
    ) -> Self {
        Self {
            planner,
            collector,
            reporter,
            narrator: None,
            max_rounds: limits.max_rounds,
            max_no_progress: limits.max_no_progress.max(1),
        }
    }

    /// Planner, collector and reporter wired to the given engine.
    pub fn standard(
        engine: Arc<AggregationEngine>,
        sample_bound: usize,
        limits: &OrchestratorConfig,
    ) -> Self {
        Self::new(
            Box::new(PlannerRole::new(TaskPlanner::new(sample_bound))),
            Box::new(CollectorRole::new(engine, sample_bound)),
            Box::new(ReporterRole::default()),
            limits,
        )
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    fn role(&self, kind: RoleKind) -> &dyn ResearchRole {
        match kind {
            RoleKind::Planner => self.planner.as_ref(),
            RoleKind::Collector => self.collector.as_ref(),
            RoleKind::Reporter => self.reporter.as_ref(),
        }
    }

    /// Drive the run to completion or to a limit. Never fails.
    pub async fn run(&self, goal: &str) -> ResearchOutcome {
        let run_id = Uuid::new_v4();
        let mut board = Blackboard::new(goal);
        let mut transcript = Transcript::new();
        let mut phase = Phase::Planning;
        let mut rounds = 0;
        let mut no_progress = 0;

        tracing::info!(%run_id, goal, max_rounds = self.max_rounds, "Starting research");

        let status = loop {
            let Some(kind) = phase.role() else {
                break RunStatus::Completed;
            };
            if rounds >= self.max_rounds {
                tracing::warn!(rounds, ?phase, "Round limit reached");
                break RunStatus::Partial {
                    reason: PartialReason::RoundLimit,
                };
            }
            if no_progress >= self.max_no_progress {
                tracing::warn!(rounds, ?phase, no_progress, "No-progress limit reached");
                break RunStatus::Partial {
                    reason: PartialReason::NoProgressLimit,
                };
            }

            rounds += 1;
            let role = self.role(kind);
            tracing::info!(round = rounds, max_rounds = self.max_rounds, role = %role.kind(), "Research round");

            let payload = match role.act(&board).await {
                Ok(RoleOutcome::Produced(payload)) => payload,
                Ok(RoleOutcome::Pending(reason)) => TurnPayload::Stalled(reason),
                Err(e) => {
                    tracing::warn!(round = rounds, role = %kind, error = %e, "Role failed");
                    TurnPayload::Stalled(format!("error: {}", e))
                }
            };

            let payload = match (phase, payload) {
                (Phase::Planning, TurnPayload::Plan(plan)) => {
                    board.plan = Some(plan.clone());
                    phase = Phase::Collecting;
                    TurnPayload::Plan(plan)
                }
                (Phase::Collecting, TurnPayload::Analysis(analysis)) => {
                    board.analysis = Some(analysis.clone());
                    phase = Phase::Reporting;
                    TurnPayload::Analysis(analysis)
                }
                (Phase::Reporting, TurnPayload::Report(report)) => {
                    board.report = Some(report.clone());
                    phase = Phase::Done;
                    TurnPayload::Report(report)
                }
                (_, TurnPayload::Stalled(reason)) => TurnPayload::Stalled(reason),
                (phase, other) => TurnPayload::Stalled(format!(
                    "{} produced {} output during {:?}",
                    kind,
                    payload_name(&other),
                    phase
                )),
            };

            let progressed = payload.is_progress();
            if progressed {
                no_progress = 0;
            } else {
                no_progress += 1;
                tracing::warn!(round = rounds, role = %kind, no_progress, "{}", payload.summary());
            }

            transcript.push(TurnRecord {
                round: rounds,
                role: kind,
                payload,
                commentary: None,
                at: Utc::now(),
            });

            if progressed {
                if let Some(narrator) = &self.narrator {
                    match narrator.narrate(goal, kind, &transcript).await {
                        Ok(text) => transcript.set_commentary(text),
                        Err(e) => tracing::warn!(role = %kind, error = %e, "Narration failed"),
                    }
                }
            }
        };

        tracing::info!(%run_id, rounds, ?status, turns = transcript.len(), "Research finished");

        ResearchOutcome {
            run_id,
            goal: goal.to_string(),
            status,
            plan: board.plan,
            analysis: board.analysis,
            report: board.report,
            transcript,
        }
    }
}

fn payload_name(payload: &TurnPayload) -> &'static str {
    match payload {
        TurnPayload::Plan(_) => "plan",
        TurnPayload::Analysis(_) => "analysis",
        TurnPayload::Report(_) => "report",
        TurnPayload::Stalled(_) => "stalled",
    }
}
