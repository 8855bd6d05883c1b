//! Multi-role research coordination
//!
//! A research request flows through three roles in strict turn order:
//! - [`planner`] - turns the goal into a [`TaskPlan`](planner::TaskPlan)
//! - the collector - runs category aggregation for the plan
//! - [`report`] - renders the findings
//!
//! [`orchestrator::Orchestrator`] owns the turn loop and the [`transcript`].
//! [`narrator`] and [`chart`] are optional collaborators at the edges.
//!
//! # Usage
//!
//! ```ignore
//! use oak::research::orchestrator::Orchestrator;
//!
//! let orchestrator = Orchestrator::standard(engine, 10, &config.orchestrator);
//! let outcome = orchestrator.run("Analyze Fire-type Pokémon weaknesses").await;
//!
//! println!("{}", outcome.final_report());
//! ```

pub mod chart;
pub mod narrator;
pub mod orchestrator;
pub mod planner;
pub mod report;
pub mod transcript;

pub use orchestrator::{
    Blackboard, Orchestrator, PartialReason, Phase, ResearchOutcome, ResearchRole, RoleOutcome,
    RunStatus,
};
pub use planner::{PlanKind, TaskPlan, TaskPlanner};
pub use report::ReportBuilder;
pub use transcript::{RoleKind, Transcript, TurnPayload, TurnRecord};
