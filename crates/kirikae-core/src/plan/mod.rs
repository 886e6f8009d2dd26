//! # Rename Plans
//!
//! Turning scanned files into an ordered, persisted list of moves: the
//! platform [`RuleSet`], destination conflict detection, the
//! [`PlanBuilder`] and JSON persistence.

pub mod builder;
pub mod conflict;
pub mod rules;
pub mod store;

pub use builder::PlanBuilder;
pub use conflict::{CONFLICT_REASON, DestinationIndex, destination_key, sweep_conflicts};
pub use rules::{PlexRuleSet, RuleSet};
pub use store::{load_plan, plan_file_name, save_plan, write_plan};
