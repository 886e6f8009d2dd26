//! # Kirikae Core
//!
//! Episode resolution and transactional renaming for TV media libraries.
//! Resolves ambiguous (often anthology) filenames to concrete episodes or
//! episode spans, plans destination paths with conflict detection, and moves
//! files with hash verification, rollback and undo.
//!
//! ## Quick Start
//!
//! ```rust
//! use kirikae_core::oracle::FixedEpisodeList;
//! use kirikae_core::plan::{PlanBuilder, PlexRuleSet};
//! use kirikae_core::{EpisodeCandidate, MediaFile, MediaType, PlanStatus, RuleSetConfig};
//!
//! let rules = PlexRuleSet::new().unwrap();
//! let config = RuleSetConfig::new().with_anthology(true);
//! let mut oracle = FixedEpisodeList::new(vec![
//!     EpisodeCandidate::new(1, 5, "Pups and the Kitty-tastrophe"),
//!     EpisodeCandidate::new(1, 6, "Pups Save a Train"),
//! ]);
//!
//! let mut builder = PlanBuilder::new(&rules, &config, &mut oracle).unwrap();
//! let plan = builder
//!     .build(
//!         "/media",
//!         vec![MediaFile::new(
//!             "/media/Paw Patrol-S01E01-Pups And The Kitty Tastrophe Pups Save A Train.mp4",
//!             MediaType::Tv,
//!         )],
//!     )
//!     .unwrap();
//!
//! assert_eq!(plan.items[0].status, PlanStatus::Pending);
//! assert_eq!(plan.items[0].episode.as_deref(), Some("05-E06"));
//! ```
pub mod apply;
pub mod confidence;
pub mod config;
pub mod error;
pub mod fs;
pub mod matching;
pub mod oracle;
pub mod plan;
pub mod resolver;
pub mod types;

// Re-export primary API
pub use apply::{ApplyFailure, ApplyResult, UndoReport, apply_plan, undo_plan};
pub use config::{ApplyOptions, MatcherConfig, RuleSetConfig};
pub use error::{KirikaeError, Result};
pub use oracle::{ConfidenceOracle, EpisodeOracle, OracleVerdict};
pub use plan::{PlanBuilder, PlexRuleSet, RuleSet, load_plan, save_plan};
pub use types::{
    Assignment, EpisodeCandidate, EpisodeSpan, ManualReason, MediaFile, MediaType, PlanItem,
    PlanStatus, RenamePlan, Resolution,
};
