pub mod episode;
pub mod media;
pub mod plan;
pub mod resolution;

pub use episode::{EpisodeCandidate, EpisodeSpan, normalize_episode_list};
pub use media::{MediaFile, MediaType};
pub use plan::{PlanItem, PlanStatus, RenamePlan};
pub use resolution::{Assignment, ManualReason, Resolution};
