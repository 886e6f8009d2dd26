//! # Confidence Routing
//!
//! Maps an oracle's scalar confidence to the status a plan item starts in.

use crate::types::PlanStatus;

/// At or above this confidence an item is accepted automatically.
pub const AUTO_THRESHOLD: f32 = 0.75;

/// At or above this confidence (and below [`AUTO_THRESHOLD`]) an item needs review.
pub const MANUAL_THRESHOLD: f32 = 0.40;

/// Routes a confidence in `[0.0, 1.0]` to a plan status.
///
/// `NaN` routes to `Failed`.
///
/// ```rust
/// use kirikae_core::confidence::route;
/// use kirikae_core::PlanStatus;
///
/// assert_eq!(route(0.85), PlanStatus::Pending);
/// assert_eq!(route(0.60), PlanStatus::Manual);
/// assert_eq!(route(0.30), PlanStatus::Failed);
/// ```
#[must_use]
pub fn route(confidence: f32) -> PlanStatus {
    if confidence >= AUTO_THRESHOLD {
        PlanStatus::Pending
    } else if confidence >= MANUAL_THRESHOLD {
        PlanStatus::Manual
    } else {
        PlanStatus::Failed
    }
}
