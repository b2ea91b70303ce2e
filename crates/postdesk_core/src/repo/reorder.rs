//! Display-order swap protocol shared by every backend.
//!
//! # Responsibility
//! - Decide, from the current row and its neighbor, whether a move happens.
//! - Produce the two order assignments a backend applies in one transaction.
//! - Emit one log shape for reorder outcomes regardless of backend.
//!
//! # Invariants
//! - Neighbor selection is strict: a row tied with the current row is never
//!   its neighbor.
//! - Among several candidates at the neighbor's order, `Up` takes the
//!   highest id and `Down` the lowest id.
//! - A swap only exchanges the two rows' values; no other row changes.

use crate::config::RepositoryMode;
use crate::model::post::PostId;
use crate::repo::{RepoError, RepoResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Direction of a manual reorder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDirection {
    /// Toward smaller display order values.
    Up,
    /// Toward larger display order values.
    Down,
}

impl MoveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Whether `candidate` lies strictly on this direction's side of `anchor`.
    pub(crate) fn admits(self, anchor: i32, candidate: i32) -> bool {
        match self {
            Self::Up => candidate < anchor,
            Self::Down => candidate > anchor,
        }
    }
}

/// Identity and rank of one live row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OrderSlot {
    pub id: PostId,
    pub display_order: i32,
}

impl From<(PostId, i32)> for OrderSlot {
    fn from((id, display_order): (PostId, i32)) -> Self {
        Self { id, display_order }
    }
}

/// One `display_order` write of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OrderAssignment {
    pub id: PostId,
    pub display_order: i32,
}

/// Result of locating the rows a move needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReorderPlan {
    /// No live row has the requested id.
    Missing,
    /// The row is already first (`Up`) or last (`Down`).
    AtBoundary,
    Swap { current: OrderSlot, neighbor: OrderSlot },
}

impl ReorderPlan {
    /// Builds the plan from the located rows.
    ///
    /// Fails with `InvalidData` when the neighbor query returned a row on the
    /// wrong side of the current row.
    pub(crate) fn locate(
        direction: MoveDirection,
        current: Option<OrderSlot>,
        neighbor: Option<OrderSlot>,
    ) -> RepoResult<Self> {
        let Some(current) = current else {
            return Ok(Self::Missing);
        };
        let Some(neighbor) = neighbor else {
            return Ok(Self::AtBoundary);
        };
        if neighbor.id == current.id
            || !direction.admits(current.display_order, neighbor.display_order)
        {
            return Err(RepoError::InvalidData(format!(
                "neighbor {} (order {}) is not {} of post {} (order {})",
                neighbor.id,
                neighbor.display_order,
                direction.as_str(),
                current.id,
                current.display_order
            )));
        }
        Ok(Self::Swap { current, neighbor })
    }

    /// The two writes that exchange the rows' orders, current row first.
    pub(crate) fn assignments(&self) -> Option<[OrderAssignment; 2]> {
        match *self {
            Self::Swap { current, neighbor } => Some([
                OrderAssignment {
                    id: current.id,
                    display_order: neighbor.display_order,
                },
                OrderAssignment {
                    id: neighbor.id,
                    display_order: current.display_order,
                },
            ]),
            Self::Missing | Self::AtBoundary => None,
        }
    }

    fn noop_reason(&self) -> &'static str {
        match self {
            Self::Missing => "not_found",
            Self::AtBoundary => "at_boundary",
            Self::Swap { .. } => "none",
        }
    }
}

/// Fails the swap unless a write touched exactly one live row.
pub(crate) fn ensure_single_row(assignment: OrderAssignment, rows_affected: u64) -> RepoResult<()> {
    if rows_affected == 1 {
        Ok(())
    } else {
        Err(RepoError::SwapConflict(assignment.id))
    }
}

/// Logs a finished reorder attempt.
pub(crate) fn log_outcome(
    backend: RepositoryMode,
    id: PostId,
    direction: MoveDirection,
    outcome: &RepoResult<ReorderPlan>,
) {
    match outcome {
        Ok(ReorderPlan::Swap { neighbor, .. }) => {
            info!(
                "event=post_reorder module=repo backend={} status=ok id={} direction={} neighbor_id={}",
                backend.short_name(),
                id,
                direction.as_str(),
                neighbor.id
            );
        }
        Ok(plan) => debug!(
            "event=post_reorder module=repo backend={} status=noop id={} direction={} reason={}",
            backend.short_name(),
            id,
            direction.as_str(),
            plan.noop_reason()
        ),
        Err(err) => warn!(
            "event=post_reorder module=repo backend={} status=rolled_back id={} direction={} error={}",
            backend.short_name(),
            id,
            direction.as_str(),
            err
        ),
    }
}
