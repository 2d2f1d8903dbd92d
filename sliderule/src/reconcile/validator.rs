//! Candidate validation against the lifter's successor sets
//!
//! A page-congruent index is only evidence of an entry if the step recorded
//! right after it is one the block could legally take. When the lifter knows
//! the block's direct successors, the check is exact. When it does not (the
//! block ends in an indirect transfer), validation falls back to a
//! distance heuristic: an indirect jump taken at the first block of an
//! initializer usually signifies a call into a different binary. That
//! fallback is imprecise on both sides, which the resolver's intersection
//! strategy is built to tolerate.

use crate::domain::Slide;
use crate::lifter::BlockLifter;
use crate::trace::Trace;

/// Policy deciding whether a control transfer with no statically known
/// successors plausibly left the current image.
///
/// Exposed as a trait so callers with stricter evidence requirements can
/// substitute their own rule without touching the search.
pub trait IndirectJumpPolicy {
    fn plausibly_left_image(&self, from: u64, to: u64) -> bool;
}

/// Default policy: the transfer left the image if it landed more than
/// `min_gap` bytes away.
#[derive(Debug, Clone, Copy)]
pub struct FarJumpPolicy {
    pub min_gap: u64,
}

impl Default for FarJumpPolicy {
    fn default() -> Self {
        // One page. Short indirect hops stay inside an image often enough
        // that anything nearer is treated as inconclusive.
        Self { min_gap: 0x1000 }
    }
}

impl IndirectJumpPolicy for FarJumpPolicy {
    fn plausibly_left_image(&self, from: u64, to: u64) -> bool {
        from.abs_diff(to) > self.min_gap
    }
}

/// Check whether candidate index `idx` is consistent with `model_addr`
/// being the entry executed there, under the slide the pair implies.
///
/// A candidate at the final trace index has no recorded next step and can
/// never be confirmed.
pub(crate) fn validate(
    trace: &Trace,
    lifter: &dyn BlockLifter,
    policy: &dyn IndirectJumpPolicy,
    model_addr: u64,
    idx: usize,
) -> bool {
    let Some(observed) = trace.get(idx) else {
        return false;
    };
    let Some(next) = trace.get(idx + 1) else {
        return false;
    };

    let slide = Slide::from_delta(observed, model_addr);
    let successors = lifter.direct_successors(model_addr);
    if successors.is_empty() {
        policy.plausibly_left_image(observed, next)
    } else {
        successors.into_iter().any(|target| slide.to_trace(target) == next)
    }
}
