//! Address-space reconciliation between a recorded trace and a static model
//!
//! The same program occupies two address spaces at once: the one a real run
//! executed in, where the loader placed every position-independent image at
//! a randomized base, and the one the analysis engine built, where it chose
//! the bases itself. Per image, the two differ by a constant page-multiple
//! offset, the slide.
//!
//! ## Reconciliation Flow
//!
//! ```text
//! Trace + ImageMap + BlockLifter
//!        │
//!        ▼
//! resolve_all_slides()          once per session
//!   scanner  → candidate indices per entry address
//!   validator → indices whose recorded next step is legal
//!   resolver → intersect per-initializer slide sets, fill the table
//!        │
//!        ▼
//! SlideTable ──► to_model_address / to_trace_address   per query
//!        ▲
//!        └───── compare()       per lockstep step; may add entries for
//!                               images resolution could not establish
//! ```
//!
//! The slide table is the only mutable state. One session owns it for one
//! trace; callers needing shared access serialize externally.

mod compare;
mod resolver;
mod scanner;
mod translate;
mod validator;

pub use validator::{FarJumpPolicy, IndirectJumpPolicy};

use log::{debug, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::domain::Slide;
use crate::image::{ImageId, ImageMap};
use crate::lifter::BlockLifter;
use crate::trace::Trace;

/// Per-image slide table, the session's sole mutable state.
///
/// Entries are only ever added: resolution fills the table in one batch at
/// setup, and lockstep comparison may add entries for images resolution
/// left open. An established slide is never overwritten.
#[derive(Debug, Default)]
pub struct SlideTable {
    entries: HashMap<ImageId, Slide>,
}

impl SlideTable {
    #[must_use]
    pub fn get(&self, id: ImageId) -> Option<Slide> {
        self.entries.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: ImageId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, Slide)> + '_ {
        self.entries.iter().map(|(&id, &slide)| (id, slide))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a newly established slide. Repeated discoveries for the same
    /// image keep the first value.
    pub(crate) fn record(&mut self, id: ImageId, slide: Slide) {
        match self.entries.entry(id) {
            Entry::Vacant(vacant) => {
                debug!("recorded slide {slide} for image #{}", id.0);
                vacant.insert(slide);
            }
            Entry::Occupied(occupied) => {
                warn!(
                    "ignoring repeated slide discovery for image #{} (kept {}, saw {slide})",
                    id.0,
                    occupied.get()
                );
            }
        }
    }
}

/// One reconciliation session over a fixed trace and loader snapshot.
///
/// Both collaborators are passed in at construction so sessions are
/// independently testable and never consult process-wide state. Everything
/// here is synchronous and bounded; see the module docs for the flow.
pub struct ReconcileSession<'a> {
    trace: &'a Trace,
    images: &'a ImageMap,
    lifter: &'a dyn BlockLifter,
    policy: Box<dyn IndirectJumpPolicy>,
    slides: SlideTable,
}

impl<'a> ReconcileSession<'a> {
    #[must_use]
    pub fn new(trace: &'a Trace, images: &'a ImageMap, lifter: &'a dyn BlockLifter) -> Self {
        Self {
            trace,
            images,
            lifter,
            policy: Box::new(FarJumpPolicy::default()),
            slides: SlideTable::default(),
        }
    }

    /// Replace the indirect-jump fallback used during candidate validation.
    #[must_use]
    pub fn with_policy(mut self, policy: impl IndirectJumpPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// The loader snapshot this session reconciles against.
    #[must_use]
    pub fn images(&self) -> &ImageMap {
        self.images
    }

    /// Read-only view of the established slides.
    #[must_use]
    pub fn slides(&self) -> &SlideTable {
        &self.slides
    }

    fn image_name(&self, id: ImageId) -> String {
        self.images.get(id).name.clone()
    }
}
