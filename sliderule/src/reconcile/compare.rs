//! Lockstep comparison of trace and model positions
//!
//! During trace-guided replay the driver walks both address spaces step by
//! step and asks, at every transfer, whether they still agree. For images
//! whose slide resolution could not establish ahead of time (late-loaded
//! libraries, the extern object once it acquires real backing), the first
//! page-aligned agreement is taken as the slide, so translation starts
//! working for them mid-replay.

use log::info;

use super::ReconcileSession;
use crate::domain::{page_congruent, ReconcileError, Slide};

impl ReconcileSession<'_> {
    /// Check whether a trace-space position and a model-space position name
    /// the same instruction.
    ///
    /// Addresses owned by the extern/kernel bookkeeping objects never
    /// match; they are not backed by real loaded code. For an image with an
    /// established slide this is a pure equality check. For an unresolved
    /// image a page-aligned delta is recorded as its slide (one time only)
    /// and counts as a match.
    ///
    /// # Errors
    /// `TraceDesync` when the positions disagree inside a known image,
    /// `TraceDesyncUnmapped` when no image owns `model_addr` at all. Both
    /// are fatal to the replay session: later trace positions are
    /// meaningless without knowing the true divergence point.
    pub fn compare(&mut self, trace_addr: u64, model_addr: u64) -> Result<bool, ReconcileError> {
        let Some(id) = self.images.find_containing(model_addr) else {
            return Err(ReconcileError::TraceDesyncUnmapped { addr: model_addr });
        };

        let image = self.images.get(id);
        if image.is_pseudo() {
            return Ok(false);
        }

        if let Some(slide) = self.slides.get(id) {
            return Ok(trace_addr == slide.to_trace(model_addr));
        }

        if page_congruent(trace_addr, model_addr) {
            let slide = Slide::from_delta(trace_addr, model_addr);
            info!("discovered slide {slide} for {image} during lockstep replay");
            self.slides.record(id, slide);
            return Ok(true);
        }

        Err(ReconcileError::TraceDesync { image: image.name.clone() })
    }
}
