//! Slide resolution
//!
//! Runs once per session, before any translation. Non-relocatable and
//! pinned images resolve to a zero slide without touching the trace. For
//! everything else the resolver searches the trace for each entry address
//! the loader guarantees ran (initializers, plus the entry point of the
//! main image) and intersects the per-entry candidate slides down to one
//! value. Anything other than exactly one surviving candidate is an error
//! the caller has to see, because a guessed slide silently desynchronizes
//! every later translation.

use log::{debug, info};
use std::collections::BTreeSet;

use super::{scanner, validator, ReconcileSession};
use crate::domain::{ReconcileError, Slide};
use crate::image::Image;

/// Starting jump-width threshold for candidate scanning (256 KiB). Wide
/// enough that the well-isolated transfers of dynamic-linker and
/// initializer calls pass on the first attempt.
const SCAN_THRESHOLD_START: u64 = 0x4_0000;

/// Scanning gives up once halving has pushed the threshold down here.
/// Below ~8 KiB the "wide jump" signal drowns in ordinary control flow.
const SCAN_THRESHOLD_FLOOR: u64 = 0x2000;

impl ReconcileSession<'_> {
    /// Establish a slide for every image the trace gives evidence about.
    ///
    /// Images with no entry addresses to search for are left out of the
    /// table (lockstep comparison may still resolve them later).
    ///
    /// # Errors
    /// `AmbiguousOrAbsentTrace` when no candidate slide survives for a
    /// relocatable image, `AmbiguousSlide` when more than one does. The
    /// first failing image aborts resolution; earlier images keep their
    /// entries for diagnostics.
    pub fn resolve_all_slides(&mut self) -> Result<(), ReconcileError> {
        for (id, image) in self.images.iter() {
            // The loader's bookkeeping objects hold no real code to search for.
            if image.is_pseudo() {
                continue;
            }

            // Non-relocatable objects load where they were linked.
            if !image.position_independent {
                self.slides.record(id, Slide::ZERO);
                continue;
            }

            // Objects placed at a caller-chosen base are assumed to sit at
            // the address the trace shows.
            if image.pinned_base {
                info!("assuming {image} is loaded at the address the trace observed");
                self.slides.record(id, Slide::ZERO);
                continue;
            }

            let mut possibilities: Option<BTreeSet<Slide>> = None;
            for entry in entry_addresses(image) {
                let slides = self.locate_entry_slides(entry);
                debug!("{image}: entry {entry:#x} is consistent with {} slide(s)", slides.len());
                possibilities = Some(match possibilities {
                    None => slides,
                    Some(narrowed) => narrowed.intersection(&slides).copied().collect(),
                });
            }

            match possibilities {
                // Nothing to search for; leave the image unresolved.
                None => debug!("{image} has no entry addresses; leaving it unresolved"),
                Some(candidates) => {
                    let candidates: Vec<Slide> = candidates.into_iter().collect();
                    match candidates.as_slice() {
                        [] => {
                            return Err(ReconcileError::AmbiguousOrAbsentTrace {
                                image: image.name.clone(),
                            })
                        }
                        &[slide] => {
                            info!("{image} slides by {slide}");
                            self.slides.record(id, slide);
                        }
                        more => {
                            return Err(ReconcileError::AmbiguousSlide {
                                image: image.name.clone(),
                                count: more.len(),
                            })
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Adaptive search for one entry address: scan at a generous jump-width
    /// threshold, keep the indices the validator confirms, and halve the
    /// threshold until something survives or the floor is reached. Trades
    /// precision for recall on noisy traces without unbounded work.
    fn locate_entry_slides(&self, entry: u64) -> BTreeSet<Slide> {
        let mut threshold = SCAN_THRESHOLD_START;
        let survivors = loop {
            let mut candidates = scanner::scan(self.trace, entry, threshold);
            candidates.retain(|&idx| {
                validator::validate(self.trace, self.lifter, self.policy.as_ref(), entry, idx)
            });
            threshold /= 2;
            if !candidates.is_empty() || threshold <= SCAN_THRESHOLD_FLOOR {
                break candidates;
            }
        };

        survivors
            .into_iter()
            .map(|idx| Slide::from_delta(self.trace.addrs()[idx], entry))
            .collect()
    }
}

/// Addresses the loader guarantees ran for this image: its initializers,
/// plus the program entry point when it is the main image.
fn entry_addresses(image: &Image) -> Vec<u64> {
    let mut entries = image.initializers.clone();
    if image.is_main {
        entries.push(image.entry_point);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageKind, ImageMap, MemoryRange};
    use crate::lifter::CfgLifter;
    use crate::trace::Trace;
    use std::collections::HashMap;

    fn relocatable(name: &str, initializers: Vec<u64>) -> Image {
        Image {
            name: name.to_string(),
            kind: ImageKind::Object,
            position_independent: true,
            pinned_base: false,
            entry_point: 0,
            initializers,
            is_main: false,
            ranges: vec![MemoryRange { start: 0x40_0000, end: 0x50_0000 }],
        }
    }

    #[test]
    fn test_search_widens_until_candidates_survive() {
        // The congruent index hides behind a jump of ~0x4edd bytes, so the
        // first four scan passes see nothing and the 0x4000-threshold pass
        // finds it.
        let entry = 0x40_0000;
        let trace = Trace::new(vec![0x55_0123, 0x55_5000, 0x55_5010]);
        let lifter = CfgLifter::new(HashMap::from([(entry, vec![entry + 0x10])]));
        let images = ImageMap::new(vec![relocatable("libfoo.so", vec![entry])]);

        let mut session = ReconcileSession::new(&trace, &images, &lifter);
        session.resolve_all_slides().expect("resolution succeeds");
        let (id, _) = images.iter().next().expect("one image");
        assert_eq!(session.slides().get(id), Some(Slide(0x15_5000)));
    }

    #[test]
    fn test_search_stops_at_floor_with_nothing() {
        let trace = Trace::new(vec![0x55_2123, 0x55_5321]);
        let lifter = CfgLifter::default();
        let images = ImageMap::new(vec![relocatable("libfoo.so", vec![0x40_0000])]);

        let mut session = ReconcileSession::new(&trace, &images, &lifter);
        let err = session.resolve_all_slides().unwrap_err();
        assert!(matches!(err, ReconcileError::AmbiguousOrAbsentTrace { .. }));
        assert!(session.slides().is_empty());
    }

    #[test]
    fn test_entry_addresses_includes_main_entry_point() {
        let mut image = relocatable("app", vec![0x40_0800]);
        assert_eq!(entry_addresses(&image), vec![0x40_0800]);

        image.is_main = true;
        image.entry_point = 0x40_0560;
        assert_eq!(entry_addresses(&image), vec![0x40_0800, 0x40_0560]);
    }
}
