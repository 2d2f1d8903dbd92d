//! Candidate scanning over the recorded trace
//!
//! The scanner answers one question: which trace indices could plausibly be
//! the first execution of a given model-space entry address under some
//! unknown slide? A slide moves code by whole pages, so the observed address
//! must agree with the entry in its low 12 bits, and a fresh entry into code
//! usually lands right after a wide, non-fallthrough jump.

use std::collections::BTreeSet;

use crate::domain::page_congruent;
use crate::trace::Trace;

/// Find every index `i` where `trace[i]` is page-congruent with `entry` and
/// is either the very first step or follows a jump wider than `threshold`.
///
/// Pure function of the trace and parameters; no side effects.
pub(crate) fn scan(trace: &Trace, entry: u64, threshold: u64) -> BTreeSet<usize> {
    let mut indices = BTreeSet::new();
    let addrs = trace.addrs();
    for (idx, &addr) in addrs.iter().enumerate() {
        if !page_congruent(addr, entry) {
            continue;
        }
        if idx == 0 || addrs[idx - 1].abs_diff(addr) > threshold {
            indices.insert(idx);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_requires_page_congruence() {
        let trace = Trace::new(vec![0x55_5123, 0x55_5456]);
        assert!(scan(&trace, 0x40_0000, 0x1000).is_empty());
    }

    #[test]
    fn test_scan_accepts_first_index_unconditionally() {
        let trace = Trace::new(vec![0x55_5000, 0x55_5004]);
        let indices = scan(&trace, 0x40_0000, 0x4_0000);
        assert_eq!(indices, BTreeSet::from([0]));
    }

    #[test]
    fn test_scan_gates_later_indices_on_jump_width() {
        // Index 2 is page-congruent but reached by a 4-byte fallthrough.
        let trace = Trace::new(vec![0x10_0123, 0x55_4ffc, 0x55_5000]);
        assert!(scan(&trace, 0x40_0000, 0x1000).is_empty());

        // Same shape with a wide jump in front of the congruent address.
        let trace = Trace::new(vec![0x10_0123, 0x7fff_0000_0123, 0x55_5000]);
        assert_eq!(scan(&trace, 0x40_0000, 0x4_0000), BTreeSet::from([2]));
    }

    #[test]
    fn test_scan_threshold_is_exclusive() {
        let trace = Trace::new(vec![0x55_4000, 0x55_5000]);
        // Index 0 always qualifies. Index 1 sits exactly 0x1000 away, and a
        // threshold of 0x1000 is not "wider than".
        assert_eq!(scan(&trace, 0x40_0000, 0x1000), BTreeSet::from([0]));
        assert_eq!(scan(&trace, 0x40_0000, 0xfff), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_scan_collects_every_plausible_entry() {
        let trace = Trace::new(vec![
            0x55_5000,         // idx 0, first step
            0x55_5008,         // fallthrough, congruent with nothing
            0x7fff_0000_0123,  // far away
            0x66_6000,         // idx 3, behind a wide jump
        ]);
        assert_eq!(scan(&trace, 0x40_0000, 0x4_0000), BTreeSet::from([0, 3]));
    }
}
