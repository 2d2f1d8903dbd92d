//! Structured error types for sliderule
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Every variant marks a situation where guessing would silently corrupt
//! later translations, so none of them is retried internally.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// No internally consistent slide survived the per-initializer
    /// intersection for a relocatable image. Either the trace predates the
    /// image's initializers running, or it is from a different binary.
    #[error("trace does not seem to contain initializer activity for {image}; no slide can be established")]
    AmbiguousOrAbsentTrace { image: String },

    /// More than one slide is consistent with everything the trace shows.
    /// Picking one would be a coin toss, so resolution refuses.
    #[error("trace is consistent with {count} different slides for {image}; refusing to pick one")]
    AmbiguousSlide { image: String, count: usize },

    /// Translation was requested for an image whose slide has not been
    /// established, usually a caller ordering bug.
    #[error("no slide has been established for {image}")]
    UnresolvedModule { image: String },

    /// Owner inference found no loaded image for the address.
    #[error("no loaded image owns address {addr:#x}")]
    NoOwningModule { addr: u64 },

    /// Lockstep comparison proved the trace and the model have diverged
    /// while entering a known image.
    #[error("trace desynced on jumping into {image}; was the same build of this image loaded?")]
    TraceDesync { image: String },

    /// Lockstep comparison hit an address no image claims at all.
    #[error("trace desynced on jumping into {addr:#x}, where no image is mapped")]
    TraceDesyncUnmapped { addr: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_slide_display() {
        let err = ReconcileError::AmbiguousSlide { image: "libfoo.so".to_string(), count: 3 };
        assert_eq!(
            err.to_string(),
            "trace is consistent with 3 different slides for libfoo.so; refusing to pick one"
        );
    }

    #[test]
    fn test_desync_display_names_image_or_address() {
        let known = ReconcileError::TraceDesync { image: "libc.so.6".to_string() };
        assert!(known.to_string().contains("libc.so.6"));

        let unmapped = ReconcileError::TraceDesyncUnmapped { addr: 0xdead_b000 };
        assert!(unmapped.to_string().contains("0xdeadb000"));
    }

    #[test]
    fn test_no_owning_module_display() {
        let err = ReconcileError::NoOwningModule { addr: 0x4000 };
        assert_eq!(err.to_string(), "no loaded image owns address 0x4000");
    }
}
