//! Slide report export
//!
//! Serializes the outcome of a resolution run so downstream tooling (or a
//! later replay session) can consume the slide table without redoing the
//! search.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::reconcile::ReconcileSession;

/// One image's resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlide {
    pub image: String,
    /// Established slide, or `None` when the trace gave no evidence.
    pub slide: Option<i64>,
    pub position_independent: bool,
    pub pinned_base: bool,
}

/// Full report over every real image in the session's loader snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideReport {
    pub images: Vec<ImageSlide>,
}

impl SlideReport {
    /// Snapshot the session's slide table, in image enumeration order.
    /// Bookkeeping pseudo-images are omitted.
    #[must_use]
    pub fn from_session(session: &ReconcileSession<'_>) -> Self {
        let images = session
            .images()
            .iter()
            .filter(|(_, image)| !image.is_pseudo())
            .map(|(id, image)| ImageSlide {
                image: image.name.clone(),
                slide: session.slides().get(id).map(|slide| slide.0),
                position_independent: image.position_independent,
                pinned_base: image.pinned_base,
            })
            .collect();
        Self { images }
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(())
    }
}
