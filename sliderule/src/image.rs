//! Loaded-image model at the loader boundary
//!
//! The external loader enumerates every binary object it mapped into the
//! static model and hands this crate a snapshot of the properties the
//! reconciliation needs: relocatability, pinned placement, entry and
//! initializer addresses, and the model-space ranges backing address
//! containment queries. Images are never created or destroyed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

/// Memory range of a loaded image in the model's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// What kind of loader object an image is.
///
/// `Extern` and `Kernel` are the loader's well-known bookkeeping objects:
/// they own address ranges but no real loaded code, so they are skipped by
/// slide resolution and never match in lockstep comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// A real loaded binary object.
    #[default]
    Object,
    /// Stand-in object for unresolved external symbols.
    Extern,
    /// Stand-in object for kernel-provided entry stubs.
    Kernel,
}

/// One loaded binary object as enumerated by the external loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Display name for diagnostics (typically the binary's basename).
    pub name: String,

    #[serde(default)]
    pub kind: ImageKind,

    /// Whether the object's load address is free to vary per run.
    pub position_independent: bool,

    /// Whether the loader was told to place the object at a fixed base.
    #[serde(default)]
    pub pinned_base: bool,

    /// Program entry point in model space. Meaningful only for the main
    /// image.
    #[serde(default)]
    pub entry_point: u64,

    /// Model-space addresses the loader guarantees run early when the image
    /// is loaded (constructor routines and the like).
    #[serde(default)]
    pub initializers: Vec<u64>,

    #[serde(default)]
    pub is_main: bool,

    /// Model-space ranges the image is mapped at.
    pub ranges: Vec<MemoryRange>,
}

impl Image {
    /// Check if a model-space address belongs to this image
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        self.ranges.iter().any(|r| r.contains(addr))
    }

    /// True for the loader's extern/kernel bookkeeping objects.
    #[must_use]
    pub fn is_pseudo(&self) -> bool {
        !matches!(self.kind, ImageKind::Object)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Stable handle to an image within one `ImageMap` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

/// Snapshot of the loader's enumeration, taken once per session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMap {
    images: Vec<Image>,
}

impl ImageMap {
    #[must_use]
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Look up an image by handle.
    ///
    /// # Panics
    /// Panics if `id` did not come from this map.
    #[must_use]
    pub fn get(&self, id: ImageId) -> &Image {
        &self.images[id.0]
    }

    /// Iterate over all images in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &Image)> {
        self.images.iter().enumerate().map(|(idx, image)| (ImageId(idx), image))
    }

    /// Find the image owning a model-space address, if any.
    #[must_use]
    pub fn find_containing(&self, addr: u64) -> Option<ImageId> {
        self.iter().find(|(_, image)| image.contains(addr)).map(|(id, _)| id)
    }

    /// Parse an image layout manifest into our internal representation.
    ///
    /// The manifest is a JSON object with an `images` array; see [`Image`]
    /// for the per-image fields.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not deserialize.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse image layout {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn image(name: &str, kind: ImageKind, start: u64, end: u64) -> Image {
        Image {
            name: name.to_string(),
            kind,
            position_independent: true,
            pinned_base: false,
            entry_point: 0,
            initializers: vec![],
            is_main: false,
            ranges: vec![MemoryRange { start, end }],
        }
    }

    #[test]
    fn test_memory_range_contains() {
        let range = MemoryRange { start: 0x1000, end: 0x2000 };

        assert!(range.contains(0x1000));
        assert!(range.contains(0x1500));
        assert!(range.contains(0x1FFF));
        assert!(!range.contains(0x0FFF));
        assert!(!range.contains(0x2000));
        assert!(!range.contains(0x2001));
    }

    #[test]
    fn test_image_contains_spans_all_ranges() {
        let mut img = image("app", ImageKind::Object, 0x40_0000, 0x41_0000);
        img.ranges.push(MemoryRange { start: 0x60_0000, end: 0x60_1000 });

        assert!(img.contains(0x40_0500));
        assert!(img.contains(0x60_0800));
        assert!(!img.contains(0x50_0000));
    }

    #[test]
    fn test_find_containing_picks_owner() {
        let map = ImageMap::new(vec![
            image("app", ImageKind::Object, 0x40_0000, 0x50_0000),
            image("libfoo.so", ImageKind::Object, 0x70_0000, 0x71_0000),
            image("extern", ImageKind::Extern, 0x90_0000, 0x91_0000),
        ]);

        assert_eq!(map.find_containing(0x40_0560), Some(ImageId(0)));
        assert_eq!(map.find_containing(0x70_0abc), Some(ImageId(1)));
        assert_eq!(map.find_containing(0x90_0000), Some(ImageId(2)));
        assert_eq!(map.find_containing(0x60_0000), None);
    }

    #[test]
    fn test_pseudo_kinds() {
        assert!(!image("app", ImageKind::Object, 0, 1).is_pseudo());
        assert!(image("extern", ImageKind::Extern, 0, 1).is_pseudo());
        assert!(image("kernel", ImageKind::Kernel, 0, 1).is_pseudo());
    }

    #[test]
    fn test_from_file_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(
            file,
            r#"{{"images": [{{"name": "app", "position_independent": false,
                 "ranges": [{{"start": 4194304, "end": 5242880}}]}}]}}"#
        )
        .expect("write layout");

        let map = ImageMap::from_file(file.path()).expect("load layout");
        assert_eq!(map.len(), 1);
        let (_, img) = map.iter().next().expect("one image");
        assert_eq!(img.kind, ImageKind::Object);
        assert!(!img.pinned_base);
        assert!(!img.is_main);
        assert!(img.initializers.is_empty());
        assert!(img.contains(0x40_0000));
    }
}
