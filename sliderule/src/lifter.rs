//! Control-flow lifter boundary
//!
//! The lifter is the second external collaborator: given a model-space code
//! address it returns the statically known direct successor addresses of the
//! block starting there. Candidate validation leans on it to tell "a real
//! entry into this block" apart from "a page-aligned coincidence".

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::trace::{parse_addr_str, parse_json_addr};

/// External collaborator turning a code address into the statically known
/// direct successor addresses of the block starting there.
pub trait BlockLifter {
    /// Direct jump targets of the block starting at `block_start`, in model
    /// space. An empty set means "no statically resolvable direct
    /// successors", i.e. the block ends in an indirect transfer.
    fn direct_successors(&self, block_start: u64) -> Vec<u64>;
}

/// File-backed lifter over a successor map exported by the analysis engine.
///
/// Blocks absent from the map are treated as having no statically known
/// successors, which routes their candidates through the indirect-jump
/// fallback during validation.
#[derive(Debug, Clone, Default)]
pub struct CfgLifter {
    edges: HashMap<u64, Vec<u64>>,
}

impl CfgLifter {
    #[must_use]
    pub fn new(edges: HashMap<u64, Vec<u64>>) -> Self {
        Self { edges }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Parse a successor map file into our internal representation.
    ///
    /// The file is a JSON object mapping block start addresses (decimal or
    /// `0x` hex strings) to arrays of successor addresses.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not a JSON object, or
    /// contains a key or successor that does not parse as an address.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let map = json
            .as_object()
            .context("Successor map must be a JSON object keyed by block start address")?;
        let mut edges = HashMap::with_capacity(map.len());
        for (key, value) in map {
            let block = parse_addr_str(key)
                .with_context(|| format!("Block key is not an address: {key}"))?;
            let targets = value
                .as_array()
                .with_context(|| format!("Successors of {key} must be an array"))?;
            let mut successors = Vec::with_capacity(targets.len());
            for target in targets {
                let addr = parse_json_addr(target)
                    .with_context(|| format!("Successor of {key} is not an address: {target}"))?;
                successors.push(addr);
            }
            edges.insert(block, successors);
        }

        Ok(Self::new(edges))
    }
}

impl BlockLifter for CfgLifter {
    fn direct_successors(&self, block_start: u64) -> Vec<u64> {
        self.edges.get(&block_start).cloned().unwrap_or_default()
    }
}
