//! Concrete execution trace model
//!
//! A trace is the ordered sequence of instruction addresses one real run of
//! the program executed, with every image placed wherever the operating
//! system's randomized loading put it. It is read-only for this crate; the
//! recording side lives elsewhere.

use anyhow::{Context, Result};
use std::path::Path;

/// Ordered, 0-indexed, immutable sequence of executed instruction addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    addrs: Vec<u64>,
}

impl Trace {
    #[must_use]
    pub fn new(addrs: Vec<u64>) -> Self {
        Self { addrs }
    }

    /// Number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Address executed at step `idx`, or `None` past the end of the
    /// recording.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<u64> {
        self.addrs.get(idx).copied()
    }

    /// The whole recording as a slice, for index-heavy scanning loops.
    #[must_use]
    pub fn addrs(&self) -> &[u64] {
        &self.addrs
    }

    /// Parse a recorded trace file into our internal representation.
    ///
    /// The file is a JSON array of addresses; entries may be integers or
    /// strings in decimal or `0x` hex form, whichever the recorder emitted.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not a JSON array, or
    /// contains an entry that does not parse as an address.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let entries = json.as_array().context("Trace file must be a JSON array of addresses")?;
        let mut addrs = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let addr = parse_json_addr(entry)
                .with_context(|| format!("Trace entry {idx} is not an address: {entry}"))?;
            addrs.push(addr);
        }

        Ok(Self::new(addrs))
    }
}

/// Parse one JSON value as an address (integer, decimal string, or hex
/// string).
pub(crate) fn parse_json_addr(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => parse_addr_str(s),
        _ => None,
    }
}

/// Parse a decimal or `0x`-prefixed hex address string.
pub(crate) fn parse_addr_str(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_trace_accessors() {
        let trace = Trace::new(vec![0x1000, 0x2004, 0x30000]);
        assert_eq!(trace.len(), 3);
        assert!(!trace.is_empty());
        assert_eq!(trace.get(1), Some(0x2004));
        assert_eq!(trace.get(3), None);
        assert_eq!(trace.addrs(), &[0x1000, 0x2004, 0x30000]);
    }

    #[test]
    fn test_parse_addr_forms() {
        assert_eq!(parse_addr_str("4096"), Some(4096));
        assert_eq!(parse_addr_str("0x1000"), Some(0x1000));
        assert_eq!(parse_addr_str("0X1000"), Some(0x1000));
        assert_eq!(parse_addr_str(" 0x1000 "), Some(0x1000));
        assert_eq!(parse_addr_str("not-an-address"), None);
    }

    #[test]
    fn test_from_file_mixed_entries() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, r#"[4096, "0x2004", "196608"]"#).expect("write trace");

        let trace = Trace::from_file(file.path()).expect("load trace");
        assert_eq!(trace.addrs(), &[0x1000, 0x2004, 0x30000]);
    }

    #[test]
    fn test_from_file_rejects_bad_entry() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, r#"[4096, true]"#).expect("write trace");

        let err = Trace::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_from_file_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, r#"{{"addrs": []}}"#).expect("write trace");

        assert!(Trace::from_file(file.path()).is_err());
    }
}
