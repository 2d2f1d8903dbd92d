//! # sliderule - Trace/Model Address-Space Reconciliation
//!
//! A program recorded under position-independent loading and the same
//! program rebuilt inside a static analysis model live in two different
//! address spaces. Each loaded image differs between them by one constant,
//! page-multiple offset, its *slide*. sliderule recovers those slides from
//! the recording itself, translates addresses in both directions, and
//! keeps a lockstep replay honest by checking every step for divergence.
//!
//! ## Architecture Overview
//!
//! ```text
//! recorded trace ──┐
//! image layout  ───┼──► ReconcileSession ──► resolve_all_slides()
//! block lifter  ───┘          │                     │
//!                             │              per-image SlideTable
//!                             ▼                     │
//!                  to_model_address() ◄─────────────┤
//!                  to_trace_address() ◄─────────────┤
//!                  compare()          ◄─────────────┘ (may add entries)
//! ```
//!
//! ## Module Structure
//!
//! - [`reconcile`]: the core search and bookkeeping
//!   - candidate scanning, successor validation, adaptive slide resolution
//!   - bidirectional translation and the lockstep comparator
//! - [`trace`]: the recorded instruction-address sequence
//! - [`image`]: loader-boundary image snapshot (ranges, initializers, flags)
//! - [`lifter`]: control-flow lifter boundary (block successor queries)
//! - [`report`]: JSON export of resolution outcomes
//! - [`domain`]: core types (`Slide`) and the error taxonomy
//! - [`cli`]: argument parsing for the replay driver
//!
//! The library is synchronous and single-threaded by design: every
//! operation is a bounded computation over in-memory data, and the slide
//! table is owned by exactly one session.

pub mod cli;
pub mod domain;
pub mod image;
pub mod lifter;
pub mod reconcile;
pub mod report;
pub mod trace;
