//! # sliderule - Main Entry Point
//!
//! Thin replay driver around the library: load the recorded trace, the
//! image layout, and optionally a block successor map; resolve the
//! per-image slides; then lockstep-check a model trace and/or export the
//! slide table on request.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use sliderule::cli::Args;
use sliderule::image::ImageMap;
use sliderule::lifter::CfgLifter;
use sliderule::reconcile::ReconcileSession;
use sliderule::report::SlideReport;
use sliderule::trace::Trace;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let trace = Trace::from_file(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;
    let images = ImageMap::from_file(&args.layout)
        .with_context(|| format!("Failed to load image layout {}", args.layout.display()))?;
    let lifter = match &args.cfg {
        Some(path) => CfgLifter::from_file(path)
            .with_context(|| format!("Failed to load successor map {}", path.display()))?,
        None => CfgLifter::default(),
    };
    info!("loaded {} trace steps and {} images", trace.len(), images.len());

    let mut session = ReconcileSession::new(&trace, &images, &lifter);
    session.resolve_all_slides().context("Slide resolution failed")?;

    if !args.quiet {
        print_slide_table(&session);
    }

    if let Some(path) = &args.model_trace {
        let model = Trace::from_file(path)
            .with_context(|| format!("Failed to load model trace {}", path.display()))?;
        run_lockstep(&mut session, &trace, &model)?;
    }

    if let Some(path) = &args.export {
        SlideReport::from_session(&session).write_to(path)?;
        info!("wrote slide report to {}", path.display());
    }

    Ok(())
}

/// Print the per-image outcome as an aligned table.
fn print_slide_table(session: &ReconcileSession<'_>) {
    println!("{:<28} {:>18}  {}", "IMAGE", "SLIDE", "HOW");
    for (id, image) in session.images().iter() {
        if image.is_pseudo() {
            continue;
        }
        match session.slides().get(id) {
            Some(slide) => {
                let how = if !image.position_independent {
                    "fixed at link time"
                } else if image.pinned_base {
                    "pinned base"
                } else {
                    "recovered from trace"
                };
                println!("{:<28} {:>18}  {how}", image.name, slide.to_string());
            }
            None => println!("{:<28} {:>18}  unresolved", image.name, "-"),
        }
    }
}

/// Walk the model trace against the concrete trace step by step through the
/// comparator. Steps the comparator reports as non-matching (extern/kernel
/// bookkeeping addresses) are counted but not fatal; a desync is.
fn run_lockstep(
    session: &mut ReconcileSession<'_>,
    concrete: &Trace,
    model: &Trace,
) -> Result<()> {
    if concrete.len() != model.len() {
        log::warn!(
            "trace lengths differ ({} concrete vs {} model); checking the common prefix",
            concrete.len(),
            model.len()
        );
    }

    let steps = concrete.len().min(model.len());
    let mut matched = 0usize;
    for idx in 0..steps {
        let trace_addr = concrete.addrs()[idx];
        let model_addr = model.addrs()[idx];
        match session.compare(trace_addr, model_addr) {
            Ok(true) => matched += 1,
            Ok(false) => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Lockstep check failed at step {idx}"))
            }
        }
    }

    println!("lockstep: {matched}/{steps} steps matched");
    Ok(())
}
