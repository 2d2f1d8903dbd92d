//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sliderule",
    about = "Reconcile a recorded execution trace with a static model's address space",
    after_help = "\
EXAMPLES:
    sliderule trace.json --layout layout.json            Resolve per-image slides
    sliderule trace.json -l layout.json --cfg cfg.json   Validate candidates against
                                                         recorded block successors
    sliderule trace.json -l layout.json \\
        --model-trace model.json                         Lockstep-check a model trace"
)]
pub struct Args {
    /// Recorded concrete trace (JSON array of instruction addresses)
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Image layout manifest describing the model's loaded images
    #[arg(short, long, value_name = "FILE")]
    pub layout: PathBuf,

    /// Block successor map exported by the analysis engine (optional; without
    /// it, candidate validation relies on the indirect-jump heuristic alone)
    #[arg(long, value_name = "FILE")]
    pub cfg: Option<PathBuf>,

    /// Model-space trace to walk in lockstep against TRACE
    #[arg(long, value_name = "FILE")]
    pub model_trace: Option<PathBuf>,

    /// Write the resolved slide table to a JSON report
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Suppress the per-image table on stdout
    #[arg(short, long)]
    pub quiet: bool,
}
