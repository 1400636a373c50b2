use anyhow::{bail, Result};
use masktrack::prelude::*;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        bail!("usage: {} <detections-dir> <output-dir> <seqmap>", args[0]);
    }

    let config = PipelineConfig::new(
        Path::new(&args[1]),
        Path::new(&args[2]),
        Path::new(&args[3]),
    );
    let summary = run_pipeline(&config)?;

    for report in &summary.completed {
        println!(
            "{}: {} tracks over {} detections",
            report.sequence, report.tracks, report.detections
        );
    }
    for (sequence, error) in &summary.failed {
        println!("{sequence}: FAILED ({error})");
    }
    if summary.completed.is_empty() && !summary.failed.is_empty() {
        bail!("every sequence failed");
    }
    Ok(())
}
