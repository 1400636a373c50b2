use crate::dataset::{load_detections, load_seqmap, write_tracks};
use crate::trackers::iou::{IouTracker, IouTrackerOptions};
use anyhow::{Context, Result};
use itertools::{Either, Itertools};
use log::{error, info};
use rayon::prelude::*;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Explicit configuration of a tracking run over a dataset split.
///
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding one `<sequence>.txt` detection file per sequence
    pub detections_path: PathBuf,
    /// Directory the `<sequence>.txt` result files are written to
    pub output_path: PathBuf,
    /// Seqmap file enumerating the sequences of the split
    pub seqmap_path: PathBuf,
    /// Lifecycle thresholds shared by all sequences
    pub tracker: IouTrackerOptions,
    /// Worker threads used to process sequences in parallel
    pub workers: usize,
}

impl PipelineConfig {
    /// Creates a configuration with default thresholds and one worker per
    /// logical CPU.
    ///
    pub fn new(detections_path: &Path, output_path: &Path, seqmap_path: &Path) -> Self {
        Self {
            detections_path: detections_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            seqmap_path: seqmap_path.to_path_buf(),
            tracker: IouTrackerOptions::default(),
            workers: num_cpus::get(),
        }
    }
}

/// Per-sequence outcome of a pipeline run.
///
#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub sequence: String,
    /// Reported tracks
    pub tracks: usize,
    /// Detections covered by the reported tracks
    pub detections: usize,
}

/// Outcome of a whole pipeline run. A failed sequence never aborts the
/// others; it lands here together with its error.
///
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub completed: Vec<SequenceReport>,
    pub failed: Vec<(String, String)>,
}

/// Tracks every sequence of the seqmap and writes one result file per
/// sequence.
///
/// Sequences are independent, so they are fanned out over a thread pool
/// sized by `config.workers`. Input errors and contract violations fail
/// only the sequence that raised them.
///
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary> {
    let sequences = load_seqmap(&config.seqmap_path)?;
    fs::create_dir_all(&config.output_path).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_path.display()
        )
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()?;
    let results: Vec<_> = pool.install(|| {
        sequences
            .par_iter()
            .map(|sequence| (sequence.clone(), track_sequence(config, sequence)))
            .collect()
    });

    let (completed, failed) = results
        .into_iter()
        .partition_map(|(sequence, result)| match result {
            Ok(report) => {
                info!(
                    "sequence {}: {} tracks over {} detections",
                    sequence, report.tracks, report.detections
                );
                Either::Left(report)
            }
            Err(e) => {
                error!("sequence {} failed: {:#}", sequence, e);
                Either::Right((sequence, format!("{e:#}")))
            }
        });
    Ok(PipelineSummary { completed, failed })
}

fn track_sequence(config: &PipelineConfig, sequence: &str) -> Result<SequenceReport> {
    let detections = load_detections(&config.detections_path.join(format!("{sequence}.txt")))?;
    let tracks = IouTracker::run(config.tracker, detections)?;

    let out_path = config.output_path.join(format!("{sequence}.txt"));
    let file = File::create(&out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    write_tracks(file, &tracks)?;

    Ok(SequenceReport {
        sequence: sequence.to_string(),
        tracks: tracks.len(),
        detections: tracks.iter().map(|t| t.len()).sum(),
    })
}
