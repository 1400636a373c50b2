use crate::dataset;
use crate::driver;
use crate::track;
use crate::trackers;
use crate::utils;

pub use dataset::{load_detections, load_seqmap, parse_detections, write_tracks};
pub use driver::{run_pipeline, PipelineConfig, PipelineSummary, SequenceReport};
pub use track::{Detection, FrameStream, MaskOverlap, Track};
pub use trackers::iou::{IouTracker, IouTrackerOptions};
pub use utils::rle::RleMask;
