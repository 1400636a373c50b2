pub mod dataset;
pub mod driver;
pub mod examples;
pub mod prelude;
pub mod track;
pub mod trackers;
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Errors {
    #[error("Detection stream for the sequence is empty.")]
    EmptyDetectionStream,
    #[error("Malformed detection record at line {0}: {1}")]
    MalformedDetection(usize, String),
    #[error("Mask canvas {0}x{1} differs from the sequence canvas {2}x{3}.")]
    CanvasMismatch(usize, usize, usize, usize),
    #[error("Frame {0} does not follow the previously processed frame {1}.")]
    FrameOutOfOrder(usize, usize),
    #[error("Overlap {0} is outside [0, 1] - the overlap oracle violated its contract.")]
    OverlapOutOfRange(f32),
    #[error("Negative confidence {0} reached the tracker.")]
    NegativeConfidence(f32),
    #[error("Invalid RLE: {0}")]
    InvalidRle(String),
}

pub const EPS: f32 = 0.00001;
