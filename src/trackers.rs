/// Greedy mask-overlap tracker (tracking-by-detection without image
/// information, applied to segmentation masks)
///
pub mod iou;

/// Default low detection threshold: detections below it never participate
pub const DEFAULT_SIGMA_LOW: f32 = 0.0;

/// Default high detection threshold a reported track must reach on average
pub const DEFAULT_SIGMA_HIGH: f32 = 0.9;

/// Default minimal mask overlap required to continue a track
pub const DEFAULT_SIGMA_IOU: f32 = 0.3;

/// Default minimal length of a reported track, in detections
pub const DEFAULT_MIN_TRACK_LENGTH: usize = 3;

/// Default tracked class
pub const DEFAULT_CLASS_ID: i64 = 1;
