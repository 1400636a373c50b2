use std::collections::BTreeMap;

/// Mask similarity metric used by trackers to compare detections.
///
/// Implementations must be symmetric, return values within `[0, 1]`,
/// `0.0` for disjoint masks and `1.0` for identical masks.
///
pub trait MaskOverlap: Send + Sync + Clone + 'static {
    /// Calculates the overlap (IoU) between two masks.
    ///
    fn overlap(l: &Self, r: &Self) -> f32;
}

/// Detections grouped by frame. The map iterates frames in increasing
/// index order which is what trackers require.
///
pub type FrameStream<M> = BTreeMap<usize, Vec<Detection<M>>>;

/// A single object hypothesis produced by a segmentation model for one frame.
///
/// The record is immutable after construction and owns its mask.
///
#[derive(Debug, Clone)]
pub struct Detection<M>
where
    M: MaskOverlap,
{
    detection_id: u64,
    class_id: i64,
    confidence: f32,
    mask: M,
}

impl<M> Detection<M>
where
    M: MaskOverlap,
{
    /// Constructor
    ///
    /// # Parameters
    /// * `detection_id` - identifier unique within the sequence
    /// * `class_id` - class label assigned by the detector
    /// * `confidence` - detector confidence, expected within `[0, 1]`
    /// * `mask` - binary segmentation mask
    ///
    pub fn new(detection_id: u64, class_id: i64, confidence: f32, mask: M) -> Self {
        Self {
            detection_id,
            class_id,
            confidence,
            mask,
        }
    }

    pub fn detection_id(&self) -> u64 {
        self.detection_id
    }

    pub fn class_id(&self) -> i64 {
        self.class_id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn mask(&self) -> &M {
        &self.mask
    }
}

/// An ordered sequence of detections believed to depict the same object
/// over time.
///
/// Tracks are created and extended exclusively by a tracker; once the
/// tracker hands a track out it is never mutated again, which the field
/// privacy here enforces.
///
#[derive(Debug, Clone)]
pub struct Track<M>
where
    M: MaskOverlap,
{
    detections: Vec<Detection<M>>,
    score: f64,
    start_frame: usize,
}

impl<M> Track<M>
where
    M: MaskOverlap,
{
    /// Seeds a new track from a single unmatched detection.
    ///
    pub(crate) fn new(seed: Detection<M>, start_frame: usize) -> Self {
        Self {
            score: seed.confidence() as f64,
            detections: vec![seed],
            start_frame,
        }
    }

    /// Appends the next matched detection and accumulates its confidence.
    ///
    pub(crate) fn push(&mut self, detection: Detection<M>) {
        self.score += detection.confidence() as f64;
        self.detections.push(detection);
    }

    /// Member detections in frame order.
    ///
    pub fn detections(&self) -> &[Detection<M>] {
        &self.detections
    }

    /// The detection the track would be matched by in the next frame.
    ///
    pub fn last_detection(&self) -> &Detection<M> {
        self.detections
            .last()
            .expect("a track always holds at least one detection")
    }

    /// Frame index of the first member detection.
    ///
    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    /// Running sum of member confidences.
    ///
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Average member confidence. Reported tracks repeat this value for
    /// every member detection in the output.
    ///
    pub fn mean_score(&self) -> f64 {
        self.score / self.detections.len() as f64
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
