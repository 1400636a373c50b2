use crate::track::{Detection, FrameStream, MaskOverlap, Track};
use crate::trackers::{
    DEFAULT_CLASS_ID, DEFAULT_MIN_TRACK_LENGTH, DEFAULT_SIGMA_HIGH, DEFAULT_SIGMA_IOU,
    DEFAULT_SIGMA_LOW,
};
use crate::Errors;
use anyhow::Result;
use log::debug;
use std::mem::take;

/// Thresholds that drive the track lifecycle.
///
#[derive(Debug, Clone, Copy)]
pub struct IouTrackerOptions {
    /// Detections with lower confidence are discarded before association
    pub sigma_low: f32,
    /// A finished track is reported only when its mean confidence reaches this value
    pub sigma_high: f32,
    /// Minimal mask overlap required to extend a track with a candidate detection
    pub sigma_iou: f32,
    /// A finished track is reported only when it holds at least this many detections
    pub min_track_length: usize,
    /// Detections of other classes are discarded before association
    pub class_id: i64,
}

impl Default for IouTrackerOptions {
    fn default() -> Self {
        Self {
            sigma_low: DEFAULT_SIGMA_LOW,
            sigma_high: DEFAULT_SIGMA_HIGH,
            sigma_iou: DEFAULT_SIGMA_IOU,
            min_track_length: DEFAULT_MIN_TRACK_LENGTH,
            class_id: DEFAULT_CLASS_ID,
        }
    }
}

/// Greedy mask-overlap tracker.
///
/// The tracker consumes frames in strictly increasing index order and keeps
/// two sets of tracks: active ones, still eligible for extension, and
/// finished ones, already evaluated against the reporting thresholds. Each
/// frame every active track claims the pool candidate with the highest
/// overlap against the track's most recent mask; a track that fails to claim
/// a qualifying candidate stops growing right there. Leftover candidates
/// seed new tracks.
///
/// The per-track claim is greedy on purpose: candidates are removed from a
/// shared pool one track at a time, so no detection ever lands in two
/// tracks, and no globally optimal assignment is attempted.
///
pub struct IouTracker<M>
where
    M: MaskOverlap,
{
    opts: IouTrackerOptions,
    active: Vec<Track<M>>,
    finished: Vec<Track<M>>,
    last_frame: Option<usize>,
}

impl<M> IouTracker<M>
where
    M: MaskOverlap,
{
    /// Creates a tracker with the given thresholds.
    ///
    pub fn new(opts: IouTrackerOptions) -> Self {
        Self {
            opts,
            active: Vec::new(),
            finished: Vec::new(),
            last_frame: None,
        }
    }

    pub fn options(&self) -> &IouTrackerOptions {
        &self.opts
    }

    /// Number of tracks still eligible for extension.
    ///
    pub fn active_tracks(&self) -> usize {
        self.active.len()
    }

    /// Consumes the next frame of the sequence.
    ///
    /// Frames must arrive in strictly increasing index order; a frame that
    /// does not follow the previously processed one is an input error.
    /// Detections below `sigma_low` or of a foreign class are dropped before
    /// association. A negative confidence or an overlap outside `[0, 1]`
    /// fails the sequence immediately.
    ///
    /// # Parameters
    /// * `frame_index` - index of the frame within the sequence
    /// * `detections` - all detections of that frame, in detector order
    ///
    pub fn process_frame(
        &mut self,
        frame_index: usize,
        detections: Vec<Detection<M>>,
    ) -> Result<()> {
        if let Some(last) = self.last_frame {
            if frame_index <= last {
                return Err(Errors::FrameOutOfOrder(frame_index, last).into());
            }
        }
        self.last_frame = Some(frame_index);

        let mut dets = Vec::with_capacity(detections.len());
        for d in detections {
            if d.confidence() < 0.0 {
                return Err(Errors::NegativeConfidence(d.confidence()).into());
            }
            if d.class_id() == self.opts.class_id && d.confidence() >= self.opts.sigma_low {
                dets.push(d);
            }
        }

        let mut updated = Vec::with_capacity(self.active.len() + dets.len());
        for mut track in take(&mut self.active) {
            match best_candidate(&track, &dets)? {
                Some((idx, overlap)) if overlap >= self.opts.sigma_iou => {
                    let det = dets.remove(idx);
                    debug!(
                        "frame {}: track from frame {} claims detection {} (overlap {})",
                        frame_index,
                        track.start_frame(),
                        det.detection_id(),
                        overlap
                    );
                    track.push(det);
                    updated.push(track);
                }
                _ => self.finish(track),
            }
        }

        for det in dets {
            debug!(
                "frame {}: detection {} seeds a new track",
                frame_index,
                det.detection_id()
            );
            updated.push(Track::new(det, frame_index));
        }

        self.active = updated;
        Ok(())
    }

    /// Ends the sequence: every remaining active track is evaluated against
    /// the reporting thresholds, and the finished tracks are returned in the
    /// order they finished.
    ///
    pub fn finalize(mut self) -> Vec<Track<M>> {
        for track in take(&mut self.active) {
            self.finish(track);
        }
        self.finished
    }

    fn finish(&mut self, track: Track<M>) {
        if track.mean_score() >= self.opts.sigma_high as f64
            && track.len() >= self.opts.min_track_length
        {
            self.finished.push(track);
        } else {
            debug!(
                "track from frame {} dropped: length {}, mean score {}",
                track.start_frame(),
                track.len(),
                track.mean_score()
            );
        }
    }

    /// Runs the tracker over a whole sequence at once.
    ///
    /// # Parameters
    /// * `opts` - lifecycle thresholds
    /// * `frames` - detections grouped by frame; the map iterates frames in
    ///   increasing index order
    ///
    pub fn run(opts: IouTrackerOptions, frames: FrameStream<M>) -> Result<Vec<Track<M>>> {
        let mut tracker = Self::new(opts);
        for (frame_index, detections) in frames {
            tracker.process_frame(frame_index, detections)?;
        }
        Ok(tracker.finalize())
    }
}

/// Scans the candidate pool for the detection with maximal overlap against
/// the track's most recent mask. Ties are won by the earliest candidate in
/// pool order.
///
fn best_candidate<M>(track: &Track<M>, dets: &[Detection<M>]) -> Result<Option<(usize, f32)>>
where
    M: MaskOverlap,
{
    let anchor = track.last_detection().mask();
    let mut best: Option<(usize, f32)> = None;
    for (idx, det) in dets.iter().enumerate() {
        let overlap = M::overlap(anchor, det.mask());
        if !(0.0..=1.0).contains(&overlap) {
            return Err(Errors::OverlapOutOfRange(overlap).into());
        }
        match best {
            Some((_, current)) if overlap <= current => {}
            _ => best = Some((idx, overlap)),
        }
    }
    Ok(best)
}
