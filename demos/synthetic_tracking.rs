use masktrack::examples::MaskGen;
use masktrack::prelude::*;

fn main() {
    env_logger::init();

    let mut a = MaskGen::new(128, 256, 10.0, 10.0, 24, 32, 2.0);
    let mut b = MaskGen::new(128, 256, 180.0, 60.0, 30, 20, 2.0);

    let mut frames: FrameStream<RleMask> = FrameStream::new();
    let mut detection_id = 0;
    for frame in 0..20 {
        let mut detections = Vec::new();
        for gen in [&mut a, &mut b] {
            detections.push(Detection::new(detection_id, 1, 0.95, gen.next().unwrap()));
            detection_id += 1;
        }
        frames.insert(frame, detections);
    }

    let tracks = IouTracker::run(IouTrackerOptions::default(), frames).unwrap();
    for (track_id, track) in tracks.iter().enumerate() {
        eprintln!(
            "track {}: starts at frame {}, {} detections, mean score {:.3}",
            track_id,
            track.start_frame(),
            track.len(),
            track.mean_score()
        );
    }
}
