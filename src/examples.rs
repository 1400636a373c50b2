use crate::utils::rle::RleMask;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Generates rectangle masks drifting over a fixed canvas. Used by demos
/// and synthetic tests as a stand-in for a segmentation model.
///
pub struct MaskGen {
    height: usize,
    width: usize,
    x: f32,
    y: f32,
    rect_width: usize,
    rect_height: usize,
    gen: ThreadRng,
    dist_pos: Uniform<f32>,
}

impl MaskGen {
    /// Creates a generator for a `rect_width x rect_height` object starting
    /// at `(x, y)` on a `height x width` canvas, drifting up to `pos_drift`
    /// pixels per step in each direction.
    ///
    pub fn new(
        height: usize,
        width: usize,
        x: f32,
        y: f32,
        rect_width: usize,
        rect_height: usize,
        pos_drift: f32,
    ) -> Self {
        assert!(rect_width <= width && rect_height <= height);
        Self {
            height,
            width,
            x,
            y,
            rect_width,
            rect_height,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new(-pos_drift, pos_drift),
        }
    }
}

impl Iterator for MaskGen {
    type Item = RleMask;

    fn next(&mut self) -> Option<Self::Item> {
        self.x += self.gen.sample(self.dist_pos);
        self.y += self.gen.sample(self.dist_pos);

        self.x = self.x.clamp(0.0, (self.width - self.rect_width) as f32);
        self.y = self.y.clamp(0.0, (self.height - self.rect_height) as f32);

        Some(
            RleMask::rect(
                self.height,
                self.width,
                self.x as usize,
                self.y as usize,
                self.rect_width,
                self.rect_height,
            )
            .expect("the rectangle is clamped into the canvas"),
        )
    }
}
