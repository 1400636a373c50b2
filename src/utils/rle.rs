use crate::track::MaskOverlap;
use crate::Errors;
use anyhow::Result;

/// Binary segmentation mask stored as run lengths over a column-major pixel
/// scan of an `height x width` canvas.
///
/// `counts` holds alternating runs of background and foreground pixels,
/// always starting with background (a mask whose first pixel is set starts
/// with a zero-length background run). The representation is compatible with
/// the compressed string format used by COCO-style annotation tooling, see
/// [`RleMask::from_coco`].
///
/// Area and pairwise IoU are computed directly on the runs; pixel buffers
/// are never materialized.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleMask {
    height: usize,
    width: usize,
    counts: Vec<u32>,
}

impl RleMask {
    /// Constructor
    ///
    /// # Parameters
    /// * `height`, `width` - canvas dimensions
    /// * `counts` - alternating background/foreground run lengths, starting
    ///   with background, summing to `height * width`
    ///
    pub fn new(height: usize, width: usize, counts: Vec<u32>) -> Result<Self> {
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        if total != (height * width) as u64 {
            return Err(Errors::InvalidRle(format!(
                "run lengths sum to {} instead of {}x{}={}",
                total,
                height,
                width,
                height * width
            ))
            .into());
        }
        Ok(Self {
            height,
            width,
            counts,
        })
    }

    /// Builds a mask from a column-major pixel scan.
    ///
    pub fn from_pixels(height: usize, width: usize, pixels: &[bool]) -> Result<Self> {
        if pixels.len() != height * width {
            return Err(Errors::InvalidRle(format!(
                "{} pixels for a {}x{} canvas",
                pixels.len(),
                height,
                width
            ))
            .into());
        }
        let mut counts = Vec::new();
        let mut current = false;
        let mut run = 0u32;
        for &p in pixels {
            if p == current {
                run += 1;
            } else {
                counts.push(run);
                current = p;
                run = 1;
            }
        }
        counts.push(run);
        Self::new(height, width, counts)
    }

    /// Builds a solid axis-aligned rectangle mask.
    ///
    /// # Parameters
    /// * `x`, `y` - top-left corner, `x` in columns and `y` in rows
    /// * `rect_width`, `rect_height` - rectangle extent; the rectangle must
    ///   lie fully inside the canvas
    ///
    pub fn rect(
        height: usize,
        width: usize,
        x: usize,
        y: usize,
        rect_width: usize,
        rect_height: usize,
    ) -> Result<Self> {
        if x + rect_width > width || y + rect_height > height || rect_width == 0 || rect_height == 0
        {
            return Err(Errors::InvalidRle(format!(
                "rectangle {rect_width}x{rect_height}@({x},{y}) does not fit a {height}x{width} canvas"
            ))
            .into());
        }
        let mut counts = vec![(x * height + y) as u32];
        for column in 0..rect_width {
            counts.push(rect_height as u32);
            if column + 1 < rect_width {
                counts.push((height - rect_height) as u32);
            }
        }
        let covered: u64 = counts.iter().map(|&c| c as u64).sum();
        counts.push(((height * width) as u64 - covered) as u32);
        Self::new(height, width, counts)
    }

    /// Decodes the compressed COCO-style RLE string.
    ///
    /// The string packs run lengths LEB128-like, 5 bits per character offset
    /// by 48, with every run from the fourth on stored as a delta against
    /// the run two positions earlier.
    ///
    pub fn from_coco(height: usize, width: usize, s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let mut counts: Vec<u32> = Vec::new();
        let mut p = 0usize;
        while p < bytes.len() {
            let mut x = 0i64;
            let mut k = 0u32;
            loop {
                if p >= bytes.len() {
                    return Err(Errors::InvalidRle("truncated count".into()).into());
                }
                let c = bytes[p] as i64 - 48;
                if !(0..64).contains(&c) {
                    return Err(
                        Errors::InvalidRle(format!("invalid character {:?}", bytes[p] as char))
                            .into(),
                    );
                }
                if k >= 12 {
                    return Err(Errors::InvalidRle("count does not fit 64 bits".into()).into());
                }
                x |= (c & 0x1f) << (5 * k);
                p += 1;
                k += 1;
                if c & 0x20 == 0 {
                    if c & 0x10 != 0 {
                        x |= -1i64 << (5 * k);
                    }
                    break;
                }
            }
            if counts.len() > 2 {
                x += counts[counts.len() - 2] as i64;
            }
            if x < 0 || x > u32::MAX as i64 {
                return Err(Errors::InvalidRle(format!("run length {x} out of range")).into());
            }
            counts.push(x as u32);
        }
        Self::new(height, width, counts)
    }

    /// Encodes the mask into the compressed COCO-style RLE string.
    ///
    pub fn to_coco(&self) -> String {
        let mut s = String::new();
        for (i, &count) in self.counts.iter().enumerate() {
            let mut x = count as i64;
            if i > 2 {
                x -= self.counts[i - 2] as i64;
            }
            loop {
                let mut c = (x & 0x1f) as u8;
                x >>= 5;
                let more = if c & 0x10 != 0 { x != -1 } else { x != 0 };
                if more {
                    c |= 0x20;
                }
                s.push((c + 48) as char);
                if !more {
                    break;
                }
            }
        }
        s
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Number of foreground pixels.
    ///
    pub fn area(&self) -> u64 {
        self.counts
            .iter()
            .skip(1)
            .step_by(2)
            .map(|&c| c as u64)
            .sum()
    }

    /// Intersection-over-union of two masks on the same canvas, computed by
    /// merging the two run lists.
    ///
    pub fn iou(l: &RleMask, r: &RleMask) -> f32 {
        assert_eq!(
            (l.height, l.width),
            (r.height, r.width),
            "mask canvases must match"
        );
        let intersection = run_intersection(&l.counts, &r.counts);
        let union = l.area() + r.area() - intersection;
        if union == 0 {
            0.0
        } else {
            (intersection as f64 / union as f64) as f32
        }
    }
}

impl MaskOverlap for RleMask {
    fn overlap(l: &Self, r: &Self) -> f32 {
        RleMask::iou(l, r)
    }
}

/// Foreground intersection area of two run lists covering the same number
/// of pixels. Even-indexed runs are background, odd ones foreground.
///
fn run_intersection(a: &[u32], b: &[u32]) -> u64 {
    let mut intersection = 0u64;
    let (mut ia, mut ib) = (0usize, 0usize);
    let (mut ra, mut rb) = (0u64, 0u64);
    let (mut va, mut vb) = (false, false);
    loop {
        if ra == 0 {
            if ia == a.len() {
                break;
            }
            ra = a[ia] as u64;
            va = ia % 2 == 1;
            ia += 1;
            continue;
        }
        if rb == 0 {
            if ib == b.len() {
                break;
            }
            rb = b[ib] as u64;
            vb = ib % 2 == 1;
            ib += 1;
            continue;
        }
        let step = ra.min(rb);
        if va && vb {
            intersection += step;
        }
        ra -= step;
        rb -= step;
    }
    intersection
}

#[cfg(test)]
mod tests {
    use crate::track::MaskOverlap;
    use crate::utils::rle::RleMask;
    use crate::EPS;

    #[test]
    fn counts_must_cover_the_canvas() {
        assert!(RleMask::new(2, 3, vec![6]).is_ok());
        assert!(RleMask::new(2, 3, vec![5]).is_err());
        assert!(RleMask::new(2, 3, vec![0, 6]).is_ok());
    }

    #[test]
    fn rect_equals_pixel_encoding() {
        let (h, w) = (5, 7);
        let (x, y, rw, rh) = (2usize, 1usize, 3usize, 2usize);
        let mut pixels = vec![false; h * w];
        for col in x..x + rw {
            for row in y..y + rh {
                pixels[col * h + row] = true;
            }
        }
        let from_pixels = RleMask::from_pixels(h, w, &pixels).unwrap();
        let from_rect = RleMask::rect(h, w, x, y, rw, rh).unwrap();
        assert_eq!(from_pixels, from_rect);
        assert_eq!(from_rect.area(), (rw * rh) as u64);
    }

    #[test]
    fn rect_must_fit() {
        assert!(RleMask::rect(5, 5, 3, 3, 3, 1).is_err());
        assert!(RleMask::rect(5, 5, 0, 0, 0, 1).is_err());
    }

    #[test]
    fn iou_of_known_rectangles() {
        // 2x2 squares sharing a 1x2 strip: intersection 2, union 6
        let a = RleMask::rect(4, 4, 0, 0, 2, 2).unwrap();
        let b = RleMask::rect(4, 4, 1, 0, 2, 2).unwrap();
        assert!((RleMask::iou(&a, &b) - 2.0 / 6.0).abs() < EPS);

        let identical = RleMask::rect(4, 4, 0, 0, 2, 2).unwrap();
        assert!((RleMask::iou(&a, &identical) - 1.0).abs() < EPS);

        let disjoint = RleMask::rect(4, 4, 2, 2, 2, 2).unwrap();
        assert!(RleMask::iou(&a, &disjoint).abs() < EPS);
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = RleMask::rect(8, 8, 1, 1, 4, 5).unwrap();
        let b = RleMask::rect(8, 8, 3, 2, 4, 4).unwrap();
        assert!((RleMask::overlap(&a, &b) - RleMask::overlap(&b, &a)).abs() < EPS);
    }

    #[test]
    fn empty_masks_do_not_overlap() {
        let a = RleMask::new(3, 3, vec![9]).unwrap();
        let b = RleMask::new(3, 3, vec![9]).unwrap();
        assert_eq!(a.area(), 0);
        assert!(RleMask::iou(&a, &b).abs() < EPS);
    }

    #[test]
    fn coco_string_of_an_all_background_mask() {
        // a single run of 6 encodes as one character
        let m = RleMask::new(2, 3, vec![6]).unwrap();
        assert_eq!(m.to_coco(), "6");
        assert_eq!(RleMask::from_coco(2, 3, "6").unwrap(), m);
    }

    #[test]
    fn coco_round_trip() {
        let masks = [
            RleMask::rect(5, 7, 2, 1, 3, 2).unwrap(),
            RleMask::rect(32, 32, 0, 0, 32, 32).unwrap(),
            RleMask::new(4, 4, vec![0, 1, 2, 3, 4, 6]).unwrap(),
            RleMask::new(1, 100, vec![33, 34, 33]).unwrap(),
            // negative delta between runs two apart
            RleMask::new(2, 10, vec![10, 5, 2, 1, 2]).unwrap(),
            RleMask::new(100, 100, vec![0, 10000]).unwrap(),
        ];
        for m in masks {
            let s = m.to_coco();
            let decoded = RleMask::from_coco(m.height(), m.width(), &s).unwrap();
            assert_eq!(decoded, m, "round trip failed for {s:?}");
        }
    }

    #[test]
    fn coco_rejects_garbage() {
        assert!(RleMask::from_coco(2, 3, "\u{7f}").is_err());
        // a dangling continuation bit
        assert!(RleMask::from_coco(2, 3, "a").is_err());
        // well-formed string whose counts do not cover the canvas
        assert!(RleMask::from_coco(2, 4, "6").is_err());
    }
}
