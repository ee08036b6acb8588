//! Geometry & filtering utilities
//!
//! - [`clamp`] keeps commanded angles and powers inside their limits
//! - [`Letterbox`] maps between camera frames and the square detector input
//! - [`median`] filters noisy range samples

use crate::system::platform::Frame;

/// Grey used to pad the letterboxed detector input
pub const LETTERBOX_FILL: u8 = 114;

/// Clamps `value` into `lo..=hi`; a NaN lands in the middle of the range
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    if value.is_nan() {
        return (lo + hi) / 2.0;
    }
    value.max(lo).min(hi)
}

/// Median of `values`, averaging the two middle values for an even count
///
/// Sorts `values` in place. Returns `None` for an empty slice.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top left
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// Aspect-preserving resize of a frame into a padded square
///
/// The frame is scaled so its longer edge fills `size`, then centred with
/// [`LETTERBOX_FILL`] padding on the short axis. The same transform inverted
/// maps detector boxes back onto the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Letterbox {
    /// Edge of the square output
    pub size: u16,
    /// Output pixels per frame pixel
    pub scale: f32,
    /// Left padding in output pixels
    pub pad_x: u16,
    /// Top padding in output pixels
    pub pad_y: u16,
    /// Frame size after scaling
    pub scaled_width: u16,
    pub scaled_height: u16,
    src_width: u16,
    src_height: u16,
}

impl Letterbox {
    /// Transform for a `width` x `height` frame, `None` for empty frames
    pub fn new(width: u16, height: u16, size: u16) -> Option<Self> {
        if width == 0 || height == 0 || size == 0 {
            return None;
        }
        let scale = f32::from(size) / f32::from(width.max(height));
        let scaled_width = (libm::floorf(f32::from(width) * scale) as u16).clamp(1, size);
        let scaled_height = (libm::floorf(f32::from(height) * scale) as u16).clamp(1, size);
        Some(Self {
            size,
            scale,
            pad_x: (size - scaled_width) / 2,
            pad_y: (size - scaled_height) / 2,
            scaled_width,
            scaled_height,
            src_width: width,
            src_height: height,
        })
    }

    /// Bytes needed for the RGB output
    pub const fn buffer_len(size: u16) -> usize {
        size as usize * size as usize * 3
    }

    /// Writes the letterboxed frame into `out` as row-major RGB888
    ///
    /// Uses nearest-neighbour sampling. `out` must hold at least
    /// [`Letterbox::buffer_len`] bytes; extra bytes are left untouched.
    pub fn fill<F: Frame>(&self, frame: &F, out: &mut [u8]) {
        let size = usize::from(self.size);
        let left = usize::from(self.pad_x);
        let top = usize::from(self.pad_y);
        let right = left + usize::from(self.scaled_width);
        let bottom = top + usize::from(self.scaled_height);

        for (y, row) in out[..Self::buffer_len(self.size)]
            .chunks_exact_mut(size * 3)
            .enumerate()
        {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                if x < left || x >= right || y < top || y >= bottom {
                    px.fill(LETTERBOX_FILL);
                    continue;
                }
                let sx = self.source_coord(x - left, self.src_width);
                let sy = self.source_coord(y - top, self.src_height);
                px.copy_from_slice(&frame.rgb(sx, sy));
            }
        }
    }

    /// Maps a box from detector input coordinates back onto the frame
    pub fn to_source(&self, bbox: BoundingBox) -> BoundingBox {
        let px = f32::from(self.pad_x);
        let py = f32::from(self.pad_y);
        BoundingBox {
            x1: (bbox.x1 - px) / self.scale,
            y1: (bbox.y1 - py) / self.scale,
            x2: (bbox.x2 - px) / self.scale,
            y2: (bbox.y2 - py) / self.scale,
        }
    }

    fn source_coord(&self, scaled: usize, src_len: u16) -> u16 {
        let src = libm::floorf((scaled as f32 + 0.5) / self.scale) as u16;
        src.min(src_len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid {
        width: u16,
        height: u16,
    }

    impl Frame for Solid {
        fn width(&self) -> u16 {
            self.width
        }

        fn height(&self) -> u16 {
            self.height
        }

        fn rgb(&self, x: u16, y: u16) -> [u8; 3] {
            assert!(x < self.width && y < self.height, "sampled outside frame");
            [200, 10, 10]
        }
    }

    #[test]
    fn clamp_limits_and_nan() {
        assert_eq!(clamp(120.0, -80.0, 80.0), 80.0);
        assert_eq!(clamp(-1e9, -80.0, 80.0), -80.0);
        assert_eq!(clamp(12.5, -80.0, 80.0), 12.5);
        assert_eq!(clamp(f32::NAN, -80.0, 80.0), 0.0);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&mut [120.0, 118.0, 121.0]), Some(120.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn median_ignores_a_single_spike() {
        assert_eq!(median(&mut [30.0, 900.0, 31.0]), Some(31.0));
    }

    #[test]
    fn landscape_frame_pads_top_and_bottom() {
        let lb = Letterbox::new(640, 480, 480).unwrap();
        assert_eq!(lb.scale, 0.75);
        assert_eq!((lb.scaled_width, lb.scaled_height), (480, 360));
        assert_eq!((lb.pad_x, lb.pad_y), (0, 60));
    }

    #[test]
    fn square_frame_needs_no_padding() {
        let lb = Letterbox::new(480, 480, 480).unwrap();
        assert_eq!(lb.scale, 1.0);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 0));
    }

    #[test]
    fn empty_frame_has_no_transform() {
        assert_eq!(Letterbox::new(0, 480, 480), None);
    }

    #[test]
    fn boxes_map_back_to_the_frame() {
        let lb = Letterbox::new(640, 480, 480).unwrap();
        let mapped = lb.to_source(BoundingBox::new(240.0, 120.0, 300.0, 180.0));
        assert_eq!(mapped, BoundingBox::new(320.0, 80.0, 400.0, 160.0));
    }

    #[test]
    fn fill_pads_with_grey_and_copies_the_frame() {
        let frame = Solid {
            width: 8,
            height: 4,
        };
        let lb = Letterbox::new(8, 4, 8).unwrap();
        let mut out = [0u8; 8 * 8 * 3];
        lb.fill(&frame, &mut out);

        // rows 0-1 and 6-7 are padding, rows 2-5 carry the frame
        let row = |y: usize| &out[y * 24..(y + 1) * 24];
        assert!(row(0).iter().all(|b| *b == LETTERBOX_FILL));
        assert!(row(7).iter().all(|b| *b == LETTERBOX_FILL));
        assert_eq!(&row(3)[..3], &[200, 10, 10]);
        assert_eq!(&row(5)[21..], &[200, 10, 10]);
    }
}
