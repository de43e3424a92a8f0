//! Letterbox layout and the mapping from clip rectangles to NDC quads.

use crate::clip::ClipRect;
use crate::comparison::BoundedRegion;

/// Fraction of the letterboxed region width taken by the hover overlay.
const OVERLAY_WIDTH_FRACTION: f32 = 0.45;

/// Axis-aligned rectangle in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Screen-space quad in normalized device coordinates plus the texture
/// subrange it samples. `top > bottom` in NDC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NdcQuad {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl NdcQuad {
    /// A quad with no visible area is skipped rather than drawn.
    pub fn is_degenerate(&self) -> bool {
        self.right - self.left <= f32::EPSILON || self.top - self.bottom <= f32::EPSILON
    }
}

/// Fits an image into the window preserving aspect ratio, centered. The
/// result is the `BoundedRegion` pointer updates are measured against.
/// Degenerate window or image dimensions yield an empty region.
pub fn letterbox(window_w: f32, window_h: f32, image_w: f32, image_h: f32) -> BoundedRegion {
    let usable = [window_w, window_h, image_w, image_h]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0);
    if !usable {
        return BoundedRegion::empty();
    }
    let scale = (window_w / image_w).min(window_h / image_h);
    let width = image_w * scale;
    let height = image_h * scale;
    BoundedRegion::new(
        (window_w - width) / 2.0,
        (window_h - height) / 2.0,
        width,
        height,
    )
}

/// Maps a unit-fraction clip inside the region to window pixels.
pub fn clip_to_pixels(region: &BoundedRegion, clip: &ClipRect) -> PixelRect {
    PixelRect {
        x: region.origin_x + clip.left * region.width,
        y: region.origin_y + clip.top * region.height,
        width: clip.width * region.width,
        height: clip.height * region.height,
    }
}

/// Maps a pixel rectangle to an NDC quad sampling the `uv` subrange of its
/// texture. The clipped before-layer passes its clip both as the pixel rect
/// and as `uv`, so it samples only the visible left portion.
pub fn pixel_rect_to_ndc(rect: &PixelRect, uv: &ClipRect, surface_w: f32, surface_h: f32) -> NdcQuad {
    NdcQuad {
        left: rect.x / surface_w * 2.0 - 1.0,
        top: 1.0 - rect.y / surface_h * 2.0,
        right: (rect.x + rect.width) / surface_w * 2.0 - 1.0,
        bottom: 1.0 - (rect.y + rect.height) / surface_h * 2.0,
        u0: uv.left,
        v0: uv.top,
        u1: uv.left + uv.width,
        v1: uv.top + uv.height,
    }
}

/// 16:9 box centered in the region, used for the hover overlay image.
pub fn overlay_rect(region: &BoundedRegion) -> PixelRect {
    let width = region.width * OVERLAY_WIDTH_FRACTION;
    let height = width * 9.0 / 16.0;
    PixelRect {
        x: region.origin_x + (region.width - width) / 2.0,
        y: region.origin_y + (region.height - height) / 2.0,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_centers_a_wide_image_vertically() {
        // 2:1 image in a square window: full width, half height, centered.
        let region = letterbox(800.0, 800.0, 1000.0, 500.0);
        assert_eq!(region, BoundedRegion::new(0.0, 200.0, 800.0, 400.0));
    }

    #[test]
    fn letterbox_centers_a_tall_image_horizontally() {
        let region = letterbox(800.0, 400.0, 500.0, 1000.0);
        assert_eq!(region, BoundedRegion::new(300.0, 0.0, 200.0, 400.0));
    }

    #[test]
    fn letterbox_rejects_degenerate_inputs() {
        assert!(!letterbox(0.0, 600.0, 100.0, 100.0).is_usable());
        assert!(!letterbox(800.0, 600.0, 0.0, 100.0).is_usable());
        assert!(!letterbox(f32::NAN, 600.0, 100.0, 100.0).is_usable());
    }

    #[test]
    fn full_clip_covers_the_region() {
        let region = BoundedRegion::new(100.0, 50.0, 400.0, 300.0);
        let rect = clip_to_pixels(&region, &ClipRect::FULL);
        assert_eq!(
            rect,
            PixelRect {
                x: 100.0,
                y: 50.0,
                width: 400.0,
                height: 300.0
            }
        );
    }

    #[test]
    fn left_slice_maps_to_left_portion() {
        let region = BoundedRegion::new(100.0, 50.0, 400.0, 300.0);
        let rect = clip_to_pixels(&region, &ClipRect::left_slice(0.25));
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.width, 100.0);
        assert_eq!(rect.height, 300.0);
    }

    #[test]
    fn full_surface_rect_maps_to_full_ndc() {
        let rect = PixelRect {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        };
        let quad = pixel_rect_to_ndc(&rect, &ClipRect::FULL, 800.0, 600.0);
        assert_eq!(quad.left, -1.0);
        assert_eq!(quad.right, 1.0);
        assert_eq!(quad.top, 1.0);
        assert_eq!(quad.bottom, -1.0);
        assert_eq!((quad.u0, quad.v0, quad.u1, quad.v1), (0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn zero_width_clip_is_degenerate() {
        let region = BoundedRegion::new(0.0, 0.0, 400.0, 300.0);
        let rect = clip_to_pixels(&region, &ClipRect::left_slice(0.0));
        let quad = pixel_rect_to_ndc(&rect, &ClipRect::left_slice(0.0), 400.0, 300.0);
        assert!(quad.is_degenerate());
    }

    #[test]
    fn overlay_rect_is_centered_and_16_by_9() {
        let region = BoundedRegion::new(0.0, 0.0, 1600.0, 900.0);
        let rect = overlay_rect(&region);
        assert_eq!(rect.width, 720.0);
        assert_eq!(rect.height, 405.0);
        assert_eq!(rect.x, 440.0);
        assert_eq!(rect.y, 247.5);
    }
}
