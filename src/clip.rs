//! Layer clip derivation for the comparison surface.
//!
//! Clip rectangles are expressed in unit fractions of the container so the
//! renderer can map them to pixels and texture coordinates alike.

use std::path::{Path, PathBuf};

/// The two image resources of one comparison entry. Either side may be
/// missing when the source directories disagree.
#[derive(Clone, Debug, Default)]
pub struct MediaPair {
    pub before: Option<PathBuf>,
    pub after: Option<PathBuf>,
}

impl MediaPair {
    pub fn is_complete(&self) -> bool {
        self.before.is_some() && self.after.is_some()
    }
}

/// Axis-aligned rectangle in unit fractions of the container, `(0, 0)` at
/// the top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ClipRect {
    pub const FULL: ClipRect = ClipRect {
        left: 0.0,
        top: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Left slice of the container covering `fraction` of its width.
    pub fn left_slice(fraction: f32) -> Self {
        ClipRect {
            left: 0.0,
            top: 0.0,
            width: fraction.clamp(0.0, 1.0),
            height: 1.0,
        }
    }
}

/// One paint-ordered layer of the comparison: which image to draw and the
/// portion of the container it occupies.
#[derive(Clone, Debug)]
pub struct LayerClip<'a> {
    pub source: &'a Path,
    pub clip: ClipRect,
}

/// Derives the paint-ordered layers for a split at `fraction` percent.
///
/// The `after` image is the unclipped background; the `before` image sits on
/// top, clipped to the left `fraction`% of the container, so the two compose
/// seamlessly at the boundary. A pair missing either side yields no layers
/// at all; a partial composition is never rendered.
pub fn clip_layers(pair: &MediaPair, fraction: f32) -> Vec<LayerClip<'_>> {
    let (Some(before), Some(after)) = (&pair.before, &pair.after) else {
        return Vec::new();
    };
    let visible = if fraction.is_finite() {
        (fraction / 100.0).clamp(0.0, 1.0)
    } else {
        0.5
    };
    vec![
        LayerClip {
            source: after,
            clip: ClipRect::FULL,
        },
        LayerClip {
            source: before,
            clip: ClipRect::left_slice(visible),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> MediaPair {
        MediaPair {
            before: Some(PathBuf::from("before/kitchen.png")),
            after: Some(PathBuf::from("after/kitchen.png")),
        }
    }

    #[test]
    fn layers_paint_after_below_before() {
        let pair = pair();
        let layers = clip_layers(&pair, 40.0);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].source, Path::new("after/kitchen.png"));
        assert_eq!(layers[0].clip, ClipRect::FULL);
        assert_eq!(layers[1].source, Path::new("before/kitchen.png"));
        assert_eq!(layers[1].clip.left, 0.0);
        assert!((layers[1].clip.width - 0.4).abs() < 1e-6);
        assert_eq!(layers[1].clip.height, 1.0);
    }

    #[test]
    fn boundary_fractions() {
        let pair = pair();
        let at_zero = clip_layers(&pair, 0.0);
        assert_eq!(at_zero[1].clip.width, 0.0);
        let at_full = clip_layers(&pair, 100.0);
        assert_eq!(at_full[1].clip, ClipRect::FULL);
    }

    #[test]
    fn out_of_range_fraction_is_clamped() {
        let pair = pair();
        assert_eq!(clip_layers(&pair, 250.0)[1].clip.width, 1.0);
        assert_eq!(clip_layers(&pair, -10.0)[1].clip.width, 0.0);
    }

    #[test]
    fn missing_either_side_yields_no_layers() {
        let missing_after = MediaPair {
            before: Some(PathBuf::from("img.png")),
            after: None,
        };
        assert!(clip_layers(&missing_after, 50.0).is_empty());

        let missing_before = MediaPair {
            before: None,
            after: Some(PathBuf::from("img.png")),
        };
        assert!(clip_layers(&missing_before, 50.0).is_empty());
        assert!(clip_layers(&MediaPair::default(), 50.0).is_empty());
    }
}
