//! Split-position state for the before/after comparison.
//!
//! The split fraction is a percentage of container width allocated to the
//! "before" layer. It is always a finite value in `[0, 100]`; every input
//! path clamps rather than rejects.

/// Screen rectangle of the comparison container, in the window's pixel
/// coordinate space. Recomputed every frame from the current letterbox.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundedRegion {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundedRegion {
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Zero-area placeholder used before the first frame has been laid out.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// A region is usable only with finite, strictly positive dimensions.
    /// Degenerate regions never divide.
    pub fn is_usable(&self) -> bool {
        self.origin_x.is_finite()
            && self.origin_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

pub struct ComparisonState {
    split: f32,
}

impl ComparisonState {
    pub const DEFAULT_SPLIT: f32 = 50.0;

    pub fn new(initial: f32) -> Self {
        let mut state = Self {
            split: Self::DEFAULT_SPLIT,
        };
        state.set_fraction(initial);
        state
    }

    /// Recomputes the split from a pointer x-coordinate in the window's
    /// coordinate space. Pointer positions outside the region clamp to the
    /// nearest edge. A degenerate region or a non-finite coordinate keeps
    /// the previous value.
    pub fn update(&mut self, pointer_x: f32, region: &BoundedRegion) {
        if !region.is_usable() || !pointer_x.is_finite() {
            return;
        }
        let local_x = (pointer_x - region.origin_x).clamp(0.0, region.width);
        self.split = (local_x / region.width * 100.0).clamp(0.0, 100.0);
    }

    /// Direct assignment, with the same clamp and finite-coercion rules as
    /// pointer updates.
    pub fn set_fraction(&mut self, value: f32) {
        if value.is_finite() {
            self.split = value.clamp(0.0, 100.0);
        }
    }

    pub fn fraction(&self) -> f32 {
        self.split
    }
}

impl Default for ComparisonState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPLIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_400() -> BoundedRegion {
        BoundedRegion::new(100.0, 0.0, 400.0, 300.0)
    }

    #[test]
    fn update_tracks_pointer_within_region() {
        let mut state = ComparisonState::default();
        state.update(200.0, &region_400());
        assert_eq!(state.fraction(), 25.0);
        state.update(500.0, &region_400());
        assert_eq!(state.fraction(), 100.0);
    }

    #[test]
    fn update_clamps_far_outside_pointers() {
        let mut state = ComparisonState::default();
        state.update(-1000.0, &region_400());
        assert_eq!(state.fraction(), 0.0);
        state.update(1e6, &region_400());
        assert_eq!(state.fraction(), 100.0);
    }

    #[test]
    fn zero_width_region_keeps_previous_value() {
        let mut state = ComparisonState::new(37.5);
        state.update(250.0, &BoundedRegion::new(100.0, 0.0, 0.0, 300.0));
        assert_eq!(state.fraction(), 37.5);
        assert!(state.fraction().is_finite());
    }

    #[test]
    fn negative_and_non_finite_regions_keep_previous_value() {
        let mut state = ComparisonState::new(37.5);
        state.update(250.0, &BoundedRegion::new(100.0, 0.0, -5.0, 300.0));
        assert_eq!(state.fraction(), 37.5);
        state.update(250.0, &BoundedRegion::new(f32::NAN, 0.0, 400.0, 300.0));
        assert_eq!(state.fraction(), 37.5);
    }

    #[test]
    fn non_finite_pointer_keeps_previous_value() {
        let mut state = ComparisonState::new(60.0);
        state.update(f32::NAN, &region_400());
        assert_eq!(state.fraction(), 60.0);
        state.update(f32::INFINITY, &region_400());
        assert_eq!(state.fraction(), 60.0);
    }

    #[test]
    fn set_fraction_clamps_and_coerces() {
        let mut state = ComparisonState::default();
        state.set_fraction(140.0);
        assert_eq!(state.fraction(), 100.0);
        state.set_fraction(-3.0);
        assert_eq!(state.fraction(), 0.0);
        state.set_fraction(f32::NAN);
        assert_eq!(state.fraction(), 0.0);
    }

    #[test]
    fn initial_value_is_clamped() {
        assert_eq!(ComparisonState::new(250.0).fraction(), 100.0);
        assert_eq!(ComparisonState::new(f32::NAN).fraction(), 50.0);
        assert_eq!(ComparisonState::default().fraction(), 50.0);
    }
}
