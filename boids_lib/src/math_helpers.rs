use glam::Vec2;

/// Numeric policies the steering rules rely on, on top of glam's `Vec2`.
///
/// glam's own `normalize` produces NaN for the zero vector and the version we
/// are pinned to (nannou needs ^0.17) has no zero-safe variant, so these are
/// implemented here.
pub trait SteerMath {
    /// Unit vector in the same direction, or the vector unchanged if its
    /// length is zero.
    fn safe_normalize(self) -> Self;

    /// Rescales the vector down to `max` if it is longer, never up.
    fn limit(self, max: f32) -> Self;

    fn all_finite(self) -> bool;
}

impl SteerMath for Vec2 {
    #[inline]
    fn safe_normalize(self) -> Self {
        let length = self.length();
        if length > 0. {
            self / length
        } else {
            self
        }
    }

    #[inline]
    fn limit(self, max: f32) -> Self {
        let length = self.length();
        if length > max {
            self.safe_normalize() * max
        } else {
            self
        }
    }

    #[inline]
    fn all_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Unit heading for an angle in radians.
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
