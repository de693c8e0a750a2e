//! Framing a bounding box in a perspective view.

use bevy_math::DVec3;
use bevy_reflect::Reflect;

/// An axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// Build a box from two corners, in any order.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The smallest box containing every point. `None` when there are no points.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |aabb, p| Self {
            min: aabb.min.min(p),
            max: aabb.max.max(p),
        }))
    }

    /// Center point.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

/// Extra world-space margin around a framed box, per screen edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct FitPadding {
    /// Margin added on the left of the box.
    pub left: f64,
    /// Margin added on the right of the box.
    pub right: f64,
    /// Margin added above the box.
    pub top: f64,
    /// Margin added below the box.
    pub bottom: f64,
}

impl FitPadding {
    /// The same margin on every edge.
    pub fn uniform(padding: f64) -> Self {
        Self {
            left: padding,
            right: padding,
            top: padding,
            bottom: padding,
        }
    }

    /// Where the camera target goes so the padded box is centered on screen.
    pub(crate) fn offset_center(&self, center: DVec3) -> DVec3 {
        DVec3::new(
            center.x - (self.left * 0.5 - self.right * 0.5),
            center.y + (self.top * 0.5 - self.bottom * 0.5),
            center.z,
        )
    }
}

/// The orbit radius at which a `width` x `height` rectangle, `depth` deep, fills a perspective
/// view with vertical field of view `fov` (radians) and the given `aspect` ratio.
///
/// Whichever of the two dimensions hits the frustum first decides the distance.
pub fn required_distance(width: f64, height: f64, depth: f64, fov: f64, aspect: f64) -> f64 {
    let height_to_fit = if width / height < aspect {
        height
    } else {
        width / aspect
    };
    height_to_fit * 0.5 / (fov * 0.5).tan() + depth * 0.5
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn unit_square_at_right_angle_fov() {
        let distance = required_distance(2.0, 2.0, 0.0, FRAC_PI_2, 1.0);
        assert!((distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wide_box_is_width_limited() {
        // 4 wide, 1 tall, on a square viewport: the width decides.
        let wide = required_distance(4.0, 1.0, 0.0, FRAC_PI_2, 1.0);
        let square = required_distance(4.0, 4.0, 0.0, FRAC_PI_2, 1.0);
        assert!((wide - square).abs() < 1e-12);
    }

    #[test]
    fn depth_pushes_camera_back_by_half() {
        let flat = required_distance(2.0, 2.0, 0.0, FRAC_PI_2, 1.0);
        let deep = required_distance(2.0, 2.0, 6.0, FRAC_PI_2, 1.0);
        assert!((deep - flat - 3.0).abs() < 1e-12);
    }

    #[test]
    fn box_from_points() {
        let aabb = Aabb::from_points([
            DVec3::new(1.0, -2.0, 0.0),
            DVec3::new(-1.0, 4.0, 2.0),
            DVec3::new(0.0, 0.0, -2.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, -2.0));
        assert_eq!(aabb.max, DVec3::new(1.0, 4.0, 2.0));
        assert_eq!(aabb.center(), DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(aabb.size(), DVec3::new(2.0, 6.0, 4.0));
        assert!(Aabb::from_points([]).is_none());
    }

    #[test]
    fn asymmetric_padding_shifts_center() {
        let padding = FitPadding {
            left: 2.0,
            right: 0.0,
            top: 0.0,
            bottom: 4.0,
        };
        let center = padding.offset_center(DVec3::ZERO);
        assert_eq!(center, DVec3::new(-1.0, -2.0, 0.0));
    }
}
