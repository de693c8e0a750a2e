//! Provides [`SphericalPose`], the orbit representation used by the controller.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use bevy_math::DVec3;
use bevy_reflect::Reflect;

use super::bounds::BoundsConfig;

/// How close the polar angle may get to either pole. At exactly `0` or `PI` the look direction is
/// parallel to the up axis and the camera orientation is undefined.
pub const POLE_EPSILON: f64 = 1e-6;

/// A camera offset from its target in spherical coordinates, Y up.
///
/// `theta` (azimuth) is measured around the Y axis starting from +Z, `phi` (polar) is measured
/// from +Y.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct SphericalPose {
    /// Distance from the target.
    pub radius: f64,
    /// Polar angle in radians, nominally inside `(0, PI)`.
    pub phi: f64,
    /// Azimuth angle in radians. Unbounded in storage, periodic with `TAU`.
    pub theta: f64,
}

impl Default for SphericalPose {
    fn default() -> Self {
        Self {
            radius: 1.0,
            phi: FRAC_PI_2,
            theta: 0.0,
        }
    }
}

impl SphericalPose {
    /// Construct a pose from its components.
    pub fn new(radius: f64, phi: f64, theta: f64) -> Self {
        Self { radius, phi, theta }
    }

    /// The pose of a camera sitting at `offset` relative to its target. A zero offset maps to a
    /// zero pose.
    pub fn from_offset(offset: DVec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    /// The camera offset from its target described by this pose.
    pub fn to_offset(&self) -> DVec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        DVec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep the polar angle off the poles.
    pub fn make_safe(&mut self) -> &mut Self {
        self.phi = self.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self
    }

    /// Interpolate every component independently. The azimuth uses the raw numeric difference, so
    /// poses straddling the `atan2` branch cut rotate the long way around.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            radius: self.radius + (other.radius - self.radius) * t,
            phi: self.phi + (other.phi - self.phi) * t,
            theta: self.theta + (other.theta - self.theta) * t,
        }
    }

    /// Like [`SphericalPose::lerp`], but the azimuth takes the shorter of the two angular paths.
    pub fn lerp_shortest(&self, other: &Self, t: f64) -> Self {
        let mut other = *other;
        other.theta = self.theta + normalize_angle(other.theta - self.theta);
        self.lerp(&other, t)
    }
}

/// Map an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Restore azimuth continuity after `end.theta` was changed from outside.
///
/// The end azimuth is normalized into `(-PI, PI]` as long as that keeps it inside the azimuth
/// bounds. The current azimuth is then shifted by whole turns so it lies within `PI` of the end
/// azimuth, making the damped transition take the shorter path. On an exact half turn the
/// transition keeps the direction of the requested change.
pub fn sanitize(current: &mut SphericalPose, end: &mut SphericalPose, bounds: &BoundsConfig) {
    let requested = end.theta - current.theta;
    let travel = if requested.abs() <= PI {
        requested
    } else {
        normalize_angle(requested)
    };

    let normalized = normalize_angle(end.theta);
    if bounds.clamp_azimuth(normalized) == normalized {
        end.theta = normalized;
    }
    let turns = ((end.theta - current.theta - travel) / TAU).round();
    if turns != 0.0 {
        current.theta += TAU * turns;
    }
}
