//! Provides [`BoundsConfig`] settings.

use std::f64::consts::PI;

use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::error::ControlsError;

/// Clamp limits applied to every pose the controller is commanded into.
///
/// Changing these only affects commands issued afterwards; an already stored pose is not
/// re-clamped. Any limit may be infinite to leave that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsConfig {
    /// How close a perspective camera may dolly toward its target.
    pub min_distance: f64,
    /// How far a perspective camera may dolly away from its target.
    pub max_distance: f64,
    /// Smallest zoom factor of an orthographic camera.
    pub min_zoom: f64,
    /// Largest zoom factor of an orthographic camera.
    pub max_zoom: f64,
    /// Lower polar angle limit in radians. `0` looks straight down the up axis.
    pub min_polar_angle: f64,
    /// Upper polar angle limit in radians, at most `PI`.
    pub max_polar_angle: f64,
    /// Lower azimuth limit in radians.
    pub min_azimuth_angle: f64,
    /// Upper azimuth limit in radians.
    pub max_azimuth_angle: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f64::INFINITY,
            min_zoom: 0.0,
            max_zoom: f64::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            min_azimuth_angle: f64::NEG_INFINITY,
            max_azimuth_angle: f64::INFINITY,
        }
    }
}

impl BoundsConfig {
    /// Fails on the first pair of limits whose minimum exceeds its maximum, or where either side is
    /// NaN. An empty range would silently pin every command to one value.
    pub fn validate(&self) -> Result<(), ControlsError> {
        let pairs = [
            ("distance", self.min_distance, self.max_distance),
            ("zoom", self.min_zoom, self.max_zoom),
            ("polar angle", self.min_polar_angle, self.max_polar_angle),
            ("azimuth angle", self.min_azimuth_angle, self.max_azimuth_angle),
        ];
        for (bound, min, max) in pairs {
            // `!(min <= max)` also catches NaN on either side.
            if !(min <= max) {
                return Err(ControlsError::InvalidBounds { bound, min, max });
            }
        }
        if self.min_distance < 0.0 || self.min_zoom < 0.0 {
            let (bound, min, max) = if self.min_distance < 0.0 {
                ("distance", self.min_distance, self.max_distance)
            } else {
                ("zoom", self.min_zoom, self.max_zoom)
            };
            return Err(ControlsError::InvalidBounds { bound, min, max });
        }
        if self.min_polar_angle < 0.0 || self.max_polar_angle > PI {
            return Err(ControlsError::InvalidBounds {
                bound: "polar angle",
                min: self.min_polar_angle,
                max: self.max_polar_angle,
            });
        }
        Ok(())
    }

    /// Clamp an azimuth angle into `[min_azimuth_angle, max_azimuth_angle]`.
    pub fn clamp_azimuth(&self, theta: f64) -> f64 {
        self.min_azimuth_angle.max(self.max_azimuth_angle.min(theta))
    }

    /// Clamp a polar angle into `[min_polar_angle, max_polar_angle]`. This does not apply the pole
    /// safety margin, see [`SphericalPose::make_safe`](super::spherical::SphericalPose::make_safe).
    pub fn clamp_polar(&self, phi: f64) -> f64 {
        self.min_polar_angle.max(self.max_polar_angle.min(phi))
    }

    /// Clamp an orbit radius into `[min_distance, max_distance]`.
    pub fn clamp_radius(&self, radius: f64) -> f64 {
        self.min_distance.max(self.max_distance.min(radius))
    }

    /// Clamp an orthographic zoom factor into `[min_zoom, max_zoom]`.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        self.min_zoom.max(self.max_zoom.min(zoom))
    }
}
