//! Provides [`Lens`], the projection capability of the controlled camera.

use std::f64::consts::FRAC_PI_4;

use bevy_log::prelude::*;
use bevy_reflect::Reflect;
use bevy_render::camera::Projection;

/// The projection-side facts the controller needs about its camera.
///
/// Dolly and fit-to-box only make sense with a field of view; commands that need one match on
/// [`Lens::Perspective`] and reject the orthographic variant.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum Lens {
    /// A field-of-view projection.
    Perspective {
        /// Vertical field of view in radians.
        fov: f64,
        /// Width over height of the viewport.
        aspect_ratio: f64,
    },
    /// A parallel projection. Extents are unscaled view-space units.
    Orthographic {
        /// Left edge of the view volume.
        left: f64,
        /// Right edge of the view volume.
        right: f64,
        /// Top edge of the view volume.
        top: f64,
        /// Bottom edge of the view volume.
        bottom: f64,
        /// Magnification. Owned by the controller and written back to the projection.
        zoom: f64,
    },
}

impl Default for Lens {
    fn default() -> Self {
        Self::Perspective {
            fov: FRAC_PI_4,
            aspect_ratio: 1.0,
        }
    }
}

impl Lens {
    /// Is this a field-of-view projection?
    pub fn is_perspective(&self) -> bool {
        matches!(self, Self::Perspective { .. })
    }

    /// The orthographic zoom factor, if any.
    pub fn zoom(&self) -> Option<f64> {
        match self {
            Self::Perspective { .. } => None,
            Self::Orthographic { zoom, .. } => Some(*zoom),
        }
    }

    /// Refresh from a bevy [`Projection`].
    ///
    /// An orthographic zoom already held by the controller wins over the projection's scale, since
    /// the controller is the one writing that scale.
    pub fn sync_from(&mut self, projection: &Projection) {
        match projection {
            Projection::Perspective(perspective) => {
                *self = Self::Perspective {
                    fov: perspective.fov as f64,
                    aspect_ratio: perspective.aspect_ratio as f64,
                };
            }
            Projection::Orthographic(ortho) => {
                let scale = ortho.scale as f64;
                let unscale = |v: f32| {
                    if scale != 0.0 {
                        v as f64 / scale
                    } else {
                        v as f64
                    }
                };
                let zoom = match self {
                    Self::Orthographic { zoom, .. } => *zoom,
                    Self::Perspective { .. } if scale > 0.0 => scale.recip(),
                    Self::Perspective { .. } => 1.0,
                };
                *self = Self::Orthographic {
                    left: unscale(ortho.area.min.x),
                    right: unscale(ortho.area.max.x),
                    top: unscale(ortho.area.max.y),
                    bottom: unscale(ortho.area.min.y),
                    zoom,
                };
            }
            Projection::Custom(_) => {
                warn_once!("Custom projections are not supported.");
            }
        }
    }

    /// Write the controller-owned part of the lens back into a bevy [`Projection`].
    pub fn apply_to(&self, projection: &mut Projection) {
        if let (Self::Orthographic { zoom, .. }, Projection::Orthographic(ortho)) =
            (self, projection)
        {
            if *zoom > 0.0 && zoom.is_finite() {
                ortho.scale = zoom.recip() as f32;
            }
        }
    }
}
