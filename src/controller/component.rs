//! The primary [`Component`] of the controller, [`OrbitControls`].

use std::{f64::consts::FRAC_PI_2, time::Duration};

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::{prelude::*, DVec3};
use bevy_reflect::prelude::*;
use bevy_render::camera::Projection;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::{
    bounds::BoundsConfig,
    damping::{self, Damping, Step},
    drag::{ControlEvent, DragSession, DragSettings},
    fit::{self, Aabb, FitPadding},
    lens::Lens,
    spherical::{self, SphericalPose},
};
use crate::error::ControlsError;

/// Tracks all state of an orbiting camera: where it is, where it is headed, and the settings
/// that shape the trip.
///
/// The controller keeps two poses. Commands write the *end* pose and target, and
/// [`OrbitControls::update`] eases the *current* pose and target toward them once per frame,
/// resolving the camera position from the current pose. Every command takes an
/// `enable_transition` flag; passing `false` writes the current state as well, cutting straight to
/// the new pose.
///
/// The camera orbits around its target with Y up. Poses are kept in `f64` and converted to a
/// [`Transform`] at the ECS boundary.
///
/// # Moving the Camera
///
/// With the [`OrbitControlsPlugin`](crate::OrbitControlsPlugin) added, call commands on the
/// component from any system, e.g. [`OrbitControls::rotate`] or [`OrbitControls::fit_to`]. The
/// plugin runs [`OrbitControls::update_camera_positions`] every frame to apply them. Pointer input
/// can be routed through the drag methods, see [`OrbitControls::begin_drag`].
#[derive(Debug, Clone, Reflect, Component)]
pub struct OrbitControls {
    /// When false, drag and wheel input is ignored. Programmatic commands keep working.
    pub enabled: bool,
    /// Transition smoothing.
    pub damping: Damping,
    /// Speed multipliers for dolly steps and trucking.
    pub speeds: Speeds,
    /// How pointer drags are turned into commands.
    pub drag: DragSettings,
    /// How [`OrbitControls::lerp_look_at`] interpolates the azimuth.
    pub lerp_azimuth: AzimuthInterpolation,
    /// Projection of the controlled camera. Synced from the camera's [`Projection`] every frame.
    pub lens: Lens,
    bounds: BoundsConfig,
    pose: SphericalPose,
    end_pose: SphericalPose,
    target: DVec3,
    end_target: DVec3,
    /// Resolved camera position, as of the last update.
    position: DVec3,
    /// The point the camera was oriented toward in the last update.
    look_at: DVec3,
    reset_target: DVec3,
    reset_position: DVec3,
    reset_zoom: Option<f64>,
    dirty: bool,
    #[reflect(ignore)]
    pub(super) session: Option<DragSession>,
    #[reflect(ignore)]
    outbox: Vec<ControlEvent>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        let target = DVec3::ZERO;
        let position = DVec3::new(0.0, 0.0, 10.0);
        let mut pose = SphericalPose::from_offset(position - target);
        pose.make_safe();
        Self {
            enabled: true,
            damping: Default::default(),
            speeds: Default::default(),
            drag: Default::default(),
            lerp_azimuth: Default::default(),
            lens: Default::default(),
            bounds: Default::default(),
            pose,
            end_pose: pose,
            target,
            end_target: target,
            position: target + pose.to_offset(),
            look_at: target,
            reset_target: target,
            reset_position: position,
            reset_zoom: None,
            dirty: true,
            session: None,
            outbox: Vec::new(),
        }
    }
}

impl OrbitControls {
    /// Create a controller for a camera at `position` looking at `target`. The current and end
    /// states start out equal, and this pose becomes the reset baseline.
    pub fn new(position: DVec3, target: DVec3) -> Result<Self, ControlsError> {
        ControlsError::check_finite_vec("position", position)?;
        ControlsError::check_finite_vec("target", target)?;
        let mut pose = SphericalPose::from_offset(position - target);
        pose.make_safe();
        Ok(Self {
            pose,
            end_pose: pose,
            target,
            end_target: target,
            position: target + pose.to_offset(),
            look_at: target,
            reset_target: target,
            reset_position: position,
            ..Default::default()
        })
    }

    /// Use the given lens instead of the default perspective one.
    pub fn with_lens(mut self, lens: Lens) -> Self {
        self.reset_zoom = lens.zoom();
        self.lens = lens;
        self
    }

    /// Use the given bounds. Fails if they are inconsistent.
    pub fn with_bounds(mut self, bounds: BoundsConfig) -> Result<Self, ControlsError> {
        self.set_bounds(bounds)?;
        Ok(self)
    }

    /// The clamp limits applied to new commands.
    pub fn bounds(&self) -> &BoundsConfig {
        &self.bounds
    }

    /// Replace the clamp limits. Already stored poses are left as they are.
    pub fn set_bounds(&mut self, bounds: BoundsConfig) -> Result<(), ControlsError> {
        bounds.validate()?;
        self.bounds = bounds;
        Ok(())
    }

    /// The current, partially transitioned pose.
    pub fn pose(&self) -> &SphericalPose {
        &self.pose
    }

    /// The pose the controller is transitioning toward.
    pub fn end_pose(&self) -> &SphericalPose {
        &self.end_pose
    }

    /// The target the controller is transitioning toward.
    pub fn target(&self) -> DVec3 {
        self.end_target
    }

    /// The current, partially transitioned target.
    pub fn current_target(&self) -> DVec3 {
        self.target
    }

    /// The camera position the controller is transitioning toward.
    pub fn position(&self) -> DVec3 {
        self.end_target + self.end_pose.to_offset()
    }

    /// The camera position resolved by the last update.
    pub fn camera_position(&self) -> DVec3 {
        self.position
    }

    /// Has any command changed the end state since the last update?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The camera transform resolved by the last update.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position.as_vec3())
            .looking_at(self.look_at.as_vec3(), Vec3::Y)
    }

    /// Take all control events emitted since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ControlEvent> + '_ {
        self.outbox.drain(..)
    }

    pub(super) fn emit(&mut self, event: ControlEvent) {
        self.outbox.push(event);
    }

    /// Rotate by the given azimuth and polar deltas, in radians, relative to the end pose.
    pub fn rotate(
        &mut self,
        delta_azimuth: f64,
        delta_polar: f64,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        self.rotate_to(
            self.end_pose.theta + delta_azimuth,
            self.end_pose.phi + delta_polar,
            enable_transition,
        )
    }

    /// Rotate to an absolute azimuth and polar angle, in radians, clamped to the bounds.
    pub fn rotate_to(
        &mut self,
        azimuth: f64,
        polar: f64,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        ControlsError::check_finite("azimuth", azimuth)?;
        ControlsError::check_finite("polar angle", polar)?;

        self.end_pose.theta = self.bounds.clamp_azimuth(azimuth);
        self.end_pose.phi = self.bounds.clamp_polar(polar);
        self.end_pose.make_safe();
        spherical::sanitize(&mut self.pose, &mut self.end_pose, &self.bounds);

        if !enable_transition {
            self.pose.theta = self.end_pose.theta;
            self.pose.phi = self.end_pose.phi;
        }
        self.dirty = true;
        Ok(())
    }

    /// Move toward (negative) or away from (positive) the target. Perspective cameras only.
    pub fn dolly(
        &mut self,
        delta_distance: f64,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        self.require_perspective("dolly")?;
        self.dolly_to(self.end_pose.radius + delta_distance, enable_transition)
    }

    /// Set the distance to the target, clamped to the bounds. Perspective cameras only.
    pub fn dolly_to(
        &mut self,
        distance: f64,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        self.require_perspective("dolly_to")?;
        ControlsError::check_finite("distance", distance)?;

        self.end_pose.radius = self.bounds.clamp_radius(distance);
        if !enable_transition {
            self.pose.radius = self.end_pose.radius;
        }
        self.dirty = true;
        Ok(())
    }

    /// One step closer, as from a wheel notch. Orthographic cameras zoom in instead.
    pub fn dolly_in(&mut self) -> Result<(), ControlsError> {
        self.dolly_step(self.speeds.dolly_scale())
    }

    /// One step further away, as from a wheel notch. Orthographic cameras zoom out instead.
    pub fn dolly_out(&mut self) -> Result<(), ControlsError> {
        self.dolly_step(self.speeds.dolly_scale().recip())
    }

    /// Scale the distance by `scale`, or divide the orthographic zoom by it.
    fn dolly_step(&mut self, scale: f64) -> Result<(), ControlsError> {
        if let Lens::Orthographic { zoom, .. } = &mut self.lens {
            *zoom = self.bounds.clamp_zoom(*zoom / scale);
            self.dirty = true;
            return Ok(());
        }
        let radius = self.end_pose.radius;
        self.dolly(radius * scale - radius, true)
    }

    /// Pan the target across the view plane. `x` moves along the camera's right axis, `y` along
    /// its down axis, in world units.
    ///
    /// The axes come from the camera as it was last resolved, since a drag is relative to what is
    /// on screen rather than to where the camera is headed.
    pub fn truck(&mut self, x: f64, y: f64, enable_transition: bool) -> Result<(), ControlsError> {
        ControlsError::check_finite("truck x", x)?;
        ControlsError::check_finite("truck y", y)?;
        let (right, up) = self.view_basis()?;
        self.translate_target(right * x + up * -y, enable_transition);
        Ok(())
    }

    /// Move the target along the horizontal forward direction of the camera.
    pub fn forward(&mut self, distance: f64, enable_transition: bool) -> Result<(), ControlsError> {
        ControlsError::check_finite("forward distance", distance)?;
        let (right, _) = self.view_basis()?;
        self.translate_target(DVec3::Y.cross(right) * distance, enable_transition);
        Ok(())
    }

    /// Move the target to an absolute point.
    pub fn move_to(&mut self, target: DVec3, enable_transition: bool) -> Result<(), ControlsError> {
        ControlsError::check_finite_vec("target", target)?;
        self.end_target = target;
        if !enable_transition {
            self.target = self.end_target;
        }
        self.dirty = true;
        Ok(())
    }

    /// Frame `aabb` with the given padding, looking at it from the front. Perspective cameras
    /// only.
    pub fn fit_to(
        &mut self,
        aabb: Aabb,
        padding: FitPadding,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        let Lens::Perspective { fov, aspect_ratio } = self.lens else {
            return Err(self.unsupported("fit_to"));
        };
        ControlsError::check_finite_vec("box min", aabb.min)?;
        ControlsError::check_finite_vec("box max", aabb.max)?;
        for side in [padding.left, padding.right, padding.top, padding.bottom] {
            ControlsError::check_finite("padding", side)?;
        }

        let size = aabb.size();
        let width = size.x + padding.left + padding.right;
        let height = size.y + padding.top + padding.bottom;
        let distance = fit::required_distance(width, height, size.z, fov, aspect_ratio);
        ControlsError::check_finite("fit distance", distance)?;

        self.dolly_to(distance, enable_transition)?;
        self.move_to(padding.offset_center(aabb.center()), enable_transition)?;
        self.rotate_to(0.0, FRAC_PI_2, enable_transition)
    }

    /// Place the camera at `position`, looking at `target`.
    pub fn set_look_at(
        &mut self,
        position: DVec3,
        target: DVec3,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        ControlsError::check_finite_vec("position", position)?;
        ControlsError::check_finite_vec("target", target)?;

        self.end_target = target;
        self.end_pose = SphericalPose::from_offset(position - target);
        self.settle_end_pose(enable_transition);
        Ok(())
    }

    /// Blend between two camera placements. `t = 0` is placement A, `t = 1` is B.
    ///
    /// The target is interpolated linearly; the pose is interpolated per spherical component, see
    /// [`AzimuthInterpolation`] for how the azimuth is handled.
    pub fn lerp_look_at(
        &mut self,
        position_a: DVec3,
        target_a: DVec3,
        position_b: DVec3,
        target_b: DVec3,
        t: f64,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        for (what, v) in [
            ("position a", position_a),
            ("target a", target_a),
            ("position b", position_b),
            ("target b", target_b),
        ] {
            ControlsError::check_finite_vec(what, v)?;
        }
        ControlsError::check_finite("t", t)?;

        let pose_a = SphericalPose::from_offset(position_a - target_a);
        let pose_b = SphericalPose::from_offset(position_b - target_b);

        self.end_target = target_a.lerp(target_b, t);
        self.end_pose = match self.lerp_azimuth {
            AzimuthInterpolation::Raw => pose_a.lerp(&pose_b, t),
            AzimuthInterpolation::ShortestPath => pose_a.lerp_shortest(&pose_b, t),
        };
        self.settle_end_pose(enable_transition);
        Ok(())
    }

    /// Move the camera to `position`, keeping the end target.
    pub fn set_position(
        &mut self,
        position: DVec3,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        self.set_look_at(position, self.end_target, enable_transition)
    }

    /// Look at `target`, keeping the end camera position.
    pub fn set_target(
        &mut self,
        target: DVec3,
        enable_transition: bool,
    ) -> Result<(), ControlsError> {
        self.set_look_at(self.position(), target, enable_transition)
    }

    /// Return to the placement recorded by [`OrbitControls::save_state`], or the initial one.
    pub fn reset(&mut self, enable_transition: bool) -> Result<(), ControlsError> {
        debug!(
            "Resetting orbit controls to {:?} looking at {:?}",
            self.reset_position, self.reset_target
        );
        self.set_look_at(self.reset_position, self.reset_target, enable_transition)?;
        if let (Some(saved), Lens::Orthographic { zoom, .. }) = (self.reset_zoom, &mut self.lens) {
            *zoom = saved;
        }
        Ok(())
    }

    /// Record the current target, camera position and zoom as the reset baseline.
    pub fn save_state(&mut self) {
        self.reset_target = self.target;
        self.reset_position = self.position;
        self.reset_zoom = self.lens.zoom();
    }

    /// Advance the transition by `elapsed` and resolve the camera position.
    ///
    /// Returns true when anything visible may have changed since the previous update. The dirty
    /// flag is cleared either way.
    pub fn update(&mut self, elapsed: Duration) -> bool {
        let factor = self.damping.factor(elapsed);
        let step = damping::step(
            &mut self.pose,
            &mut self.target,
            &self.end_pose,
            self.end_target,
            factor,
            self.damping.epsilon,
        );
        self.pose.make_safe();

        let position = self.target + self.pose.to_offset();
        let updated = self.dirty
            || step == Step::Converging
            || position != self.position
            || self.target != self.look_at;

        self.position = position;
        self.look_at = self.target;
        self.dirty = false;

        if updated {
            self.emit(ControlEvent::Update);
        }
        updated
    }

    /// Update transforms and projections for all controlled cameras. Called once per frame.
    pub fn update_camera_positions(
        mut cameras: Query<(&mut OrbitControls, &mut Transform, &mut Projection)>,
        mut redraw: EventWriter<RequestRedraw>,
        mut control_events: EventWriter<ControlEvent>,
        time: Res<Time>,
    ) {
        for (mut controls, mut transform, mut projection) in cameras.iter_mut() {
            controls.lens.sync_from(&projection);

            if controls.update(time.delta()) {
                let resolved = controls.transform();
                transform.translation = resolved.translation;
                transform.rotation = resolved.rotation;

                // Only flag the projection when the zoom actually moved, to spare the camera a
                // frustum rebuild every frame.
                let scale_before = match &*projection {
                    Projection::Orthographic(ortho) => Some(ortho.scale),
                    _ => None,
                };
                controls.lens.apply_to(projection.bypass_change_detection());
                if let Projection::Orthographic(ortho) = &*projection {
                    if Some(ortho.scale) != scale_before {
                        projection.set_changed();
                    }
                }
                redraw.write(RequestRedraw);
            }

            control_events.write_batch(controls.drain_events());
        }
    }

    /// Finish an externally written end pose: pole safety, azimuth continuity, and the instant
    /// cut when transitions are disabled.
    fn settle_end_pose(&mut self, enable_transition: bool) {
        self.end_pose.make_safe();
        spherical::sanitize(&mut self.pose, &mut self.end_pose, &self.bounds);
        if !enable_transition {
            self.target = self.end_target;
            self.pose = self.end_pose;
        }
        self.dirty = true;
    }

    fn translate_target(&mut self, offset: DVec3, enable_transition: bool) {
        self.end_target += offset;
        if !enable_transition {
            self.target = self.end_target;
        }
        self.dirty = true;
    }

    /// Right and up axes of the camera as last resolved.
    fn view_basis(&self) -> Result<(DVec3, DVec3), ControlsError> {
        let forward = (self.look_at - self.position)
            .try_normalize()
            .ok_or(ControlsError::DegenerateBasis)?;
        let right = forward
            .cross(DVec3::Y)
            .try_normalize()
            .ok_or(ControlsError::DegenerateBasis)?;
        Ok((right, right.cross(forward)))
    }

    fn require_perspective(&self, operation: &'static str) -> Result<(), ControlsError> {
        if self.lens.is_perspective() {
            Ok(())
        } else {
            Err(self.unsupported(operation))
        }
    }

    fn unsupported(&self, operation: &'static str) -> ControlsError {
        warn!("`{operation}` is not available for an orthographic camera");
        ControlsError::UnsupportedOperation { operation }
    }

    /// Apply a decoded serialized state, see [`crate::codec`].
    pub(crate) fn restore(&mut self, restored: Restored, enable_transition: bool) {
        self.enabled = restored.enabled;
        self.bounds = restored.bounds;
        self.damping.damping_factor = restored.damping_factor;
        self.damping.dragging_damping_factor = restored.dragging_damping_factor;
        self.speeds.dolly_speed = restored.dolly_speed;
        self.speeds.truck_speed = restored.truck_speed;
        self.reset_target = restored.target0;
        self.reset_position = restored.position0;

        self.end_target = restored.target;
        self.end_pose = SphericalPose::from_offset(restored.position - restored.target0);
        self.settle_end_pose(enable_transition);
        if !enable_transition {
            self.position = restored.position;
            self.look_at = self.target;
        }
    }

    pub(crate) fn reset_baseline(&self) -> (DVec3, DVec3) {
        (self.reset_target, self.reset_position)
    }
}

/// Validated contents of a serialized state, ready to be applied.
pub(crate) struct Restored {
    pub enabled: bool,
    pub bounds: BoundsConfig,
    pub damping_factor: f64,
    pub dragging_damping_factor: f64,
    pub dolly_speed: f64,
    pub truck_speed: f64,
    pub target: DVec3,
    pub position: DVec3,
    pub target0: DVec3,
    pub position0: DVec3,
}

/// Speed multipliers for stepped dollying and trucking.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Speeds {
    /// Exponent applied to the per-notch dolly scale of `0.95`.
    pub dolly_speed: f64,
    /// Multiplier on the world distance covered by a truck drag.
    pub truck_speed: f64,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            dolly_speed: 1.0,
            truck_speed: 2.0,
        }
    }
}

impl Speeds {
    /// The factor one dolly-in notch scales the distance by.
    pub fn dolly_scale(&self) -> f64 {
        0.95f64.powf(self.dolly_speed)
    }
}

/// How [`OrbitControls::lerp_look_at`] interpolates between two azimuths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum AzimuthInterpolation {
    /// Interpolate the raw numeric difference. Placements on either side of the azimuth branch
    /// cut (straight behind the target, `-Z`) swing the long way around.
    #[default]
    Raw,
    /// Take the shorter angular path.
    ShortestPath,
}
