//! A smoothed orbit, pan and dolly camera controller for Bevy.
//!
//! Add [`OrbitControlsPlugin`] to your app and an [`OrbitControls`](prelude::OrbitControls)
//! component to a camera entity that also has a [`Transform`](bevy_transform::prelude::Transform)
//! and a [`Projection`](bevy_render::camera::Projection). Commands on the component write an end
//! pose; every frame the plugin eases the camera toward it, frame rate independently.
//!
//! Pointer input is not read by this crate. Decode gestures however your app prefers, and feed
//! them in through [`OrbitControls::begin_drag`](prelude::OrbitControls::begin_drag) and friends,
//! or call the commands directly.
//!
//! The full controller state can be stored and restored as JSON with
//! [`OrbitControls::to_json`](prelude::OrbitControls::to_json) and
//! [`OrbitControls::from_json`](prelude::OrbitControls::from_json).

#![warn(missing_docs)]

mod codec;
pub mod controller;
pub mod error;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_transform::TransformSystem;
use bevy_window::RequestRedraw;

use crate::prelude::*;

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            bounds::BoundsConfig,
            component::{AzimuthInterpolation, OrbitControls, Speeds},
            damping::Damping,
            drag::{ControlEvent, DragKind, DragSettings},
            fit::{Aabb, FitPadding},
            lens::Lens,
            spherical::SphericalPose,
        },
        error::ControlsError,
        OrbitControlsPlugin,
    };
}

/// Updates every camera with an [`OrbitControls`] component once per frame, and forwards the
/// controllers' [`ControlEvent`]s.
pub struct OrbitControlsPlugin;

impl Plugin for OrbitControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ControlEvent>()
            .add_event::<RequestRedraw>()
            .add_systems(
                PostUpdate,
                OrbitControls::update_camera_positions
                    .before(TransformSystem::TransformPropagate),
            )
            .register_type::<OrbitControls>()
            .register_type::<BoundsConfig>()
            .register_type::<Damping>()
            .register_type::<Speeds>()
            .register_type::<DragSettings>()
            .register_type::<DragKind>()
            .register_type::<AzimuthInterpolation>()
            .register_type::<Lens>()
            .register_type::<SphericalPose>();
    }
}
