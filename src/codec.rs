//! JSON snapshots of an [`OrbitControls`], for persisting a view or sharing it between sessions.

use bevy_log::prelude::*;
use bevy_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::{
    controller::{
        bounds::BoundsConfig,
        component::{OrbitControls, Restored},
    },
    error::ControlsError,
};

/// The wire layout. JSON has no infinity, so unbounded limits travel as `±f64::MAX`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializedState {
    enabled: bool,
    min_distance: f64,
    max_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_zoom: Option<f64>,
    min_polar_angle: f64,
    max_polar_angle: f64,
    min_azimuth_angle: f64,
    max_azimuth_angle: f64,
    damping_factor: f64,
    dragging_damping_factor: f64,
    dolly_speed: f64,
    truck_speed: f64,
    target: [f64; 3],
    position: [f64; 3],
    target0: [f64; 3],
    position0: [f64; 3],
}

fn encode_limit(value: f64) -> f64 {
    if value.is_infinite() {
        f64::MAX.copysign(value)
    } else {
        value
    }
}

fn decode_limit(value: f64) -> f64 {
    if value.abs() >= f64::MAX {
        f64::INFINITY.copysign(value)
    } else {
        value
    }
}

impl OrbitControls {
    /// Serialize the configuration, end target, resolved camera position and reset baseline.
    pub fn to_json(&self) -> Result<String, ControlsError> {
        let bounds = self.bounds();
        let (target0, position0) = self.reset_baseline();
        let state = SerializedState {
            enabled: self.enabled,
            min_distance: encode_limit(bounds.min_distance),
            max_distance: encode_limit(bounds.max_distance),
            min_zoom: Some(encode_limit(bounds.min_zoom)),
            max_zoom: Some(encode_limit(bounds.max_zoom)),
            min_polar_angle: encode_limit(bounds.min_polar_angle),
            max_polar_angle: encode_limit(bounds.max_polar_angle),
            min_azimuth_angle: encode_limit(bounds.min_azimuth_angle),
            max_azimuth_angle: encode_limit(bounds.max_azimuth_angle),
            damping_factor: self.damping.damping_factor,
            dragging_damping_factor: self.damping.dragging_damping_factor,
            dolly_speed: self.speeds.dolly_speed,
            truck_speed: self.speeds.truck_speed,
            target: self.target().to_array(),
            position: self.camera_position().to_array(),
            target0: target0.to_array(),
            position0: position0.to_array(),
        };
        Ok(serde_json::to_string(&state)?)
    }

    /// Restore a snapshot written by [`OrbitControls::to_json`].
    ///
    /// The end pose is rebuilt from the stored position relative to the stored reset target. On
    /// any error the controller is left untouched. Zoom limits missing from the payload keep their
    /// current values.
    pub fn from_json(&mut self, json: &str, enable_transition: bool) -> Result<(), ControlsError> {
        let state: SerializedState = serde_json::from_str(json)?;
        let current = self.bounds();
        let bounds = BoundsConfig {
            min_distance: decode_limit(state.min_distance),
            max_distance: decode_limit(state.max_distance),
            min_zoom: state.min_zoom.map_or(current.min_zoom, decode_limit),
            max_zoom: state.max_zoom.map_or(current.max_zoom, decode_limit),
            min_polar_angle: decode_limit(state.min_polar_angle),
            max_polar_angle: decode_limit(state.max_polar_angle),
            min_azimuth_angle: decode_limit(state.min_azimuth_angle),
            max_azimuth_angle: decode_limit(state.max_azimuth_angle),
        };
        bounds.validate()?;

        for (what, value) in [
            ("damping factor", state.damping_factor),
            ("dragging damping factor", state.dragging_damping_factor),
            ("dolly speed", state.dolly_speed),
            ("truck speed", state.truck_speed),
        ] {
            ControlsError::check_positive(what, value)?;
        }
        let target = DVec3::from_array(state.target);
        let position = DVec3::from_array(state.position);
        let target0 = DVec3::from_array(state.target0);
        let position0 = DVec3::from_array(state.position0);
        for (what, value) in [
            ("target", target),
            ("position", position),
            ("target0", target0),
            ("position0", position0),
        ] {
            ControlsError::check_finite_vec(what, value)?;
        }

        debug!("Restoring orbit controls at {position:?} looking at {target:?}");
        self.restore(
            Restored {
                enabled: state.enabled,
                bounds,
                damping_factor: state.damping_factor,
                dragging_damping_factor: state.dragging_damping_factor,
                dolly_speed: state.dolly_speed,
                truck_speed: state.truck_speed,
                target,
                position,
                target0,
                position0,
            },
            enable_transition,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn configured() -> OrbitControls {
        let position = DVec3::new(1.5, 2.25, 9.0);
        let target = DVec3::new(0.5, 0.0, -1.0);
        let mut controls = OrbitControls::new(position, target)
            .unwrap()
            .with_bounds(BoundsConfig {
                min_distance: 0.75,
                max_distance: 300.0,
                min_polar_angle: 0.1,
                max_polar_angle: 3.0,
                min_azimuth_angle: -2.0,
                ..Default::default()
            })
            .unwrap();
        controls.enabled = false;
        controls.damping.damping_factor = 0.125;
        controls.speeds.truck_speed = 3.5;
        controls.update(Duration::from_millis(16));
        controls
    }

    #[test]
    fn encode_decode_encode_is_exact() {
        let source = configured();
        let json = source.to_json().unwrap();

        let mut restored = OrbitControls::default();
        restored.from_json(&json, false).unwrap();
        assert_eq!(restored.bounds(), source.bounds());
        assert_eq!(restored.damping.damping_factor, 0.125);
        assert_eq!(restored.speeds.truck_speed, 3.5);
        assert!(!restored.enabled);
        assert_eq!(restored.target(), source.target());
        assert_eq!(restored.camera_position(), source.camera_position());
        assert_eq!(restored.to_json().unwrap(), json);
    }

    #[test]
    fn unbounded_limits_survive() {
        let source = OrbitControls::default();
        let json = source.to_json().unwrap();
        assert!(!json.contains("inf") && !json.contains("null"));

        let mut restored = configured();
        restored.from_json(&json, false).unwrap();
        assert_eq!(restored.bounds().max_distance, f64::INFINITY);
        assert_eq!(restored.bounds().min_azimuth_angle, f64::NEG_INFINITY);
        assert_eq!(restored.bounds(), &BoundsConfig::default());
    }

    #[test]
    fn limit_mapping() {
        assert_eq!(encode_limit(f64::NEG_INFINITY), -f64::MAX);
        assert_eq!(decode_limit(f64::MAX), f64::INFINITY);
        assert_eq!(decode_limit(-f64::MAX), f64::NEG_INFINITY);
        assert_eq!(decode_limit(12.0), 12.0);
    }

    #[test]
    fn missing_field_is_malformed_and_state_is_kept() {
        let mut controls = configured();
        let before = controls.to_json().unwrap();
        let result = controls.from_json(r#"{"enabled": true, "minDistance": 1}"#, false);
        assert!(matches!(result, Err(ControlsError::MalformedState(_))));
        assert_eq!(controls.to_json().unwrap(), before);
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let mut controls = configured();
        let json = controls
            .to_json()
            .unwrap()
            .replace("\"dollySpeed\":1.0", "\"dollySpeed\":\"fast\"");
        assert!(matches!(
            controls.from_json(&json, false),
            Err(ControlsError::MalformedState(_))
        ));
    }

    #[test]
    fn non_positive_tuning_is_rejected() {
        let mut controls = configured();
        let before = controls.to_json().unwrap();
        for (from, to) in [
            ("\"dampingFactor\":0.125", "\"dampingFactor\":-1.0"),
            ("\"dampingFactor\":0.125", "\"dampingFactor\":0.0"),
            ("\"draggingDampingFactor\":0.25", "\"draggingDampingFactor\":0.0"),
            ("\"truckSpeed\":3.5", "\"truckSpeed\":-3.5"),
            ("\"dollySpeed\":1.0", "\"dollySpeed\":0.0"),
        ] {
            let json = before.replace(from, to);
            assert_ne!(json, before);
            assert!(
                matches!(
                    controls.from_json(&json, false),
                    Err(ControlsError::NonPositive { .. })
                ),
                "{to} was accepted"
            );
        }
        assert_eq!(controls.to_json().unwrap(), before);

        // The accepted state still converges to a finite pose.
        controls.rotate(1.0, 0.0, true).unwrap();
        for _ in 0..2_000 {
            controls.update(Duration::from_millis(16));
        }
        assert!(controls.pose().theta.is_finite());
        assert_eq!(controls.pose(), controls.end_pose());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut controls = configured();
        let json = controls
            .to_json()
            .unwrap()
            .replace("\"minDistance\":0.75", "\"minDistance\":500.0");
        assert!(matches!(
            controls.from_json(&json, false),
            Err(ControlsError::InvalidBounds { bound: "distance", .. })
        ));
        assert_eq!(controls.bounds().min_distance, 0.75);
    }

    #[test]
    fn zoom_limits_are_optional() {
        let mut controls = OrbitControls::default()
            .with_bounds(BoundsConfig {
                min_zoom: 0.5,
                max_zoom: 4.0,
                ..Default::default()
            })
            .unwrap();
        let json = configured().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("minZoom");
        object.remove("maxZoom");
        controls.from_json(&value.to_string(), false).unwrap();
        assert_eq!(controls.bounds().min_zoom, 0.5);
        assert_eq!(controls.bounds().max_zoom, 4.0);
    }

    #[test]
    fn transition_restore_eases_toward_snapshot() {
        let source = configured();
        let json = source.to_json().unwrap();

        let mut controls = OrbitControls::default();
        controls.update(Duration::from_millis(16));
        controls.from_json(&json, true).unwrap();
        assert_ne!(controls.pose(), controls.end_pose());
        assert_eq!(controls.end_pose(), source.end_pose());
        assert!(controls.update(Duration::from_millis(16)));
    }
}
