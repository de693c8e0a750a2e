//! Turns already-decoded pointer drags into controller commands, and the events emitted along the
//! way.
//!
//! Recognizing gestures from raw mouse or touch input is left to the caller. Once it knows what
//! kind of drag started and where the pointer is, it drives the controller with
//! [`OrbitControls::begin_drag`], [`OrbitControls::drag_to`] and [`OrbitControls::end_drag`].

use std::f64::consts::TAU;

use bevy_ecs::prelude::*;
use bevy_math::DVec2;
use bevy_reflect::prelude::*;

use super::{component::OrbitControls, lens::Lens};
use crate::error::ControlsError;

/// The kind of interaction a drag performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum DragKind {
    /// Mouse orbit.
    Rotate,
    /// Mouse dolly, driven by vertical movement.
    Dolly,
    /// Mouse pan.
    Truck,
    /// One finger orbit.
    TouchRotate,
    /// Two finger pinch.
    TouchDolly,
    /// Three finger pan.
    TouchTruck,
}

/// Emitted synchronously by the controller while it is being operated.
///
/// The plugin forwards these as bevy events every frame; without it, read them with
/// [`OrbitControls::drain_events`].
#[derive(Debug, Clone, PartialEq, Event)]
pub enum ControlEvent {
    /// A drag began.
    Start {
        /// Pointer position in viewport pixels.
        pointer: DVec2,
        /// What the drag does.
        kind: DragKind,
    },
    /// The pointer moved during a drag.
    Sample {
        /// Pointer position in viewport pixels.
        pointer: DVec2,
        /// Movement since the previous sample, previous minus current.
        delta: DVec2,
        /// What the drag does.
        kind: DragKind,
    },
    /// The drag ended.
    End {
        /// What the drag did.
        kind: DragKind,
    },
    /// An update resolved a changed camera.
    Update,
}

/// How pointer movement maps to camera movement.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DragSettings {
    /// Rotate by a fixed angle per pixel, instead of one full turn per viewport width.
    pub fixed_rotation: bool,
    /// Pixels of drag for one full turn, when `fixed_rotation` is set.
    pub fixed_rotation_circumference: f64,
    /// Vertical truck drags move the target forward over the ground instead of up.
    pub vertical_drag_to_forward: bool,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            fixed_rotation: false,
            fixed_rotation_circumference: 500.0,
            vertical_drag_to_forward: false,
        }
    }
}

/// An in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    kind: DragKind,
    last_pointer: DVec2,
    viewport: DVec2,
    pinch_distance: f64,
    saved_damping_factor: f64,
}

impl OrbitControls {
    /// Is a drag in progress?
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Start a drag of the given kind at `pointer`, in a viewport of the given pixel size.
    ///
    /// While dragging, the snappier `dragging_damping_factor` is in effect. Starting a drag while
    /// one is active only switches its kind. Ignored when the controller is disabled.
    pub fn begin_drag(&mut self, kind: DragKind, pointer: DVec2, viewport: DVec2) {
        if !self.enabled {
            return;
        }
        if let Some(session) = &mut self.session {
            session.kind = kind;
            return;
        }
        self.session = Some(DragSession {
            kind,
            last_pointer: pointer,
            viewport,
            pinch_distance: 0.0,
            saved_damping_factor: self.damping.damping_factor,
        });
        self.damping.damping_factor = self.damping.dragging_damping_factor;
        self.emit(ControlEvent::Start { pointer, kind });
    }

    /// Start a two finger pinch. `distance` is the pixel distance between the fingers.
    pub fn begin_pinch(&mut self, pointer: DVec2, distance: f64, viewport: DVec2) {
        self.begin_drag(DragKind::TouchDolly, pointer, viewport);
        if let Some(session) = &mut self.session {
            session.pinch_distance = distance;
        }
    }

    /// Move the dragging pointer to `pointer` and apply the resulting command.
    ///
    /// When the command fails, the pointer is not advanced and the next call measures its delta
    /// from the last accepted position.
    pub fn drag_to(&mut self, pointer: DVec2) -> Result<(), ControlsError> {
        let Some(session) = self.pending(pointer) else {
            return Ok(());
        };
        let delta = session.delta;
        let viewport = session.viewport;

        match session.kind {
            DragKind::Rotate | DragKind::TouchRotate => {
                let (width, height) = if self.drag.fixed_rotation {
                    let circumference = self.drag.fixed_rotation_circumference;
                    (circumference, circumference)
                } else {
                    (viewport.x, viewport.y)
                };
                self.rotate(TAU * delta.x / width, TAU * delta.y / height, true)?;
            }
            DragKind::Truck | DragKind::TouchTruck => self.truck_pixels(delta, viewport)?,
            // Dragging up pulls the camera back, down pushes it in.
            DragKind::Dolly => {
                if delta.y > 0.0 {
                    self.dolly_out()?;
                } else if delta.y < 0.0 {
                    self.dolly_in()?;
                }
            }
            // Pinches carry their own distance, see `pinch_to`.
            DragKind::TouchDolly => (),
        }

        self.commit(pointer, session.pinch_distance);
        self.emit(ControlEvent::Sample {
            pointer,
            delta,
            kind: session.kind,
        });
        Ok(())
    }

    /// Update a pinch: fingers drawing together dolly out, spreading apart dolly in.
    pub fn pinch_to(&mut self, pointer: DVec2, distance: f64) -> Result<(), ControlsError> {
        let Some(session) = self.pending(pointer) else {
            return Ok(());
        };
        let shrink = session.pinch_distance - distance;
        if shrink > 0.0 {
            self.dolly_out()?;
        } else if shrink < 0.0 {
            self.dolly_in()?;
        }

        self.commit(pointer, distance);
        self.emit(ControlEvent::Sample {
            pointer,
            delta: session.delta,
            kind: session.kind,
        });
        Ok(())
    }

    /// End the current drag, restoring the idle damping factor.
    pub fn end_drag(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.damping.damping_factor = session.saved_damping_factor;
        self.emit(ControlEvent::End { kind: session.kind });
    }

    /// A wheel notch. Scrolling up (negative) dollies in.
    pub fn wheel(&mut self, delta_y: f64) -> Result<(), ControlsError> {
        if !self.enabled {
            return Ok(());
        }
        if delta_y < 0.0 {
            self.dolly_in()
        } else if delta_y > 0.0 {
            self.dolly_out()
        } else {
            Ok(())
        }
    }

    /// What moving the pointer to `pointer` would do, without recording it yet.
    fn pending(&self, pointer: DVec2) -> Option<Advanced> {
        if !self.enabled {
            return None;
        }
        let session = self.session.as_ref()?;
        Some(Advanced {
            kind: session.kind,
            delta: session.last_pointer - pointer,
            viewport: session.viewport,
            pinch_distance: session.pinch_distance,
        })
    }

    fn commit(&mut self, pointer: DVec2, pinch_distance: f64) {
        if let Some(session) = &mut self.session {
            session.last_pointer = pointer;
            session.pinch_distance = pinch_distance;
        }
    }

    /// Truck by a pixel delta, so the point under the pointer follows it.
    fn truck_pixels(&mut self, delta: DVec2, viewport: DVec2) -> Result<(), ControlsError> {
        match self.lens {
            Lens::Perspective { fov, .. } => {
                let offset = self.camera_position() - self.current_target();
                // Half the fov spans the screen center to its top edge.
                let target_distance = offset.length() * (fov / 2.0).tan();
                let speed = self.speeds.truck_speed;
                let truck_x = speed * delta.x * target_distance / viewport.y;
                let pedestal_y = speed * delta.y * target_distance / viewport.y;
                if self.drag.vertical_drag_to_forward {
                    self.truck(truck_x, 0.0, true)?;
                    self.forward(-pedestal_y, true)
                } else {
                    self.truck(truck_x, pedestal_y, true)
                }
            }
            Lens::Orthographic {
                left,
                right,
                top,
                bottom,
                zoom,
            } => {
                let truck_x = delta.x * (right - left) / zoom / viewport.x;
                let pedestal_y = delta.y * (top - bottom) / zoom / viewport.y;
                self.truck(truck_x, pedestal_y, true)
            }
        }
    }
}

struct Advanced {
    kind: DragKind,
    delta: DVec2,
    viewport: DVec2,
    pinch_distance: f64,
}

#[cfg(test)]
mod tests {
    use std::{f64::consts::PI, time::Duration};

    use bevy_math::DVec3;

    use super::*;

    const VIEWPORT: DVec2 = DVec2::new(800.0, 600.0);

    fn controls() -> OrbitControls {
        let mut controls = OrbitControls::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO).unwrap();
        controls.update(Duration::from_millis(16));
        controls.drain_events().for_each(drop);
        controls
    }

    #[test]
    fn drag_emits_start_sample_end() {
        let mut controls = controls();
        controls.begin_drag(DragKind::Rotate, DVec2::new(100.0, 100.0), VIEWPORT);
        controls.drag_to(DVec2::new(90.0, 100.0)).unwrap();
        controls.end_drag();

        let events: Vec<_> = controls.drain_events().collect();
        assert_eq!(
            events,
            vec![
                ControlEvent::Start {
                    pointer: DVec2::new(100.0, 100.0),
                    kind: DragKind::Rotate
                },
                ControlEvent::Sample {
                    pointer: DVec2::new(90.0, 100.0),
                    delta: DVec2::new(10.0, 0.0),
                    kind: DragKind::Rotate
                },
                ControlEvent::End {
                    kind: DragKind::Rotate
                },
            ]
        );
    }

    #[test]
    fn dragging_swaps_damping_factor() {
        let mut controls = controls();
        controls.begin_drag(DragKind::Rotate, DVec2::ZERO, VIEWPORT);
        assert_eq!(controls.damping.damping_factor, 0.25);
        // A second begin only switches the kind.
        controls.begin_drag(DragKind::Truck, DVec2::ZERO, VIEWPORT);
        controls.end_drag();
        assert_eq!(controls.damping.damping_factor, 0.05);
        assert!(!controls.is_dragging());
    }

    #[test]
    fn full_width_drag_is_full_turn() {
        let mut controls = controls();
        controls.begin_drag(DragKind::Rotate, DVec2::new(800.0, 0.0), VIEWPORT);
        controls.drag_to(DVec2::new(400.0, 0.0)).unwrap();
        // Half the viewport width is half a turn.
        assert!((controls.end_pose().theta - PI).abs() < 1e-9);
    }

    #[test]
    fn fixed_rotation_uses_circumference() {
        let mut controls = controls();
        controls.drag.fixed_rotation = true;
        controls.begin_drag(DragKind::TouchRotate, DVec2::new(250.0, 0.0), VIEWPORT);
        controls.drag_to(DVec2::new(0.0, 0.0)).unwrap();
        assert!((controls.end_pose().theta - PI).abs() < 1e-9);
    }

    #[test]
    fn truck_drag_scales_with_distance() {
        let mut controls = controls();
        controls.lens = Lens::Perspective {
            fov: PI / 2.0,
            aspect_ratio: 4.0 / 3.0,
        };
        controls.begin_drag(DragKind::Truck, DVec2::new(300.0, 300.0), VIEWPORT);
        controls.drag_to(DVec2::new(270.0, 300.0)).unwrap();
        // 30 px * speed 2 * (10 * tan 45deg) / 600 px = 1 world unit to the right.
        assert!((controls.target() - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn vertical_truck_can_move_forward() {
        let mut controls = controls();
        controls.lens = Lens::Perspective {
            fov: PI / 2.0,
            aspect_ratio: 4.0 / 3.0,
        };
        controls.drag.vertical_drag_to_forward = true;
        controls.begin_drag(DragKind::Truck, DVec2::new(300.0, 300.0), VIEWPORT);
        controls.drag_to(DVec2::new(300.0, 330.0)).unwrap();
        // Dragging down pushes the target away, so the ground follows the pointer.
        assert!((controls.target() - DVec3::new(0.0, 0.0, -1.0)).length() < 1e-9);
    }

    #[test]
    fn orthographic_truck_uses_extents() {
        let mut controls = controls().with_lens(Lens::Orthographic {
            left: -4.0,
            right: 4.0,
            top: 3.0,
            bottom: -3.0,
            zoom: 2.0,
        });
        controls.begin_drag(DragKind::TouchTruck, DVec2::new(100.0, 100.0), VIEWPORT);
        controls.drag_to(DVec2::new(0.0, 100.0)).unwrap();
        // 100 px of an 800 px wide, 8 unit view at 2x zoom.
        assert!((controls.target() - DVec3::new(0.5, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn pinch_dollies() {
        let mut controls = controls();
        controls.begin_pinch(DVec2::ZERO, 100.0, VIEWPORT);
        controls.pinch_to(DVec2::ZERO, 150.0).unwrap();
        assert!(controls.end_pose().radius < 10.0);
        controls.pinch_to(DVec2::ZERO, 50.0).unwrap();
        controls.pinch_to(DVec2::ZERO, 20.0).unwrap();
        assert!(controls.end_pose().radius > 10.0);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut controls = controls();
        controls.enabled = false;
        controls.begin_drag(DragKind::Rotate, DVec2::ZERO, VIEWPORT);
        controls.drag_to(DVec2::new(100.0, 0.0)).unwrap();
        controls.wheel(-1.0).unwrap();
        assert!(!controls.is_dragging());
        assert_eq!(controls.end_pose(), controls.pose());
        assert_eq!(controls.drain_events().count(), 0);
    }

    #[test]
    fn failed_drag_does_not_advance_pointer() {
        let mut controls = controls();
        controls.begin_drag(DragKind::Rotate, DVec2::new(0.0, 100.0), DVec2::ZERO);
        controls.drain_events().for_each(drop);

        assert!(matches!(
            controls.drag_to(DVec2::new(0.0, 90.0)),
            Err(ControlsError::NonFinite { .. })
        ));
        assert_eq!(controls.drain_events().count(), 0);

        // Switching to a dolly drag measures from the last accepted pointer.
        controls.begin_drag(DragKind::Dolly, DVec2::new(0.0, 90.0), DVec2::ZERO);
        controls.drag_to(DVec2::new(0.0, 90.0)).unwrap();
        assert_eq!(
            controls.drain_events().collect::<Vec<_>>(),
            vec![ControlEvent::Sample {
                pointer: DVec2::new(0.0, 90.0),
                delta: DVec2::new(0.0, 10.0),
                kind: DragKind::Dolly
            }]
        );
        assert!(controls.end_pose().radius > 10.0);
    }

    #[test]
    fn wheel_direction() {
        let mut controls = controls();
        controls.wheel(-3.0).unwrap();
        assert!(controls.end_pose().radius < 10.0);
        controls.wheel(0.0).unwrap();
        controls.wheel(3.0).unwrap();
        assert!((controls.end_pose().radius - 10.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_dolly_drag() {
        let mut controls = controls();
        controls.begin_drag(DragKind::Dolly, DVec2::new(0.0, 100.0), VIEWPORT);
        controls.drag_to(DVec2::new(0.0, 90.0)).unwrap();
        assert!(controls.end_pose().radius > 10.0);
        controls.drag_to(DVec2::new(0.0, 120.0)).unwrap();
        controls.drag_to(DVec2::new(0.0, 150.0)).unwrap();
        assert!(controls.end_pose().radius < 10.0);
    }
}
