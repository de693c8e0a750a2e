//! Frame rate independent exponential damping toward a commanded end state.

use std::time::Duration;

use bevy_math::DVec3;
use bevy_reflect::Reflect;

use super::spherical::SphericalPose;

/// Tuning of the damped transition from the current pose to the end pose.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Damping {
    /// Fraction of the remaining distance covered per reference tick, while idle.
    pub damping_factor: f64,
    /// Damping factor swapped in while a drag is active.
    pub dragging_damping_factor: f64,
    /// When every remaining delta is at most this, the transition snaps to its end.
    pub epsilon: f64,
    /// The frame length `damping_factor` is tuned for.
    pub reference_tick: Duration,
}

impl Default for Damping {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            dragging_damping_factor: 0.25,
            epsilon: 0.001,
            reference_tick: Duration::from_millis(16),
        }
    }
}

impl Damping {
    /// The fraction of the remaining distance to cover in a frame lasting `elapsed`.
    pub fn factor(&self, elapsed: Duration) -> f64 {
        let ticks = elapsed.as_secs_f64() / self.reference_tick.as_secs_f64();
        1.0 - (-self.damping_factor * ticks).exp()
    }
}

/// What a single integration step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The remaining deltas were within epsilon; current now equals end exactly.
    Settled,
    /// Current moved toward end and is still approaching.
    Converging,
}

/// Move `pose` and `target` toward `end_pose` and `end_target`.
pub fn step(
    pose: &mut SphericalPose,
    target: &mut DVec3,
    end_pose: &SphericalPose,
    end_target: DVec3,
    factor: f64,
    epsilon: f64,
) -> Step {
    let delta_theta = end_pose.theta - pose.theta;
    let delta_phi = end_pose.phi - pose.phi;
    let delta_radius = end_pose.radius - pose.radius;
    let delta_target = end_target - *target;

    let settled = [delta_theta, delta_phi, delta_radius]
        .into_iter()
        .chain(delta_target.to_array())
        .all(|delta| delta.abs() <= epsilon);

    if settled {
        *pose = *end_pose;
        *target = end_target;
        return Step::Settled;
    }

    pose.radius += delta_radius * factor;
    pose.phi += delta_phi * factor;
    pose.theta += delta_theta * factor;
    *target += delta_target * factor;
    Step::Converging
}
