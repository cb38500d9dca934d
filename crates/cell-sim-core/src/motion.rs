use crate::cell::{Dna, Kinematics, Location};
use crate::config::{BoundaryPolicy, MotionModel, SimConfig};
use crate::geometry::{self, Arena};

/// Sanitized policy output. Both channels lie in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Decision {
    pub turn: f64,
    pub thrust: f64,
}

fn sanitize(value: Option<&f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
        _ => 0.0,
    }
}

impl Decision {
    pub fn new(turn: f64, thrust: f64) -> Self {
        Self::from_outputs(&[turn, thrust])
    }

    /// Missing or non-finite channels read as zero, the rest are clamped.
    pub fn from_outputs(outputs: &[f64]) -> Self {
        Self {
            turn: sanitize(outputs.first()),
            thrust: sanitize(outputs.get(1)),
        }
    }

    /// Whether `from_outputs` had to alter the raw policy output.
    pub fn was_sanitized(outputs: &[f64]) -> bool {
        outputs.len() < 2
            || outputs[..2]
                .iter()
                .any(|v| !v.is_finite() || !(-1.0..=1.0).contains(v))
    }
}

/// Per-tick integration constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionLimits {
    pub dt: f64,
    pub max_accel: f64,
    pub max_steer_force: f64,
}

impl MotionLimits {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            dt: config.dt,
            max_accel: config.max_accel,
            max_steer_force: config.max_steer_force,
        }
    }
}

/// Integrate one decision. The returned location is not yet bounded to the arena.
pub fn integrate(
    model: MotionModel,
    dna: &Dna,
    location: Location,
    kinematics: Kinematics,
    decision: Decision,
    limits: &MotionLimits,
) -> (Location, Kinematics) {
    match model {
        MotionModel::HeadingVelocity => {
            heading_velocity(dna, location, kinematics, decision, limits)
        }
        MotionModel::DirectDelta => direct_delta(dna, location, decision, limits),
        MotionModel::SeekSteering => seek_steering(dna, location, kinematics, decision, limits),
    }
}

fn heading_velocity(
    dna: &Dna,
    location: Location,
    kinematics: Kinematics,
    decision: Decision,
    limits: &MotionLimits,
) -> (Location, Kinematics) {
    let dt = limits.dt;
    let orientation = geometry::wrap_orientation(
        location.orientation + decision.turn * dna.rotation_speed * dt,
    );
    let speed = (kinematics.speed + decision.thrust * limits.max_accel * dt).clamp(0.0, dna.speed);
    let rad = orientation.to_radians();
    let dx = speed * rad.cos() * dt;
    let dy = speed * rad.sin() * dt;
    (
        Location::new(location.x + dx, location.y + dy, orientation),
        Kinematics {
            speed,
            velocity: [speed * rad.cos(), speed * rad.sin()],
        },
    )
}

fn direct_delta(
    dna: &Dna,
    location: Location,
    decision: Decision,
    limits: &MotionLimits,
) -> (Location, Kinematics) {
    let velocity = [decision.turn * dna.speed, decision.thrust * dna.speed];
    let dx = velocity[0] * limits.dt;
    let dy = velocity[1] * limits.dt;
    let orientation = if dx != 0.0 || dy != 0.0 {
        geometry::wrap_orientation(dy.atan2(dx).to_degrees())
    } else {
        location.orientation
    };
    (
        Location::new(location.x + dx, location.y + dy, orientation),
        Kinematics {
            speed: geometry::length(velocity),
            velocity,
        },
    )
}

fn seek_steering(
    dna: &Dna,
    location: Location,
    kinematics: Kinematics,
    decision: Decision,
    limits: &MotionLimits,
) -> (Location, Kinematics) {
    let dir = geometry::unit_from_heading(location.orientation + decision.turn * 180.0);
    let magnitude = (decision.thrust + 1.0) / 2.0 * dna.speed;
    let desired = [dir[0] * magnitude, dir[1] * magnitude];
    let steer = geometry::clamp_length(
        [
            desired[0] - kinematics.velocity[0],
            desired[1] - kinematics.velocity[1],
        ],
        limits.max_steer_force,
    );
    let velocity = geometry::clamp_length(
        [
            kinematics.velocity[0] + steer[0],
            kinematics.velocity[1] + steer[1],
        ],
        dna.speed,
    );
    let orientation = if velocity != [0.0, 0.0] {
        geometry::wrap_orientation(velocity[1].atan2(velocity[0]).to_degrees())
    } else {
        location.orientation
    };
    (
        Location::new(
            location.x + velocity[0] * limits.dt,
            location.y + velocity[1] * limits.dt,
            orientation,
        ),
        Kinematics {
            speed: geometry::length(velocity),
            velocity,
        },
    )
}

/// Apply the arena boundary. Returns the bounded location and whether the
/// cell left the arena under `BoundaryPolicy::Kill`.
pub fn apply_boundary(policy: BoundaryPolicy, arena: &Arena, location: Location) -> (Location, bool) {
    match policy {
        BoundaryPolicy::Wrap => {
            let [x, y] = arena.wrap(location.position());
            (Location::new(x, y, location.orientation), false)
        }
        BoundaryPolicy::Kill => (location, !arena.contains(location.position())),
    }
}
