use rand::Rng;
use serde::{Deserialize, Serialize};

/// Euclidean distance between two points.
pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Absolute heading from `from` towards `to`, in degrees within `(-180, 180]`.
pub fn heading_to(from: [f64; 2], to: [f64; 2]) -> f64 {
    (to[1] - from[1]).atan2(to[0] - from[0]).to_degrees()
}

/// Bring an angular difference in degrees into `(-180, 180]` with a single
/// ±360 correction. Inputs must already lie in `(-540, 540]`.
pub fn normalize_bearing(degrees: f64) -> f64 {
    if degrees > 180.0 {
        degrees - 360.0
    } else if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

/// Wrap an orientation into `[0, 360)`.
pub fn wrap_orientation(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Unit vector for a heading in degrees.
pub fn unit_from_heading(degrees: f64) -> [f64; 2] {
    let rad = degrees.to_radians();
    [rad.cos(), rad.sin()]
}

pub fn length(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// Scale `v` down so its length does not exceed `max`. Zero vectors pass through.
pub fn clamp_length(v: [f64; 2], max: f64) -> [f64; 2] {
    let len = length(v);
    if len > max && len > 0.0 {
        let scale = max / len;
        [v[0] * scale, v[1] * scale]
    } else {
        v
    }
}

/// Rectangular arena with a spawn margin along every edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Arena {
    pub fn new(width: f64, height: f64, margin: f64) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Uniform point in `[margin, size - margin)` on both axes.
    ///
    /// The caller guarantees `2 * margin < size`; `SimConfig::validate` enforces it.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; 2] {
        [
            rng.random_range(self.margin..self.width - self.margin),
            rng.random_range(self.margin..self.height - self.margin),
        ]
    }

    /// Toroidal wrap onto `[0, width) x [0, height)`.
    pub fn wrap(&self, position: [f64; 2]) -> [f64; 2] {
        [
            position[0].rem_euclid(self.width),
            position[1].rem_euclid(self.height),
        ]
    }

    /// Strict interior test; touching an edge counts as outside.
    pub fn contains(&self, position: [f64; 2]) -> bool {
        position[0] > 0.0
            && position[0] < self.width
            && position[1] > 0.0
            && position[1] < self.height
    }

    /// Whether `position` lies in the spawn region `[margin, size - margin]`.
    pub fn in_spawn_region(&self, position: [f64; 2]) -> bool {
        (self.margin..=self.width - self.margin).contains(&position[0])
            && (self.margin..=self.height - self.margin).contains(&position[1])
    }
}
