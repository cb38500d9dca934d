//! Brute-force sensing of nearby world objects.
//!
//! Perception always yields a fixed-shape input vector so the decision policy
//! never has to handle variable-length input.

use crate::food::Food;
use crate::geometry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of channels fed to a brain: health fraction, bearing, distance fraction.
pub const PERCEPTION_INPUTS: usize = 3;

/// Distance channel value when nothing is in range.
pub const DISTANCE_SENTINEL: f64 = 1.0;

/// Kinds of object a cell can sense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Food,
}

/// Immutable view of a sensed object taken before any cell moves in a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldObject {
    pub kind: ObjectKind,
    pub id: usize,
    pub position: [f64; 2],
}

impl WorldObject {
    pub fn food(food: &Food) -> Self {
        Self {
            kind: ObjectKind::Food,
            id: food.id(),
            position: food.position(),
        }
    }
}

/// Observer parameters needed for sensing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observer {
    pub position: [f64; 2],
    pub orientation: f64,
    pub vision_range: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum PerceptionError {
    #[error("{kind:?} {id} has non-finite position {position:?}")]
    NonFiniteObject {
        kind: ObjectKind,
        id: usize,
        position: [f64; 2],
    },
    #[error("observer has non-finite position {0:?}")]
    NonFiniteObserver([f64; 2]),
}

/// Summary of what a cell sees this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    /// Signed turning cue in `[-1, 1]`; 0 means dead ahead.
    pub bearing: f64,
    /// Distance to the nearest visible food, if any.
    pub distance: Option<f64>,
}

impl Perception {
    pub const NOTHING: Perception = Perception {
        bearing: 0.0,
        distance: None,
    };

    /// Brain input vector: `[health_fraction, bearing, distance / vision_range]`.
    pub fn to_inputs(&self, health_fraction: f64, vision_range: f64) -> [f64; PERCEPTION_INPUTS] {
        let distance = match self.distance {
            Some(d) if vision_range > 0.0 => (d / vision_range).min(DISTANCE_SENTINEL),
            _ => DISTANCE_SENTINEL,
        };
        [health_fraction, self.bearing, distance]
    }
}

/// Objects strictly closer than `vision_range`, in input order.
pub fn visible_objects<'a>(observer: &Observer, objects: &'a [WorldObject]) -> Vec<&'a WorldObject> {
    objects
        .iter()
        .filter(|o| geometry::distance(observer.position, o.position) < observer.vision_range)
        .collect()
}

/// Closest candidate; the first of several equally close candidates wins.
pub fn nearest<'a>(observer: &Observer, candidates: &[&'a WorldObject]) -> Option<&'a WorldObject> {
    let mut best: Option<(&WorldObject, f64)> = None;
    for &candidate in candidates {
        let d = geometry::distance(observer.position, candidate.position);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }
    best.map(|(o, _)| o)
}

/// Relative bearing to `target` in `[-1, 1]`: 0 ahead, ±1 behind.
pub fn bearing_to(observer: &Observer, target: [f64; 2]) -> f64 {
    let absolute = geometry::heading_to(observer.position, target);
    let orientation = geometry::wrap_orientation(observer.orientation);
    geometry::normalize_bearing(absolute - orientation) / 180.0
}

/// Sense the nearest visible object.
pub fn perceive(observer: &Observer, objects: &[WorldObject]) -> Result<Perception, PerceptionError> {
    if !observer.position.iter().all(|v| v.is_finite()) {
        return Err(PerceptionError::NonFiniteObserver(observer.position));
    }
    if let Some(bad) = objects
        .iter()
        .find(|o| !o.position.iter().all(|v| v.is_finite()))
    {
        return Err(PerceptionError::NonFiniteObject {
            kind: bad.kind,
            id: bad.id,
            position: bad.position,
        });
    }

    let visible = visible_objects(observer, objects);
    let Some(target) = nearest(observer, &visible) else {
        return Ok(Perception::NOTHING);
    };
    match target.kind {
        ObjectKind::Food => Ok(Perception {
            bearing: bearing_to(observer, target.position),
            distance: Some(geometry::distance(observer.position, target.position)),
        }),
    }
}
