// src/transform.rs
// Angular state -> planar cartesian positions. Pivot at the origin, y pointing up,
// so a hanging pendulum has negative y.

use crate::math::{PhysicalParameters, State};
use serde::Serialize;

/// Positions of both bodies, (x1, y1, x2, y2).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CartesianPosition {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CartesianPosition {
    /// Raw positions in meters.
    pub fn from_state(state: &State, params: &PhysicalParameters) -> Self {
        let (l1, l2) = params.lengths();
        let x1 = l1 * state.theta1.sin();
        let y1 = -l1 * state.theta1.cos();
        let x2 = x1 + l2 * state.theta2.sin();
        let y2 = y1 - l2 * state.theta2.cos();
        Self { x1, y1, x2, y2 }
    }

    /// A copy multiplied by `scale` (pixels per meter); `self` is left untouched.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            x1: self.x1 * scale,
            y1: self.y1 * scale,
            x2: self.x2 * scale,
            y2: self.y2 * scale,
        }
    }

    pub fn to_tuple(self) -> (f64, f64, f64, f64) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

/// Cartesian positions for every state, index-aligned with the input.
pub fn to_cartesian(states: &[State], params: &PhysicalParameters) -> Vec<CartesianPosition> {
    states
        .iter()
        .map(|s| CartesianPosition::from_state(s, params))
        .collect()
}
