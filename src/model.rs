// src/model.rs
// PendulumModel: solves once at construction, then answers frame-indexed queries.
// Everything here is read-only after `new`; a different set of parameters means a new model.

use crate::config::ValidatedConfig;
use crate::error::{EndOfSimulation, SimResult};
use crate::logic::{Method, PendulumSolver, Trajectory};
use crate::math::{total_energy, PhysicalParameters, State};
use crate::transform::{to_cartesian, CartesianPosition};
use tracing::info;

/// Radians to degrees, wrapped into [0, 360).
pub fn normalize_degrees(rad: f64) -> f64 {
    let deg = rad.to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

#[derive(Debug, Clone)]
pub struct PendulumModel {
    params: PhysicalParameters,
    trajectory: Trajectory,
    positions: Vec<CartesianPosition>,
}

impl PendulumModel {
    /// Integrates `initial` (radians) over `0..=total_time` and derives cartesian positions.
    /// Blocks until the whole trajectory exists; fails without producing one.
    pub fn new(
        params: PhysicalParameters,
        initial: State,
        total_time: f64,
        dt: f64,
        method: Method,
    ) -> SimResult<Self> {
        let trajectory = PendulumSolver::new(params, method).solve(initial, total_time, dt)?;
        Ok(Self::from_trajectory(params, trajectory))
    }

    pub fn from_config(config: &ValidatedConfig) -> SimResult<Self> {
        let trajectory = PendulumSolver::new(*config.params(), config.method())
            .solve_on(config.initial(), config.grid())?;
        Ok(Self::from_trajectory(*config.params(), trajectory))
    }

    fn from_trajectory(params: PhysicalParameters, trajectory: Trajectory) -> Self {
        let positions = to_cartesian(trajectory.states(), &params);
        info!(
            points = trajectory.len(),
            dt = trajectory.dt(),
            "pendulum model ready"
        );
        Self {
            params,
            trajectory,
            positions,
        }
    }

    fn check(&self, index: usize) -> Result<usize, EndOfSimulation> {
        if index < self.trajectory.len() {
            Ok(index)
        } else {
            Err(EndOfSimulation {
                index,
                len: self.trajectory.len(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }

    pub fn dt(&self) -> f64 {
        self.trajectory.dt()
    }

    pub fn parameters(&self) -> &PhysicalParameters {
        &self.params
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn state(&self, index: usize) -> Result<State, EndOfSimulation> {
        self.check(index).map(|i| self.trajectory.states()[i])
    }

    pub fn time(&self, index: usize) -> Result<f64, EndOfSimulation> {
        self.check(index).map(|i| self.trajectory.time(i))
    }

    /// Total mechanical energy at `index`, joules.
    pub fn energy(&self, index: usize) -> Result<f64, EndOfSimulation> {
        self.state(index).map(|s| total_energy(&s, &self.params))
    }

    /// Raw positions in meters.
    pub fn positions(&self, index: usize) -> Result<CartesianPosition, EndOfSimulation> {
        self.check(index).map(|i| self.positions[i])
    }

    /// Positions multiplied by `scale` pixels per meter.
    pub fn scaled_positions(
        &self,
        index: usize,
        scale: f64,
    ) -> Result<CartesianPosition, EndOfSimulation> {
        self.positions(index).map(|p| p.scaled(scale))
    }

    /// (θ1, θ2) in degrees, each wrapped into [0, 360).
    pub fn angles(&self, index: usize) -> Result<(f64, f64), EndOfSimulation> {
        self.state(index)
            .map(|s| (normalize_degrees(s.theta1), normalize_degrees(s.theta2)))
    }

    /// (θ̇1, θ̇2) in degrees per second, not wrapped.
    pub fn angular_velocities(&self, index: usize) -> Result<(f64, f64), EndOfSimulation> {
        self.state(index)
            .map(|s| (s.omega1.to_degrees(), s.omega2.to_degrees()))
    }
}
