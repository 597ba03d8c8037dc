// src/config.rs
// Simulation settings as they arrive from the command line (clap) or an HTTP body (serde),
// and the range-checked form the rest of the crate consumes.
// Angles cross this boundary in degrees; everything past `validate` is radians.

use crate::error::{SimError, SimResult};
use crate::logic::{Method, TimeGrid};
use crate::math::{PhysicalParameters, State};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Integrator selection as exposed on the CLI and in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    /// Fixed-step classical Runge-Kutta 4
    #[default]
    Rk4,
    /// Adaptive Dormand-Prince 5(4), sampled on the dt grid
    Dopri,
}

impl From<MethodKind> for Method {
    fn from(kind: MethodKind) -> Self {
        match kind {
            MethodKind::Rk4 => Method::Rk4,
            MethodKind::Dopri => Method::dormand_prince(),
        }
    }
}

/// Unchecked settings. Pairs are `Vec`s so both clap and JSON arrays map onto them;
/// `validate` insists on exactly two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct SimulationConfig {
    /// Resolution of the simulation window. [px] Enter in format: --res x y
    #[arg(long, num_args = 2, value_names = ["X", "Y"], default_values_t = [800u32, 800])]
    pub res: Vec<u32>,

    /// Frame rate of the simulation. [fps]
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Length of the simulation. [s]
    #[arg(long, default_value_t = 240.0)]
    pub time: f64,

    /// Length of the smallest step in simulation. [s]
    #[arg(long, default_value_t = 0.01)]
    pub dt: f64,

    /// Scale of the simulation. Scale of 100 means that 1m is equal to 100px.
    #[arg(long, default_value_t = 150.0)]
    pub scale: f64,

    /// Playback speed multiplier. High values skip more trajectory points per frame.
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Number of previous positions to track and show on path. 0 means infinite depth.
    #[arg(long, default_value_t = 50, allow_negative_numbers = true)]
    pub path_depth: i64,

    /// Gravitational acceleration used in simulation. [m/s^2]
    #[arg(long, default_value_t = 9.81, allow_negative_numbers = true)]
    pub ag: f64,

    /// Masses of bodies in pendulum. [kg] Enter in format: --mass M1 M2
    #[arg(long, num_args = 2, value_names = ["M1", "M2"], default_values_t = [1.0, 1.0], allow_negative_numbers = true)]
    pub mass: Vec<f64>,

    /// Lengths of rods in pendulum. [m] Enter in format: --length L1 L2
    #[arg(long, num_args = 2, value_names = ["L1", "L2"], default_values_t = [1.1, 1.0], allow_negative_numbers = true)]
    pub length: Vec<f64>,

    /// Initial angles of bodies in pendulum. [deg] Enter in format: --theta t1 t2
    #[arg(long, num_args = 2, value_names = ["T1", "T2"], default_values_t = [40.0, 160.0], allow_negative_numbers = true)]
    pub theta: Vec<f64>,

    /// Initial angular velocities of bodies in pendulum. [deg/s] Enter in format: --dtheta dt1 dt2
    #[arg(long, num_args = 2, value_names = ["DT1", "DT2"], default_values_t = [0.0, 0.0], allow_negative_numbers = true)]
    pub dtheta: Vec<f64>,

    /// Integration method
    #[arg(long, value_enum, default_value_t = MethodKind::Rk4)]
    pub method: MethodKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            res: vec![800, 800],
            fps: 60,
            time: 240.0,
            dt: 0.01,
            scale: 150.0,
            speed: 1.0,
            path_depth: 50,
            ag: 9.81,
            mass: vec![1.0, 1.0],
            length: vec![1.1, 1.0],
            theta: vec![40.0, 160.0],
            dtheta: vec![0.0, 0.0],
            method: MethodKind::Rk4,
        }
    }
}

fn pair<T: Copy>(values: &[T], what: &str) -> SimResult<(T, T)> {
    match values {
        [a, b] => Ok((*a, *b)),
        _ => Err(SimError::config(format!(
            "{what} takes exactly two values (got {})",
            values.len()
        ))),
    }
}

fn positive(value: f64, what: &str) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::config(format!(
            "{what} must be positive and finite (got {value})"
        )))
    }
}

fn finite(value: f64, what: &str) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::config(format!("{what} must be finite (got {value})")))
    }
}

impl SimulationConfig {
    /// Range-checks every field. Nothing is integrated here, so a bad value fails fast.
    pub fn validate(&self) -> SimResult<ValidatedConfig> {
        let (width, height) = pair(&self.res, "res")?;
        if width == 0 || height == 0 {
            return Err(SimError::config(format!(
                "resolution must be positive (got {width}x{height})"
            )));
        }
        if self.fps == 0 {
            return Err(SimError::config("fps must be positive (got 0)"));
        }
        let scale = positive(self.scale, "scale")?;
        let speed = positive(self.speed, "speed")?;
        let path_depth = usize::try_from(self.path_depth).map_err(|_| {
            SimError::config(format!(
                "path depth must be non-negative (got {})",
                self.path_depth
            ))
        })?;

        let params = PhysicalParameters::new(
            pair(&self.mass, "mass")?,
            pair(&self.length, "length")?,
            self.ag,
        )?;

        let (t1, t2) = pair(&self.theta, "theta")?;
        let (w1, w2) = pair(&self.dtheta, "dtheta")?;
        finite(t1, "theta 1")?;
        finite(t2, "theta 2")?;
        finite(w1, "dtheta 1")?;
        finite(w2, "dtheta 2")?;

        let grid = TimeGrid::new(self.time, self.dt)?;

        Ok(ValidatedConfig {
            resolution: (width, height),
            fps: self.fps,
            grid,
            scale,
            speed,
            path_depth,
            params,
            initial: State::from_degrees((t1, t2), (w1, w2)),
            method: self.method.into(),
        })
    }
}

/// Checked settings. Only obtainable through [`SimulationConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    resolution: (u32, u32),
    fps: u32,
    grid: TimeGrid,
    scale: f64,
    speed: f64,
    path_depth: usize,
    params: PhysicalParameters,
    initial: State,
    method: Method,
}

impl ValidatedConfig {
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn dt(&self) -> f64 {
        self.grid.dt()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn path_depth(&self) -> usize {
        self.path_depth
    }

    pub fn params(&self) -> &PhysicalParameters {
        &self.params
    }

    /// Initial state in radians.
    pub fn initial(&self) -> State {
        self.initial
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Wall-clock pause between displayed frames, whole milliseconds like the window loop uses.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.fps))
    }

    /// Trajectory indices advanced per displayed frame, never less than one.
    pub fn frame_stride(&self) -> usize {
        let stride = (1.0 / f64::from(self.fps) / self.dt() * self.speed * (1.0 + 1e-9)).floor();
        if stride >= 1.0 {
            stride as usize
        } else {
            1
        }
    }
}
