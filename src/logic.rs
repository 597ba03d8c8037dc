// src/logic.rs
// Time integration of the double pendulum over a uniform grid 0, dt, 2dt, ..., total_time.
// Two methods are available: classical fixed-step RK4 (default) and an adaptive
// Dormand-Prince 5(4) pair whose internal steps are truncated so every grid point is
// hit exactly. Either way the returned Trajectory holds one state per grid point.

use crate::error::{SimError, SimResult};
use crate::math::{derivative, total_energy, PhysicalParameters, State};
use tracing::debug;

/// Upper bound on grid points, keeps a typo in `--dt` from exhausting memory.
pub const MAX_GRID_POINTS: usize = 50_000_000;

/// Relative slack used when flooring total_time / dt, so 10 / 0.01 gives 1000 steps.
const GRID_EPS: f64 = 1e-9;

/// Numerical method used by [`PendulumSolver::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Method {
    /// Classical Runge-Kutta 4, one step per grid interval.
    #[default]
    Rk4,
    /// Adaptive Dormand-Prince 5(4) with mixed absolute/relative error control.
    DormandPrince { abs_tol: f64, rel_tol: f64 },
}

impl Method {
    pub fn dormand_prince() -> Self {
        Method::DormandPrince {
            abs_tol: 1e-9,
            rel_tol: 1e-9,
        }
    }
}

/// Uniform sampling grid of the simulated horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    dt: f64,
    steps: usize,
}

impl TimeGrid {
    pub fn new(total_time: f64, dt: f64) -> SimResult<Self> {
        if !total_time.is_finite() || total_time <= 0.0 {
            return Err(SimError::config(format!(
                "total time must be positive and finite (got {total_time})"
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::config(format!(
                "dt must be positive and finite (got {dt})"
            )));
        }
        let ratio = total_time / dt;
        let steps = (ratio * (1.0 + GRID_EPS)).floor();
        if steps + 1.0 > MAX_GRID_POINTS as f64 {
            return Err(SimError::config(format!(
                "total time / dt yields {} grid points, limit is {MAX_GRID_POINTS}",
                steps + 1.0
            )));
        }
        Ok(Self {
            dt,
            steps: steps as usize,
        })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of integration intervals.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of grid points, `steps + 1`.
    pub fn len(&self) -> usize {
        self.steps + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn time(&self, k: usize) -> f64 {
        k as f64 * self.dt
    }
}

/// Time-ordered states on a uniform grid. Never mutated once solved.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    states: Vec<State>,
    dt: f64,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&State> {
        self.states.get(i)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn time(&self, i: usize) -> f64 {
        i as f64 * self.dt
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

// Dormand-Prince 5(4) tableau.
#[rustfmt::skip]
const DP_A: [&[f64]; 6] = [
    &[1.0 / 5.0],
    &[3.0 / 40.0, 9.0 / 40.0],
    &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
    &[19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0],
    &[9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
    &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];

// 5th order weights minus embedded 4th order weights.
const DP_E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_SCALE: f64 = 0.2;
const MAX_SCALE: f64 = 5.0;
/// Adaptive steps below `MIN_STEP_FRACTION * dt` are treated as a breakdown.
const MIN_STEP_FRACTION: f64 = 1e-12;

/// Step size multiplier after a Dormand-Prince attempt. A rejected step never grows,
/// even when its error norm looked small (a non-finite candidate).
fn step_factor(err: f64, accepted: bool) -> f64 {
    if !err.is_finite() {
        return MIN_SCALE;
    }
    let scale = (SAFETY * err.max(1e-10).powf(-0.2)).clamp(MIN_SCALE, MAX_SCALE);
    if accepted {
        scale
    } else {
        scale.min(1.0)
    }
}

/// Integrates one double pendulum with fixed physical parameters.
#[derive(Debug, Clone)]
pub struct PendulumSolver {
    params: PhysicalParameters,
    method: Method,
}

impl PendulumSolver {
    pub fn new(params: PhysicalParameters, method: Method) -> Self {
        Self { params, method }
    }

    pub fn deriv(&self, y: &State) -> State {
        derivative(y, &self.params)
    }

    /// y + (dt/6)(k1 + 2k2 + 2k3 + k4)
    fn rk4_step(&self, y: &State, dt: f64) -> State {
        let k1 = self.deriv(y);
        let k2 = self.deriv(&(*y + k1 * (0.5 * dt)));
        let k3 = self.deriv(&(*y + k2 * (0.5 * dt)));
        let k4 = self.deriv(&(*y + k3 * dt));
        *y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
    }

    /// One Dormand-Prince step of size `h`. Returns the 5th order solution and the
    /// scaled error norm (accept when <= 1).
    fn dopri_step(&self, y: &State, h: f64, abs_tol: f64, rel_tol: f64) -> (State, f64) {
        let mut k = [State::default(); 7];
        k[0] = self.deriv(y);
        for (stage, row) in DP_A.iter().enumerate() {
            let mut yi = *y;
            for (j, &a) in row.iter().enumerate() {
                if a != 0.0 {
                    yi = yi + k[j] * (h * a);
                }
            }
            k[stage + 1] = self.deriv(&yi);
        }

        // Last tableau row is the 5th order solution (FSAL layout).
        let mut y_next = *y;
        for (j, &b) in DP_A[5].iter().enumerate() {
            y_next = y_next + k[j] * (h * b);
        }

        let mut err = State::default();
        for (j, &e) in DP_E.iter().enumerate() {
            err = err + k[j] * (h * e);
        }

        let y0 = y.to_array();
        let y1 = y_next.to_array();
        let norm = err
            .to_array()
            .iter()
            .enumerate()
            .map(|(i, e)| e.abs() / (abs_tol + rel_tol * y0[i].abs().max(y1[i].abs())))
            .fold(0.0_f64, |acc, v| {
                if acc.is_nan() || v.is_nan() {
                    f64::NAN
                } else {
                    acc.max(v)
                }
            });
        (y_next, norm)
    }

    /// Integrates across `[t_k, t_k + dt]` adaptively, carrying the step size hint `h`.
    fn dopri_interval(
        &self,
        y: &State,
        dt: f64,
        h: &mut f64,
        abs_tol: f64,
        rel_tol: f64,
    ) -> Option<State> {
        let mut y = *y;
        let mut remaining = dt;
        while remaining > 0.0 {
            let step = h.min(remaining);
            let (candidate, err) = self.dopri_step(&y, step, abs_tol, rel_tol);
            let accepted = err.is_finite() && err <= 1.0 && candidate.is_finite();
            let scale = step_factor(err, accepted);
            if accepted {
                y = candidate;
                // A step truncated to land on the grid says nothing about how large the next one may be.
                *h = if step < *h { h.max(step * scale) } else { step * scale };
                remaining -= step;
            } else {
                *h = step * scale;
            }
            if *h < MIN_STEP_FRACTION * dt {
                return None;
            }
        }
        Some(y)
    }

    /// Runs the integration once over `0..=total_time` with spacing `dt`.
    /// Fails before integrating if the grid is invalid, and returns no trajectory at all
    /// if any grid point comes out non-finite.
    pub fn solve(&self, initial: State, total_time: f64, dt: f64) -> SimResult<Trajectory> {
        let grid = TimeGrid::new(total_time, dt)?;
        self.solve_on(initial, &grid)
    }

    pub fn solve_on(&self, initial: State, grid: &TimeGrid) -> SimResult<Trajectory> {
        if !initial.is_finite() {
            return Err(SimError::Integration { index: 0, time: 0.0 });
        }
        let dt = grid.dt();
        let mut states = Vec::with_capacity(grid.len());
        states.push(initial);

        let mut y = initial;
        let mut h = dt;
        for k in 1..=grid.steps() {
            let next = match self.method {
                Method::Rk4 => Some(self.rk4_step(&y, dt)),
                Method::DormandPrince { abs_tol, rel_tol } => {
                    self.dopri_interval(&y, dt, &mut h, abs_tol, rel_tol)
                }
            };
            y = match next {
                Some(s) if s.is_finite() => s,
                _ => {
                    return Err(SimError::Integration {
                        index: k,
                        time: grid.time(k),
                    })
                }
            };
            states.push(y);
        }

        let e0 = total_energy(&initial, &self.params);
        let drift = states
            .iter()
            .map(|s| (total_energy(s, &self.params) - e0).abs())
            .fold(0.0_f64, f64::max);
        let relative_drift = if e0 != 0.0 { drift / e0.abs() } else { drift };
        debug!(
            method = ?self.method,
            points = states.len(),
            dt,
            max_energy_drift = drift,
            relative_drift,
            "trajectory solved"
        );

        Ok(Trajectory { states, dt })
    }
}
