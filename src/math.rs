// src/math.rs
// Equations of motion for the planar double pendulum.
// State layout is (θ1, ω1, θ2, ω2): angles in radians, angular velocities in rad/s.
// Angles are measured from the downward vertical, counter-clockwise positive.

use crate::error::{SimError, SimResult};
use std::ops::{Add, Mul};

/// Masses, rod lengths and gravity. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
    m1: f64,
    m2: f64,
    l1: f64,
    l2: f64,
    g: f64,
}

impl PhysicalParameters {
    /// Rejects non-positive masses and lengths so the equations' denominator
    /// `m1 + m2 sin²(θ1 - θ2)` can never vanish.
    pub fn new(masses: (f64, f64), lengths: (f64, f64), g: f64) -> SimResult<Self> {
        let (m1, m2) = masses;
        let (l1, l2) = lengths;
        for (name, value) in [("mass 1", m1), ("mass 2", m2), ("length 1", l1), ("length 2", l2)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::config(format!(
                    "{name} must be positive and finite (got {value})"
                )));
            }
        }
        if !g.is_finite() {
            return Err(SimError::config(format!(
                "gravitational acceleration must be finite (got {g})"
            )));
        }
        Ok(Self { m1, m2, l1, l2, g })
    }

    pub fn masses(&self) -> (f64, f64) {
        (self.m1, self.m2)
    }

    pub fn lengths(&self) -> (f64, f64) {
        (self.l1, self.l2)
    }

    pub fn gravity(&self) -> f64 {
        self.g
    }
}

/// A point in the pendulum's 4-dimensional phase space.
/// The same layout doubles as the derivative vector (θ̇1, θ̈1, θ̇2, θ̈2).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct State {
    pub theta1: f64,
    pub omega1: f64,
    pub theta2: f64,
    pub omega2: f64,
}

impl State {
    pub fn new(theta1: f64, omega1: f64, theta2: f64, omega2: f64) -> Self {
        Self {
            theta1,
            omega1,
            theta2,
            omega2,
        }
    }

    /// Builds a state from angles in degrees and angular velocities in degrees per second.
    pub fn from_degrees(theta_deg: (f64, f64), omega_deg: (f64, f64)) -> Self {
        Self::new(
            theta_deg.0.to_radians(),
            omega_deg.0.to_radians(),
            theta_deg.1.to_radians(),
            omega_deg.1.to_radians(),
        )
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.theta1, self.omega1, self.theta2, self.omega2]
    }

    pub fn from_array(a: [f64; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl Add for State {
    type Output = State;

    fn add(self, rhs: State) -> State {
        State::new(
            self.theta1 + rhs.theta1,
            self.omega1 + rhs.omega1,
            self.theta2 + rhs.theta2,
            self.omega2 + rhs.omega2,
        )
    }
}

impl Mul<f64> for State {
    type Output = State;

    fn mul(self, k: f64) -> State {
        State::new(self.theta1 * k, self.omega1 * k, self.theta2 * k, self.omega2 * k)
    }
}

/// Instantaneous rate of change of `y`. Pure; the system is autonomous so no time argument.
pub fn derivative(y: &State, p: &PhysicalParameters) -> State {
    let PhysicalParameters { m1, m2, l1, l2, g } = *p;
    let State {
        theta1,
        omega1,
        theta2,
        omega2,
    } = *y;

    let (s, c) = (theta1 - theta2).sin_cos();
    let d = m1 + m2 * s * s;
    let w1_sq = omega1 * omega1;
    let w2_sq = omega2 * omega2;

    let alpha1 = (m2 * g * theta2.sin() * c
        - m2 * s * (l1 * w1_sq * c + l2 * w2_sq)
        - (m1 + m2) * g * theta1.sin())
        / (l1 * d);

    let alpha2 = ((m1 + m2) * (l1 * w1_sq * s - g * theta2.sin() + g * theta1.sin() * c)
        + m2 * l2 * w2_sq * s * c)
        / (l2 * d);

    State::new(omega1, alpha1, omega2, alpha2)
}

/// Total mechanical energy (kinetic + potential, pivot at zero height) in joules.
pub fn total_energy(y: &State, p: &PhysicalParameters) -> f64 {
    let PhysicalParameters { m1, m2, l1, l2, g } = *p;
    let kinetic = 0.5 * (m1 + m2) * l1 * l1 * y.omega1 * y.omega1
        + 0.5 * m2 * l2 * l2 * y.omega2 * y.omega2
        + m2 * l1 * l2 * y.omega1 * y.omega2 * (y.theta1 - y.theta2).cos();
    let potential = -(m1 + m2) * g * l1 * y.theta1.cos() - m2 * g * l2 * y.theta2.cos();
    kinetic + potential
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PhysicalParameters {
        PhysicalParameters::new((1.0, 1.0), (1.1, 1.0), 9.81).unwrap()
    }

    #[test]
    fn rest_is_an_equilibrium() {
        let d = derivative(&State::default(), &params());
        assert_eq!(d, State::default());
    }

    #[test]
    fn single_displaced_rod_accelerates_back() {
        // θ1 = θ2 = small positive angle: both bodies swing back toward vertical.
        let y = State::new(0.1, 0.0, 0.1, 0.0);
        let d = derivative(&y, &params());
        assert!(d.omega1 < 0.0);
        assert!(d.omega2.abs() < 1e-12);
    }

    #[test]
    fn matches_hand_evaluated_formula() {
        let p = PhysicalParameters::new((2.0, 0.5), (1.5, 0.8), 9.81).unwrap();
        let y = State::new(0.7, -1.2, -0.4, 2.5);
        let d = derivative(&y, &p);

        let (m1, m2, l1, l2, g) = (2.0_f64, 0.5_f64, 1.5_f64, 0.8_f64, 9.81_f64);
        let s = (0.7_f64 + 0.4).sin();
        let c = (0.7_f64 + 0.4).cos();
        let den = m1 + m2 * s * s;
        let a1 = (m2 * g * (-0.4_f64).sin() * c
            - m2 * s * (l1 * 1.44 * c + l2 * 6.25)
            - (m1 + m2) * g * 0.7_f64.sin())
            / l1
            / den;
        let a2 = ((m1 + m2) * (l1 * 1.44 * s - g * (-0.4_f64).sin() + g * 0.7_f64.sin() * c)
            + m2 * l2 * 6.25 * s * c)
            / l2
            / den;

        assert_eq!(d.theta1, -1.2);
        assert_eq!(d.theta2, 2.5);
        assert!((d.omega1 - a1).abs() < 1e-12);
        assert!((d.omega2 - a2).abs() < 1e-12);
    }

    #[test]
    fn energy_at_rest_is_minimum_potential() {
        let p = params();
        let e = total_energy(&State::default(), &p);
        assert!((e - (-(2.0 * 9.81 * 1.1) - 9.81)).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_mass_and_length() {
        assert!(PhysicalParameters::new((0.0, 1.0), (1.0, 1.0), 9.81).is_err());
        assert!(PhysicalParameters::new((1.0, -1.0), (1.0, 1.0), 9.81).is_err());
        assert!(PhysicalParameters::new((1.0, 1.0), (0.0, 1.0), 9.81).is_err());
        assert!(PhysicalParameters::new((1.0, 1.0), (1.0, f64::NAN), 9.81).is_err());
        assert!(PhysicalParameters::new((1.0, 1.0), (1.0, 1.0), f64::INFINITY).is_err());
    }

    #[test]
    fn degrees_are_converted_to_radians() {
        let y = State::from_degrees((180.0, -90.0), (360.0, 0.0));
        assert!((y.theta1 - std::f64::consts::PI).abs() < 1e-15);
        assert!((y.theta2 + std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        assert!((y.omega1 - 2.0 * std::f64::consts::PI).abs() < 1e-15);
        assert_eq!(y.omega2, 0.0);
    }
}
