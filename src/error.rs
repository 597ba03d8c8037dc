// src/error.rs
// Error types shared by the physics core, the playback driver and the HTTP front end.

use thiserror::Error;

/// Failures that stop a simulation from being built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    Configuration { what: String },

    #[error("Integration produced a non-finite state at index {index} (t = {time} s)")]
    Integration { index: usize, time: f64 },
}

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        SimError::Configuration { what: what.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;

/// Returned when a frame index runs past the computed trajectory.
/// This is how playback learns the simulation is over, so it is kept apart from [`SimError`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("End of simulation: index {index} is past the last of {len} frames")]
pub struct EndOfSimulation {
    pub index: usize,
    pub len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_names_field() {
        let err = SimError::config("dt must be positive (got 0)");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: dt must be positive (got 0)"
        );
    }

    #[test]
    fn end_of_simulation_reports_bounds() {
        let end = EndOfSimulation { index: 12, len: 11 };
        let msg = end.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("11"));
    }
}
