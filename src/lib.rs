//! Double pendulum simulator.
//!
//! The physics core (`math`, `logic`, `transform`, `model`) solves the equations of motion
//! once into an immutable trajectory and answers frame-indexed queries on it. `path` and
//! `playback` drive a renderer through that trajectory, `config` validates settings at the
//! boundary, and `ui` serves the whole thing over HTTP.

pub mod config;
pub mod error;
pub mod logic;
pub mod math;
pub mod model;
pub mod path;
pub mod playback;
pub mod transform;
pub mod ui;

pub use config::{MethodKind, SimulationConfig, ValidatedConfig};
pub use error::{EndOfSimulation, SimError, SimResult};
pub use logic::{Method, PendulumSolver, TimeGrid, Trajectory};
pub use math::{derivative, total_energy, PhysicalParameters, State};
pub use model::PendulumModel;
pub use path::PathHistory;
pub use playback::{Frame, Playback, ScreenPoint};
pub use transform::CartesianPosition;
