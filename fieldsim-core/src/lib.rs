//! Time-stepping engine and animation controller for a scalar field on a
//! 2-D grid.
//!
//! The field evolves under either the heat equation (explicit Euler) or the
//! wave equation (leapfrog), both discretised with a 5-point Laplacian.
//! An [`AnimationController`] decides when the field advances and hands
//! each finished frame to a [`Renderer`].

pub mod adapter;
pub mod controller;
pub mod error;
pub mod field;
pub mod integrator;
pub mod params;
pub mod simulation;
pub mod stencil;
pub mod timer;

pub use controller::{AnimationController, ControllerState, Renderer, TickOutcome, Wakeup};
pub use error::{ConfigError, RenderError};
pub use field::{Boundary, Field, FieldStats, Region};
pub use integrator::{step_diff, step_wave, Diffusion, Integrator, Wave};
pub use params::{Scheme, SimulationParams, StabilityWarning};
pub use simulation::Simulation;
pub use stencil::laplacian;
pub use timer::{AnimationHandle, AnimationLoop, Snapshot};
