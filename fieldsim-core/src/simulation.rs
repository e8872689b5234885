//! The owned simulation state: parameters, initial condition, current field
//! and the active integrator.

use tracing::{info, warn};

use crate::error::ConfigError;
use crate::field::{Field, FieldStats};
use crate::integrator::{self, Integrator};
use crate::params::SimulationParams;

pub struct Simulation {
    params: SimulationParams,
    initial: Field,
    field: Field,
    integrator: Box<dyn Integrator>,
    steps: u64,
}

impl Simulation {
    /// Starts from the configured hotspot.
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let initial = params.initial_field();
        Ok(Self::build(params, initial))
    }

    /// Starts from a caller-generated initial condition. `reset` restores
    /// this field rather than the configured hotspot.
    pub fn with_initial_field(params: SimulationParams, initial: Field) -> Result<Self, ConfigError> {
        params.validate()?;
        let expected = (params.nx, params.ny);
        if initial.dim() != expected {
            return Err(ConfigError::ShapeMismatch {
                expected,
                found: initial.dim(),
            });
        }
        Ok(Self::build(params, initial))
    }

    fn build(params: SimulationParams, initial: Field) -> Self {
        if let Some(w) = params.stability() {
            warn!(scheme = w.scheme, number = w.number, limit = w.limit, "{w}");
        }
        let integrator = integrator::from_params(&params);
        info!(
            nx = params.nx,
            ny = params.ny,
            scheme = integrator.name(),
            dt = params.dt,
            sub_steps = params.sub_steps_per_frame,
            "simulation created"
        );
        Self {
            field: initial.clone(),
            initial,
            integrator,
            params,
            steps: 0,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn initial(&self) -> &Field {
        &self.initial
    }

    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    /// Integrator steps taken since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats::of(&self.field)
    }

    /// One integrator step.
    pub fn step(&mut self) {
        let u = std::mem::take(&mut self.field);
        self.field = self.integrator.advance(u);
        self.steps += 1;
    }

    /// `n` steps in sequence, each consuming the previous one's output.
    pub fn advance(&mut self, n: u32) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Restores the initial field bit-for-bit and drops integrator history.
    pub fn reset(&mut self) {
        self.field = self.initial.clone();
        self.integrator.reset();
        self.steps = 0;
    }
}
