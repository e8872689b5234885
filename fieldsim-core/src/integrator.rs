//! Explicit time integrators built on the 5-point stencil.
//!
//! `step_diff` and `step_wave` are the pure update rules. The
//! [`Integrator`] trait wraps them as selectable strategies; the wave
//! strategy additionally carries the previous time level between calls.

use crate::field::{Boundary, Field};
use crate::params::{Scheme, SimulationParams};
use crate::stencil::laplacian;

/// One explicit Euler step of the heat equation:
/// `u + dt * alpha * Laplacian(u)`.
pub fn step_diff(u: &Field, alpha: f32, dt: f32, boundary: Boundary) -> Field {
    let k = dt * alpha;
    let mut next = laplacian(u, boundary);
    next.zip_mut_with(u, |l, &v| *l = v + k * *l);
    next
}

/// One leapfrog step of the wave equation:
/// `2 * u_curr - u_prev + (c * dt)^2 * Laplacian(u_curr)`.
///
/// Passing `u_prev == u_curr` starts from rest.
pub fn step_wave(u_curr: &Field, u_prev: &Field, c: f32, dt: f32, boundary: Boundary) -> Field {
    assert_eq!(u_curr.dim(), u_prev.dim(), "wave history shape mismatch");
    let k = (c * dt) * (c * dt);
    let mut next = laplacian(u_curr, boundary);
    ndarray::Zip::from(&mut next)
        .and(u_curr)
        .and(u_prev)
        .for_each(|l, &cur, &prev| *l = 2.0 * cur - prev + k * *l);
    next
}

/// A time-stepping strategy.
///
/// `advance` consumes the current field and returns the next one; the
/// caller never sees a partially updated buffer.
pub trait Integrator: Send {
    fn name(&self) -> &'static str;

    fn advance(&mut self, u: Field) -> Field;

    /// Forgets any history carried between steps.
    fn reset(&mut self);
}

#[derive(Clone, Debug)]
pub struct Diffusion {
    alpha: f32,
    dt: f32,
    boundary: Boundary,
}

impl Diffusion {
    pub fn new(alpha: f32, dt: f32, boundary: Boundary) -> Self {
        Self {
            alpha,
            dt,
            boundary,
        }
    }
}

impl Integrator for Diffusion {
    fn name(&self) -> &'static str {
        "diffusion"
    }

    fn advance(&mut self, u: Field) -> Field {
        step_diff(&u, self.alpha, self.dt, self.boundary)
    }

    fn reset(&mut self) {}
}

/// Leapfrog wave strategy.
///
/// Holds the previous time level; once stepping has begun it lags the
/// current field by exactly one step.
#[derive(Clone, Debug)]
pub struct Wave {
    wave_speed: f32,
    dt: f32,
    boundary: Boundary,
    prev: Option<Field>,
}

impl Wave {
    pub fn new(wave_speed: f32, dt: f32, boundary: Boundary) -> Self {
        Self {
            wave_speed,
            dt,
            boundary,
            prev: None,
        }
    }

    pub fn previous(&self) -> Option<&Field> {
        self.prev.as_ref()
    }
}

impl Integrator for Wave {
    fn name(&self) -> &'static str {
        "wave"
    }

    fn advance(&mut self, u: Field) -> Field {
        let next = match &self.prev {
            Some(prev) => step_wave(&u, prev, self.wave_speed, self.dt, self.boundary),
            // no history yet: zero initial velocity
            None => step_wave(&u, &u, self.wave_speed, self.dt, self.boundary),
        };
        self.prev = Some(u);
        next
    }

    fn reset(&mut self) {
        self.prev = None;
    }
}

/// Builds the strategy selected by `params.scheme`.
pub fn from_params(params: &SimulationParams) -> Box<dyn Integrator> {
    match params.scheme {
        Scheme::Diffusion { alpha } => Box::new(Diffusion::new(alpha, params.dt, params.boundary)),
        Scheme::Wave { wave_speed } => {
            Box::new(Wave::new(wave_speed, params.dt, params.boundary))
        }
    }
}
