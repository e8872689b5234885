//! Per-run simulation parameters.
//!
//! Set once at startup and never mutated afterwards; `reset` rebuilds the
//! initial field from these values.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::field::{self, Boundary, Field, Region};

/// Default pause between two rendered frames.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Largest stable `alpha * dt` for the explicit 5-point scheme in 2-D.
pub const DIFFUSION_LIMIT: f32 = 0.25;

/// Largest stable Courant number `c * dt` for the 2-D leapfrog scheme.
pub const WAVE_LIMIT: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Which PDE the animation integrates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scheme {
    /// Heat equation, explicit Euler.
    Diffusion { alpha: f32 },
    /// Wave equation, leapfrog.
    Wave { wave_speed: f32 },
}

impl Scheme {
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Diffusion { .. } => "diffusion",
            Scheme::Wave { .. } => "wave",
        }
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::Diffusion { alpha: 0.1 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub nx: usize,
    pub ny: usize,
    pub init_region: Region,
    pub init_value: f32,
    pub scheme: Scheme,
    pub dt: f32,
    pub sub_steps_per_frame: u32,
    pub tick_interval_ms: u64,
    pub boundary: Boundary,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            nx: 100,
            ny: 100,
            init_region: Region::new(40, 60, 40, 60),
            init_value: 10.0,
            scheme: Scheme::default(),
            dt: 0.1,
            sub_steps_per_frame: 5,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            boundary: Boundary::Periodic,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx == 0 || self.ny == 0 {
            return Err(ConfigError::EmptyGrid {
                nx: self.nx,
                ny: self.ny,
            });
        }
        let too_large = self
            .nx
            .checked_mul(self.ny)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
            .is_none_or(|bytes| bytes > isize::MAX as usize);
        if too_large {
            return Err(ConfigError::GridTooLarge {
                nx: self.nx,
                ny: self.ny,
            });
        }
        let r = self.init_region;
        if r.is_empty() {
            return Err(ConfigError::EmptyRegion {
                x0: r.x0,
                x1: r.x1,
                y0: r.y0,
                y1: r.y1,
            });
        }
        if r.x1 > self.nx || r.y1 > self.ny {
            return Err(ConfigError::RegionOutOfBounds {
                x1: r.x1,
                y1: r.y1,
                nx: self.nx,
                ny: self.ny,
            });
        }
        if !self.init_value.is_finite() {
            return Err(ConfigError::InvalidInitValue(self.init_value));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.dt));
        }
        let (name, value) = match self.scheme {
            Scheme::Diffusion { alpha } => ("alpha", alpha),
            Scheme::Wave { wave_speed } => ("wave_speed", wave_speed),
        };
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::InvalidCoefficient { name, value });
        }
        if self.sub_steps_per_frame == 0 {
            return Err(ConfigError::ZeroSubSteps);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The configured hotspot initial condition.
    pub fn initial_field(&self) -> Field {
        field::hotspot(self.nx, self.ny, self.init_region, self.init_value)
    }

    /// Checks the explicit-scheme stability bound for unit grid spacing.
    ///
    /// Returns `None` when the run is inside the bound. Violations are not
    /// rejected: the scheme diverges rather than faults.
    pub fn stability(&self) -> Option<StabilityWarning> {
        let (number, limit) = match self.scheme {
            Scheme::Diffusion { alpha } => (alpha * self.dt, DIFFUSION_LIMIT),
            Scheme::Wave { wave_speed } => (wave_speed * self.dt, WAVE_LIMIT),
        };
        (number > limit).then(|| StabilityWarning {
            scheme: self.scheme.name(),
            number,
            limit,
        })
    }
}

/// A numerical-stability precondition that does not hold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StabilityWarning {
    pub scheme: &'static str,
    pub number: f32,
    pub limit: f32,
}

impl fmt::Display for StabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} step number {:.4} exceeds stability limit {:.4}; the field will diverge",
            self.scheme, self.number, self.limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo() {
        let p = SimulationParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.tick_interval(), Duration::from_millis(100));
        assert!(p.stability().is_none());
        assert_eq!(p.initial_field()[[50, 50]], 10.0);
        assert_eq!(p.initial_field()[[60, 50]], 0.0);
    }

    #[test]
    fn rejects_bad_grid_and_region() {
        let p = SimulationParams {
            nx: 0,
            ..Default::default()
        };
        assert_eq!(p.validate(), Err(ConfigError::EmptyGrid { nx: 0, ny: 100 }));

        let p = SimulationParams {
            init_region: Region::new(5, 5, 0, 3),
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::EmptyRegion { .. })));

        let p = SimulationParams {
            nx: 10,
            ny: 10,
            init_region: Region::new(4, 11, 4, 6),
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ConfigError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn rejects_unallocatable_grid_and_bad_init_value() {
        let p = SimulationParams {
            nx: usize::MAX / 2,
            ny: 3,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ConfigError::GridTooLarge {
                nx: usize::MAX / 2,
                ny: 3
            })
        );
        let p = SimulationParams {
            nx: usize::MAX / 8,
            ny: 1,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::GridTooLarge { .. })));

        let p = SimulationParams {
            init_value: f32::INFINITY,
            ..Default::default()
        };
        assert_eq!(p.validate(), Err(ConfigError::InvalidInitValue(f32::INFINITY)));
        let p = SimulationParams {
            init_value: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidInitValue(_))));
    }

    #[test]
    fn rejects_bad_stepping() {
        let base = SimulationParams {
            nx: 10,
            ny: 10,
            init_region: Region::new(4, 6, 4, 6),
            ..Default::default()
        };
        let p = SimulationParams { dt: 0.0, ..base.clone() };
        assert_eq!(p.validate(), Err(ConfigError::InvalidTimeStep(0.0)));
        let p = SimulationParams { dt: f32::NAN, ..base.clone() };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidTimeStep(_))));

        let p = SimulationParams {
            scheme: Scheme::Wave { wave_speed: -1.0 },
            ..base.clone()
        };
        assert_eq!(
            p.validate(),
            Err(ConfigError::InvalidCoefficient {
                name: "wave_speed",
                value: -1.0
            })
        );

        let p = SimulationParams {
            sub_steps_per_frame: 0,
            ..base.clone()
        };
        assert_eq!(p.validate(), Err(ConfigError::ZeroSubSteps));
        let p = SimulationParams {
            tick_interval_ms: 0,
            ..base
        };
        assert_eq!(p.validate(), Err(ConfigError::ZeroTickInterval));
    }

    #[test]
    fn zero_alpha_is_valid() {
        let p = SimulationParams {
            scheme: Scheme::Diffusion { alpha: 0.0 },
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn stability_bounds() {
        let p = SimulationParams {
            scheme: Scheme::Diffusion { alpha: 3.0 },
            dt: 0.1,
            ..Default::default()
        };
        let w = p.stability().expect("alpha*dt = 0.3 is unstable");
        assert_eq!(w.scheme, "diffusion");
        assert_eq!(w.limit, DIFFUSION_LIMIT);
        assert!(w.to_string().contains("diverge"));

        let p = SimulationParams {
            scheme: Scheme::Wave { wave_speed: 1.0 },
            dt: 0.5,
            ..Default::default()
        };
        assert!(p.stability().is_none());
        let p = SimulationParams {
            scheme: Scheme::Wave { wave_speed: 1.0 },
            dt: 0.8,
            ..Default::default()
        };
        assert!(p.stability().is_some());
    }

    #[test]
    fn deserializes_partial_json() {
        let p: SimulationParams = serde_json::from_str(
            r#"{
                "nx": 10, "ny": 12,
                "init_region": {"x0": 4, "x1": 6, "y0": 4, "y1": 6},
                "scheme": {"kind": "wave", "wave_speed": 0.5}
            }"#,
        )
        .unwrap();
        assert_eq!(p.nx, 10);
        assert_eq!(p.ny, 12);
        assert_eq!(p.scheme, Scheme::Wave { wave_speed: 0.5 });
        assert_eq!(p.sub_steps_per_frame, 5);
        assert_eq!(p.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert!(p.validate().is_ok());
    }
}
