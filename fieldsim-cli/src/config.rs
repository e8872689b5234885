use std::path::Path;

use anyhow::{Context, Result};
use fieldsim_core::{Boundary, Region, Scheme, SimulationParams};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    Diffusion,
    Wave,
}

/// Contents of `param.yaml`. Keys the file leaves out keep the demo values.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nx: usize,
    pub ny: usize,
    pub init_xlim: [usize; 2],
    pub init_ylim: [usize; 2],
    pub init_hotvalue: f32,
    pub scheme: SchemeKind,
    pub alpha: f32,
    pub wave_speed: f32,
    pub dt: f32,
    pub step_per_frame: u32,
    pub tick_interval_ms: u64,
    pub boundary: Boundary,
    pub display: DisplayConfig,
}

/// Settings the renderer consumes; the simulation never reads them.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub cmap: String,
    pub clim: [f32; 2],
    pub camera_position: Option<[f32; 3]>,
    pub camera_focal_point: Option<[f32; 3]>,
    pub camera_view_up: Option<[f32; 3]>,
    pub camera_zoom: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nx: 100,
            ny: 100,
            init_xlim: [40, 60],
            init_ylim: [40, 60],
            init_hotvalue: 10.0,
            scheme: SchemeKind::Diffusion,
            alpha: 0.1,
            wave_speed: 1.0,
            dt: 0.1,
            step_per_frame: 5,
            tick_interval_ms: fieldsim_core::params::DEFAULT_TICK_INTERVAL_MS,
            boundary: Boundary::Periodic,
            display: DisplayConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cmap: "viridis".into(),
            clim: [0.0, 10.0],
            camera_position: None,
            camera_focal_point: None,
            camera_view_up: None,
            camera_zoom: 1.0,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid simulation config")
    }

    /// Reads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn params(&self) -> SimulationParams {
        let scheme = match self.scheme {
            SchemeKind::Diffusion => Scheme::Diffusion { alpha: self.alpha },
            SchemeKind::Wave => Scheme::Wave {
                wave_speed: self.wave_speed,
            },
        };
        SimulationParams {
            nx: self.nx,
            ny: self.ny,
            init_region: Region::new(
                self.init_xlim[0],
                self.init_xlim[1],
                self.init_ylim[0],
                self.init_ylim[1],
            ),
            init_value: self.init_hotvalue,
            scheme,
            dt: self.dt,
            sub_steps_per_frame: self.step_per_frame,
            tick_interval_ms: self.tick_interval_ms,
            boundary: self.boundary,
        }
    }
}
