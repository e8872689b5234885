//! Play/pause/reset state machine driving the simulation.
//!
//! The controller never sleeps. A tick steps the field, renders it once and
//! tells the host when to come back; scheduling the wake-up is the host's
//! job (see [`crate::timer`] for a ready-made threaded host).
//!
//! Every transition that starts or stops the animation bumps a generation
//! counter. A [`Wakeup`] remembers the generation it was armed in, so a
//! wake-up that was already in flight when the user paused or reset is
//! recognised as stale and does nothing.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::RenderError;
use crate::field::Field;
use crate::simulation::Simulation;

/// Receives each finished frame. Must treat the field as a read-only
/// snapshot.
pub trait Renderer {
    fn update(&mut self, field: &Field) -> Result<(), RenderError>;
}

impl<F> Renderer for F
where
    F: FnMut(&Field) -> Result<(), RenderError>,
{
    fn update(&mut self, field: &Field) -> Result<(), RenderError> {
        self(field)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    #[default]
    Idle,
    Running,
}

/// Permission to run one tick, valid only within the generation it was
/// issued in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wakeup {
    generation: u64,
}

impl Wakeup {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuilds a token from its generation, for hosts that carry it across
    /// an FFI boundary as a plain number.
    pub fn from_generation(generation: u64) -> Self {
        Self { generation }
    }
}

/// What the host should do after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Schedule the next wake-up after this delay.
    Rearm(Duration),
    /// Do not schedule anything.
    Idle,
}

pub struct AnimationController<R> {
    sim: Simulation,
    renderer: R,
    state: ControllerState,
    generation: u64,
    frames: u64,
}

impl<R: Renderer> AnimationController<R> {
    pub fn new(sim: Simulation, renderer: R) -> Self {
        Self {
            sim,
            renderer,
            state: ControllerState::Idle,
            generation: 0,
            frames: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    /// Frames rendered since the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn field(&self) -> &Field {
        self.sim.field()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn tick_interval(&self) -> Duration {
        self.sim.params().tick_interval()
    }

    pub fn play(&mut self) -> bool {
        if self.state == ControllerState::Idle {
            self.enter(ControllerState::Running);
        }
        self.is_running()
    }

    pub fn pause(&mut self) -> bool {
        if self.state == ControllerState::Running {
            self.enter(ControllerState::Idle);
        }
        self.is_running()
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Restores the initial condition and stops, whatever the current state.
    pub fn reset(&mut self) -> bool {
        self.sim.reset();
        self.frames = 0;
        self.enter(ControllerState::Idle);
        info!("simulation reset");
        false
    }

    /// Token for the next tick of the current run, if running.
    pub fn wakeup(&self) -> Option<Wakeup> {
        self.is_running().then_some(Wakeup {
            generation: self.generation,
        })
    }

    /// Runs one tick if `wake` is still current.
    ///
    /// A render failure stops the animation and is returned unchanged.
    pub fn tick(&mut self, wake: Wakeup) -> Result<TickOutcome, RenderError> {
        if !self.is_running() || wake.generation != self.generation {
            debug!(
                wake = wake.generation,
                current = self.generation,
                "stale wake-up ignored"
            );
            return Ok(TickOutcome::Idle);
        }

        let sub_steps = self.sim.params().sub_steps_per_frame;
        self.sim.advance(sub_steps);
        self.frames += 1;
        debug!(frame = self.frames, steps = self.sim.steps(), "tick");

        self.render()?;

        Ok(if self.is_running() {
            TickOutcome::Rearm(self.tick_interval())
        } else {
            TickOutcome::Idle
        })
    }

    /// Pushes the current field to the renderer without stepping.
    ///
    /// A render failure stops a running animation, as it does in `tick`.
    pub fn present(&mut self) -> Result<(), RenderError> {
        self.render()
    }

    fn render(&mut self) -> Result<(), RenderError> {
        let result = self.renderer.update(self.sim.field());
        if let Err(err) = &result {
            warn!(frame = self.frames, error = %err, "renderer failed, stopping animation");
            if self.is_running() {
                self.enter(ControllerState::Idle);
            }
        }
        result
    }

    fn enter(&mut self, state: ControllerState) {
        self.generation += 1;
        if self.state != state {
            info!(from = ?self.state, to = ?state, "animation state changed");
        }
        self.state = state;
    }
}
