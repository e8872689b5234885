use fieldsim_core::adapter::flatten_column_major;
use fieldsim_core::{
    AnimationController, Field, RenderError, Renderer, Simulation, SimulationParams, TickOutcome,
    Wakeup,
};
use wasm_bindgen::prelude::*;

/// Keeps the last rendered frame, column-major, for the page to copy out.
#[derive(Default)]
struct FrameBuffer {
    data: Vec<f32>,
}

impl Renderer for FrameBuffer {
    fn update(&mut self, field: &Field) -> Result<(), RenderError> {
        self.data = flatten_column_major(field);
        Ok(())
    }
}

/// Browser host. The page drives the timer: after `play()` it calls
/// `setTimeout(() => anim.tick(token), anim.interval_ms())` with the token
/// from `wakeup()`, and re-arms with `next_ms` while that is non-negative.
#[wasm_bindgen]
pub struct Animation {
    inner: AnimationController<FrameBuffer>,
}

#[wasm_bindgen]
impl Animation {
    /// `config` is a JSON object with the simulation parameters; missing
    /// keys take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str) -> Result<Animation, JsValue> {
        let params: SimulationParams =
            serde_json::from_str(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let sim = Simulation::new(params).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut inner = AnimationController::new(sim, FrameBuffer::default());
        inner
            .present()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Animation { inner })
    }

    // Controls
    pub fn play(&mut self) -> bool { self.inner.play() }
    pub fn pause(&mut self) -> bool { self.inner.pause() }
    pub fn toggle(&mut self) -> bool { self.inner.toggle() }

    /// Restores the initial field and re-renders it; always stops.
    pub fn reset(&mut self) -> Result<bool, JsValue> {
        let running = self.inner.reset();
        self.inner
            .present()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(running)
    }

    pub fn running(&self) -> bool { self.inner.is_running() }
    pub fn frames(&self) -> f64 { self.inner.frames() as f64 }
    pub fn interval_ms(&self) -> f64 { self.inner.tick_interval().as_secs_f64() * 1000.0 }

    pub fn nx(&self) -> usize { self.inner.simulation().params().nx }
    pub fn ny(&self) -> usize { self.inner.simulation().params().ny }

    /// Token for the next `tick`, or -1 when idle.
    pub fn wakeup(&self) -> f64 {
        self.inner
            .wakeup()
            .map_or(-1.0, |w| w.generation() as f64)
    }

    // Step + timing (WASM-only)
    pub fn tick(&mut self, token: f64) -> Result<TickInfo, JsValue> {
        if token < 0.0 {
            return Ok(TickInfo::idle(self.inner.frames()));
        }
        let t0 = now_ms();
        let outcome = self
            .inner
            .tick(Wakeup::from_generation(token as u64))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let t1 = now_ms();
        let next_ms = match outcome {
            TickOutcome::Rearm(d) => d.as_secs_f64() * 1000.0,
            TickOutcome::Idle => -1.0,
        };
        Ok(TickInfo {
            next_ms,
            compute_ms: t1 - t0,
            frame: self.inner.frames() as f64,
        })
    }

    // Copy-based JS access (reliable)
    pub fn field(&self) -> Vec<f32> {
        self.inner.renderer().data.clone()
    }
}

#[wasm_bindgen]
pub struct TickInfo {
    next_ms: f64,
    compute_ms: f64,
    frame: f64,
}

impl TickInfo {
    fn idle(frames: u64) -> Self {
        TickInfo { next_ms: -1.0, compute_ms: 0.0, frame: frames as f64 }
    }
}

#[wasm_bindgen]
impl TickInfo {
    /// Delay before the next tick, negative when the page should stop.
    pub fn next_ms(&self) -> f64 { self.next_ms }
    pub fn compute_ms(&self) -> f64 { self.compute_ms }
    pub fn frame(&self) -> f64 { self.frame }
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    0.0
}
