//! Threaded repeating timer that hosts an [`AnimationController`].
//!
//! The tick thread owns the controller exclusively (moved in at spawn).
//! Control actions arrive over a bounded crossbeam channel and answer on a
//! per-call reply channel, so they are applied strictly between ticks. The
//! next wake-up is a single pending deadline; pause and reset clear it,
//! which is the cancel handle for the repeating timer.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::controller::{AnimationController, Renderer, TickOutcome, Wakeup};
use crate::error::RenderError;
use crate::field::Field;

const COMMAND_CAPACITY: usize = 64;

enum Command {
    Play(Sender<bool>),
    Pause(Sender<bool>),
    Toggle(Sender<bool>),
    Reset(Sender<bool>),
    Present(Sender<Result<(), RenderError>>),
    Snapshot(Sender<Snapshot>),
    Shutdown,
}

/// Copy of the controller's visible state at one instant.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub field: Field,
    pub running: bool,
    pub frames: u64,
}

/// Next scheduled tick: when, and for which run.
type Pending = Option<(Instant, Wakeup)>;

enum Event {
    Command(Option<Command>),
    Wake,
}

pub struct AnimationLoop;

impl AnimationLoop {
    /// Moves `controller` onto a dedicated tick thread.
    pub fn spawn<R>(controller: AnimationController<R>) -> std::io::Result<AnimationHandle<R>>
    where
        R: Renderer + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_CAPACITY);
        let (err_tx, err_rx) = unbounded();
        let thread = thread::Builder::new()
            .name("fieldsim-tick".into())
            .spawn(move || run(controller, cmd_rx, err_tx))?;
        Ok(AnimationHandle {
            cmd_tx,
            err_rx,
            thread: Some(thread),
        })
    }
}

fn run<R: Renderer>(
    mut ctl: AnimationController<R>,
    cmd_rx: Receiver<Command>,
    err_tx: Sender<RenderError>,
) -> AnimationController<R> {
    let mut pending: Pending = None;

    loop {
        let timeout = match pending {
            Some((at, _)) => crossbeam_channel::at(at),
            None => crossbeam_channel::never(),
        };

        let event = select! {
            recv(cmd_rx) -> msg => Event::Command(msg.ok()),
            recv(timeout) -> _ => Event::Wake,
        };

        match event {
            Event::Command(None) | Event::Command(Some(Command::Shutdown)) => break,
            Event::Command(Some(cmd)) => {
                apply(&mut ctl, cmd);
                reschedule(&ctl, &mut pending);
            }
            Event::Wake => {
                let Some((_, wake)) = pending.take() else {
                    continue;
                };
                match ctl.tick(wake) {
                    Ok(TickOutcome::Rearm(delay)) => {
                        if let Some(next) = ctl.wakeup() {
                            pending = Some((Instant::now() + delay, next));
                        }
                    }
                    Ok(TickOutcome::Idle) => {}
                    Err(err) => {
                        warn!(error = %err, "animation stopped by render failure");
                        let _ = err_tx.send(err);
                    }
                }
            }
        }
    }

    debug!(frames = ctl.frames(), "tick thread exiting");
    ctl
}

fn apply<R: Renderer>(ctl: &mut AnimationController<R>, cmd: Command) {
    match cmd {
        Command::Play(reply) => {
            let _ = reply.send(ctl.play());
        }
        Command::Pause(reply) => {
            let _ = reply.send(ctl.pause());
        }
        Command::Toggle(reply) => {
            let _ = reply.send(ctl.toggle());
        }
        Command::Reset(reply) => {
            let _ = reply.send(ctl.reset());
        }
        Command::Present(reply) => {
            let _ = reply.send(ctl.present());
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(Snapshot {
                field: ctl.field().clone(),
                running: ctl.is_running(),
                frames: ctl.frames(),
            });
        }
        Command::Shutdown => {}
    }
}

/// Keeps the pending deadline in line with the controller's current run.
///
/// A run that is already scheduled keeps its deadline; a new run is armed
/// one interval from now; a stopped controller has nothing pending.
fn reschedule<R: Renderer>(ctl: &AnimationController<R>, pending: &mut Pending) {
    match ctl.wakeup() {
        None => *pending = None,
        Some(wake) => {
            if pending.map(|(_, w)| w) != Some(wake) {
                *pending = Some((Instant::now() + ctl.tick_interval(), wake));
            }
        }
    }
}

/// Host-side handle to a running [`AnimationLoop`].
///
/// Dropping the handle stops the tick thread.
pub struct AnimationHandle<R> {
    cmd_tx: Sender<Command>,
    err_rx: Receiver<RenderError>,
    thread: Option<JoinHandle<AnimationController<R>>>,
}

impl<R> AnimationHandle<R> {
    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Option<T> {
        let (tx, rx) = bounded(1);
        self.cmd_tx.send(make(tx)).ok()?;
        rx.recv().ok()
    }

    pub fn play(&self) -> bool {
        self.request(Command::Play).unwrap_or(false)
    }

    pub fn pause(&self) -> bool {
        self.request(Command::Pause).unwrap_or(false)
    }

    pub fn toggle(&self) -> bool {
        self.request(Command::Toggle).unwrap_or(false)
    }

    pub fn reset(&self) -> bool {
        self.request(Command::Reset).unwrap_or(false)
    }

    /// Renders the current field without stepping.
    pub fn present(&self) -> Result<(), RenderError> {
        self.request(Command::Present)
            .unwrap_or_else(|| Err(RenderError::new("tick thread has stopped")))
    }

    /// `None` once the tick thread is gone.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.request(Command::Snapshot)
    }

    pub fn running(&self) -> bool {
        self.snapshot().is_some_and(|s| s.running)
    }

    /// Render failures, in the order they stopped the animation.
    pub fn errors(&self) -> &Receiver<RenderError> {
        &self.err_rx
    }

    /// Stops the tick thread and hands the controller back.
    pub fn shutdown(mut self) -> Option<AnimationController<R>> {
        let _ = self.cmd_tx.send(Command::Shutdown);
        self.thread.take()?.join().ok()
    }
}

impl<R> Drop for AnimationHandle<R> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.cmd_tx.send(Command::Shutdown);
            let _ = thread.join();
        }
    }
}
