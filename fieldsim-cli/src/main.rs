mod config;
mod ic;
mod output;
mod server;

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use fieldsim_core::{
    AnimationController, AnimationLoop, RenderError, Renderer, Simulation, TickOutcome,
};
use ic::{generate, IcKind};
use output::{write_scene, FrameWriter};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use server::{serve, FrameLog};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the animation headless and write every frame to disk
    Run(RunArgs),
    /// Host the animation behind an HTTP control surface
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct SetupArgs {
    /// YAML parameter file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial condition
    #[arg(long, value_enum, default_value_t = IcKind::Hotspot)]
    ic: IcKind,

    /// RNG seed for random initial conditions
    #[arg(long, default_value_t = 123)]
    seed: u64,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    setup: SetupArgs,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Number of animation frames to render before stopping
    #[arg(long, default_value_t = 50)]
    frames: u64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    setup: SetupArgs,

    /// Listening port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Serve(args) => serve_cmd(args),
    }
}

fn build_controller<R: Renderer>(
    setup: &SetupArgs,
    renderer: R,
) -> Result<(Config, AnimationController<R>)> {
    let cfg = Config::load(setup.config.as_deref())?;
    let params = cfg.params();
    params.validate().context("invalid simulation parameters")?;

    let mut rng = ChaCha8Rng::seed_from_u64(setup.seed);
    let initial = generate(&mut rng, &params, setup.ic);
    let sim =
        Simulation::with_initial_field(params, initial).context("invalid initial condition")?;
    info!(ic = setup.ic.as_str(), seed = setup.seed, "initial condition ready");
    Ok((cfg, AnimationController::new(sim, renderer)))
}

fn run(args: RunArgs) -> Result<()> {
    let writer = FrameWriter::create(&args.out)?;
    let (cfg, mut ctl) = build_controller(&args.setup, writer)?;
    write_scene(
        &args.out,
        cfg.nx,
        cfg.ny,
        ctl.simulation().integrator_name(),
        args.setup.ic.as_str(),
        args.setup.seed,
        &cfg.display,
    )?;
    ctl.present().context("writing initial frame")?;
    play_frames(&mut ctl, args.frames).context("animation stopped")?;

    let stats = ctl.simulation().stats();
    let steps = ctl.simulation().steps();
    let writer = ctl.renderer_mut();
    writer.finish()?;

    println!("Wrote animation to: {}", args.out.display());
    println!(
        "Frames: {} (including initial), steps: {}, final max: {:.4}",
        writer.written(),
        steps,
        stats.max
    );
    Ok(())
}

/// Plays `ctl` on its own tick schedule until exactly `frames` frames have
/// been rendered, then pauses it.
fn play_frames<R: Renderer>(
    ctl: &mut AnimationController<R>,
    frames: u64,
) -> Result<(), RenderError> {
    ctl.play();
    while ctl.frames() < frames {
        let Some(wake) = ctl.wakeup() else {
            break;
        };
        thread::sleep(ctl.tick_interval());
        if ctl.tick(wake)? == TickOutcome::Idle {
            break;
        }
    }
    ctl.pause();
    Ok(())
}

fn serve_cmd(args: ServeArgs) -> Result<()> {
    let (_cfg, mut ctl) = build_controller(&args.setup, FrameLog)?;
    ctl.present()?;
    let handle = AnimationLoop::spawn(ctl).context("starting tick thread")?;
    serve(&handle, args.port)
}
