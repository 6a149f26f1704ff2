mod track;

use clap::Parser;
use core::cell::RefCell;
use embassy_executor::{Executor, Spawner};
use embassy_time::Ticker;
use lfb_core::utils::{controllers::TickOutcome, ControlLoop, ControllerConfig};
use static_cell::StaticCell;
use std::{fmt::Display, path::PathBuf};
use tracing::{error, info, warn};
use track::{ConsoleMotors, TrackSensors, World};

type Controller = ControlLoop<TrackSensors, ConsoleMotors>;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// JSON file with controller tuning
    #[clap(long)]
    config: Option<PathBuf>,
    /// override max_speed (rad/s)
    #[clap(long)]
    max_speed: Option<f32>,
    /// override dwell_ticks_threshold
    #[clap(long)]
    dwell_ticks: Option<u32>,
    /// override tick_period_ms
    #[clap(long)]
    period_ms: Option<u64>,
    /// stop after this many ticks, 0 runs until killed
    #[clap(long, default_value_t = 200)]
    ticks: u64,
    /// lateral drift of the simulated robot per tick
    #[clap(long, default_value_t = 0.15)]
    drift: f32,
    /// fail a ground read every N ticks, 0 disables
    #[clap(long, default_value_t = 0)]
    fault_every: u64,
    /// print each decided tick as a JSON line
    #[clap(long)]
    json_trace: bool,
}

fn fail(msg: impl Display) -> ! {
    error!("{}", msg);
    std::process::exit(1)
}

fn load_config(opts: &Opts) -> ControllerConfig {
    let mut config = match &opts.config {
        Some(path) => {
            let bytes = std::fs::read(path)
                .unwrap_or_else(|e| fail(format_args!("cannot read {}: {}", path.display(), e)));
            ControllerConfig::from_json(&bytes).unwrap_or_else(|e| fail(e))
        }
        None => ControllerConfig::default(),
    };
    if let Some(v) = opts.max_speed {
        config.max_speed = v;
    }
    if let Some(v) = opts.dwell_ticks {
        config.dwell_ticks_threshold = v;
    }
    if let Some(v) = opts.period_ms {
        config.tick_period_ms = v;
    }
    config
}

#[embassy_executor::task]
async fn control_task(
    mut ctrl: Controller,
    ticks: u64,
    json_trace: bool,
) {
    let mut ticker = Ticker::every(ctrl.config().tick_period());
    while ticks == 0 || ctrl.stats().ticks < ticks {
        ticker.next().await;
        match ctrl.tick() {
            TickOutcome::Actuated(trace) => {
                if json_trace {
                    match serde_json::to_string(&trace) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("trace encode failed: {}", e),
                    }
                }
            }
            TickOutcome::SensorSkipped { tick, fault, held } => {
                info!(tick, %fault, ?held, "holding last command");
            }
            TickOutcome::ActuatorFailed { trace, fault } => {
                warn!(tick = trace.tick, %fault, "motor write will be retried");
            }
        }
    }

    if let Err(e) = ctrl.halt() {
        error!("halt failed: {}", e);
    }
    let stats = ctrl.stats();
    info!(
        ticks = stats.ticks,
        actuated = stats.actuated,
        sensor_faults = stats.sensor_faults,
        transitions = stats.transitions,
        "controller stopped"
    );
    std::process::exit(0);
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    ctrl: Controller,
    ticks: u64,
    json_trace: bool,
) {
    info!(
        period_ms = ctrl.config().tick_period_ms,
        max_speed = ctrl.config().max_speed,
        "starting line follower"
    );
    spawner.spawn(control_task(ctrl, ticks, json_trace)).unwrap();
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();
static WORLD: StaticCell<RefCell<World>> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let config = load_config(&opts);

    let world: &'static RefCell<World> =
        WORLD.init(RefCell::new(World::new(opts.drift, opts.fault_every)));
    let ctrl = ControlLoop::new(config, TrackSensors { world }, ConsoleMotors { world })
        .unwrap_or_else(|e| fail(e))
        .with_tick_trace(true);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner
            .spawn(main_task(spawner, ctrl, opts.ticks, opts.json_trace))
            .unwrap();
    });
}
