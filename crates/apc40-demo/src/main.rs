//! APC40 light show
//!
//! Animates the knob LED rings and the clip launch grid:
//! 1. Finds the APC40 input and output ports (fatal if either is missing)
//! 2. Sends the initial ring styles and randomized knob positions
//! 3. Ticks forever on a fixed interval, bouncing the rings off the rails
//!
//! Knob turns and button presses on the device are logged as they arrive.
//! Set RUST_LOG=debug to see every inbound message.

use anyhow::Context;
use apc40_surface::midi::MidiConnection;
use apc40_surface::{
    default_driver_config_path, load_driver_config, Apc40Controller, ControlSurface,
    DriverConfig, MidiSink, RecordingSink, SurfaceError, WireMessage,
};
use clap::Parser;
use std::path::PathBuf;
use std::thread;

#[derive(Parser, Debug)]
#[command(
    name = "apc40-demo",
    version,
    about = "Knob and clip-grid light show for the Akai APC40"
)]
struct Args {
    /// Driver config file (default: ~/.config/apc40/apc40.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port name substring to look for
    #[arg(long)]
    port: Option<String>,

    /// Saturating step applied per tick
    #[arg(long)]
    step: Option<u32>,

    /// Milliseconds between ticks
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many ticks (runs forever if omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Don't open any ports; log what would be sent
    #[arg(long)]
    dry_run: bool,

    /// List MIDI ports and exit
    #[arg(long)]
    list_ports: bool,
}

impl Args {
    /// Command line values override the config file
    fn apply(&self, config: &mut DriverConfig) {
        if let Some(ref port) = self.port {
            config.port_match = port.clone();
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.tick_interval_ms = interval_ms;
        }
    }
}

/// Sink for dry runs: logs each message instead of sending it
struct DryRunSink {
    recorded: RecordingSink,
}

impl MidiSink for DryRunSink {
    fn send(&mut self, message: WireMessage) -> Result<(), SurfaceError> {
        log::debug!("[DRY RUN] {}", message);
        self.recorded.send(message)?;
        // Only the count matters here; don't let a long run grow without bound
        if self.recorded.messages().len() >= 4096 {
            self.recorded.clear();
        }
        Ok(())
    }
}

fn list_ports() -> anyhow::Result<()> {
    println!("MIDI input ports:");
    for name in MidiConnection::list_input_ports().context("Failed to list input ports")? {
        println!("  {}", name);
    }
    println!("MIDI output ports:");
    for name in MidiConnection::list_output_ports().context("Failed to list output ports")? {
        println!("  {}", name);
    }
    Ok(())
}

fn build_controller(config: &DriverConfig, dry_run: bool) -> anyhow::Result<Apc40Controller> {
    if dry_run {
        log::info!("Dry run: no MIDI ports will be opened");
        let surface =
            ControlSurface::with_random_policy(config.surface_options(), config.reseed_range())
                .context("Invalid surface options")?;
        let sink = DryRunSink {
            recorded: RecordingSink::new(),
        };
        return Ok(Apc40Controller::offline(surface, Box::new(sink)));
    }

    Apc40Controller::connect(config)
        .with_context(|| format!("Failed to connect to '{}'", config.port_match))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if args.list_ports {
        return list_ports();
    }

    let config_path = args.config.clone().unwrap_or_else(default_driver_config_path);
    let mut config = load_driver_config(&config_path);
    args.apply(&mut config);

    log::info!(
        "apc40-demo starting (port '{}', step {}, every {} ms)",
        config.port_match,
        config.step,
        config.tick_interval_ms
    );

    let mut controller = build_controller(&config, args.dry_run)?;
    controller.initialize().context("Failed to initialize surface")?;

    let interval = config.tick_interval();
    let mut ticks: u64 = 0;

    loop {
        if args.ticks.is_some_and(|limit| ticks >= limit) {
            break;
        }

        for event in controller.drain_events() {
            log::info!("APC40: {:?}", event);
        }

        // A failed send means the device went away; don't keep hammering it
        let summary = controller.tick().context("Tick failed")?;
        if summary.reseeded > 0 {
            log::debug!("Tick {}: {} knob(s) reseeded", ticks, summary.reseeded);
        }

        ticks += 1;
        thread::sleep(interval);
    }

    log::info!("apc40-demo stopping after {} ticks", ticks);
    controller.clear_grid().context("Failed to clear clip grid")?;
    Ok(())
}
