//! multihead CLI: inspect configurations and replay scripted input through
//! the normalization core.

mod console;

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use multihead_daemon::{setup, Config, Daemon, DaemonEvent};
use multihead_input::{FrameForwarder, HostQueue};
use multihead_types::decode_frames;
use tracing_subscriber::EnvFilter;

use crate::console::{ConsoleHost, LogBackend, Script};

#[derive(Parser)]
#[command(
    name = "multihead",
    about = "Unify input from many displays into one pointer and keyboard",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the resulting layout.
    CheckConfig,

    /// Report which screen owns a global coordinate.
    Locate {
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },

    /// Feed a TOML script of source events through the translator and
    /// print what the host would receive.
    Replay {
        /// Script with `[[events]]` tables.
        script: String,

        /// Also write device motion to this file as length-prefixed frames.
        #[arg(long)]
        frames: Option<String>,
    },

    /// Decode a file of device-motion frames written by `replay --frames`.
    Frames {
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = setup::load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level)),
        )
        .init();

    match cli.command {
        Commands::CheckConfig => check_config(&config),
        Commands::Locate { x, y } => {
            locate(&config, x, y);
            Ok(())
        }
        Commands::Replay { script, frames } => {
            let script = load_script(&script)?;
            match frames {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create frame file {path}"))?;
                    let host = FrameForwarder::new(ConsoleHost::new(), BufWriter::new(file));
                    replay(&config, script, host).await
                }
                None => replay(&config, script, ConsoleHost::new()).await,
            }
        }
        Commands::Frames { path } => dump_frames(&path),
    }
}

fn check_config(config: &Config) -> anyhow::Result<()> {
    let ctx = setup::build_context(config)?;
    let layout = &ctx.layout;
    println!("canvas: {}x{}", layout.width(), layout.height());
    for screen in layout.screens() {
        println!(
            "  screen {}: {}x{} at ({}, {})",
            screen.index, screen.width, screen.height, screen.origin_x, screen.origin_y
        );
    }
    for (index, group) in ctx.registry.groups().iter().enumerate() {
        println!("group {index}: {}", group.name);
        for device in group.devices() {
            println!(
                "  {} {:?} {:?} binding={} buttons={}",
                device.id,
                device.name,
                device.role,
                device.binding,
                device.buttons.count()
            );
        }
    }
    let show = |id: Option<multihead_types::DeviceId>| {
        id.map_or_else(|| "none".to_string(), |id| id.to_string())
    };
    println!("core pointer: {}", show(ctx.registry.core_pointer()));
    println!("core keyboard: {}", show(ctx.registry.core_keyboard()));
    println!("keymaps: {}", config.keymaps.len());
    Ok(())
}

fn locate(config: &Config, x: i32, y: i32) {
    let layout = setup::build_layout(config);
    match layout.locate(x, y) {
        Some(screen) => {
            let (lx, ly) = screen.to_local(x, y);
            println!("({x}, {y}) is on screen {} at ({lx}, {ly})", screen.index);
        }
        None => println!("({x}, {y}) is off-canvas"),
    }
}

fn load_script(path: &str) -> anyhow::Result<Script> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read script {path}"))?;
    toml::from_str(&content).with_context(|| format!("failed to parse script {path}"))
}

fn dump_frames(path: &str) -> anyhow::Result<()> {
    let buf = std::fs::read(path).with_context(|| format!("failed to read frame file {path}"))?;
    let chains = decode_frames(&buf).with_context(|| format!("malformed frame file {path}"))?;
    for (index, records) in chains.iter().enumerate() {
        println!("frame {index}: {} records", records.len());
        for record in records {
            println!(
                "  {} axes {}..{} {:?}{}",
                record.device_id,
                record.first_axis,
                usize::from(record.first_axis) + record.count(),
                record.values,
                if record.more { " (more)" } else { "" }
            );
        }
    }
    Ok(())
}

async fn replay<H: HostQueue>(config: &Config, script: Script, host: H) -> anyhow::Result<()> {
    let mut daemon = Daemon::new(config, host)?;
    for group in &config.groups {
        for device in &group.devices {
            daemon.attach_backend(device.id, Arc::new(LogBackend::new(device.name.clone())))?;
        }
    }
    let events = daemon.event_sender();
    let mut status = daemon.status_receiver();
    let run = tokio::spawn(async move { daemon.run().await });

    tracing::info!(events = script.events.len(), "replaying script");
    for event in script.events {
        if events.send(DaemonEvent::Source(event)).await.is_err() {
            break;
        }
    }
    let _ = events.send(DaemonEvent::Shutdown).await;
    run.await??;

    let status = status.borrow_and_update().clone();
    println!(
        "processed {} events; cursor {:?}{}",
        status.events_processed,
        status.cursor,
        if status.terminate_requested {
            "; termination requested"
        } else {
            ""
        }
    );
    if let Some(vt) = status.vt_switch {
        println!("pending VT switch: {vt}");
    }
    Ok(())
}
