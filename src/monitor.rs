//! Input monitor for identifying controller CCs
//!
//! Opens every matching input and prints each decoded message with the
//! device it came from. Nothing is routed.

use std::future::Future;
use std::time::Instant;

use anyhow::Result;
use colored::*;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::config::MidiConfig;
use crate::midi::{format_hex, MessageKind};
use crate::multiplexer::{DeviceMultiplexer, InboundEvent};
use crate::transport::MidiTransport;

/// Run the monitor until `shutdown` resolves
pub async fn run_monitor<T: MidiTransport>(
    transport: T,
    config: &MidiConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    println!("{}", "=== MIDI Monitor ===".bold().cyan());
    println!("Press Ctrl+C to exit\n");

    let mut multiplexer = DeviceMultiplexer::new(transport, config.batch_size);
    let opened = multiplexer.open_inputs(config.device_filter.as_deref());
    if opened == 0 {
        println!("{}", "No MIDI input devices opened".yellow());
    }
    for device in multiplexer.devices() {
        println!("  {} {}", "listening".green(), device.tag());
    }

    println!(
        "{}",
        "Format: [elapsed] [ID | name | vendor | type] HEX => PARSED".dimmed()
    );
    println!("{}\n", "─".repeat(80).dimmed());

    let start = Instant::now();
    let mut polls = interval(config.poll_interval());
    polls.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = polls.tick() => {
                for event in multiplexer.tick() {
                    println!("{}", format_event(&event, start.elapsed().as_millis()));
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    multiplexer.shutdown();
    info!("Monitor stopped");
    Ok(())
}

fn format_event(event: &InboundEvent, elapsed_ms: u128) -> String {
    let parsed = event.message.to_string();
    let parsed = match event.message.kind {
        MessageKind::ControlChange => parsed.bright_green(),
        MessageKind::NoteOn | MessageKind::NoteOff => parsed.bright_yellow(),
        MessageKind::PitchBend => parsed.bright_magenta(),
        MessageKind::ProgramChange => parsed.bright_blue(),
        MessageKind::Unknown => parsed.dimmed(),
    };

    format!(
        "[{:>8}ms] {} {} => {}",
        elapsed_ms,
        event.device.tag().cyan(),
        format_hex(&event.raw.bytes).white(),
        parsed
    )
}
