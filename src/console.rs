//! Interactive console - the headless stand-in for on-screen widgets
//!
//! Runs rustyline on its own thread and forwards parsed commands to the main
//! loop over a channel. Each command maps onto the same widget event a GUI
//! slider or button would produce.

use std::thread::JoinHandle;

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::widgets::{ButtonAction, SliderId, WidgetEvent};

/// Parsed console line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    Input(WidgetEvent),
    /// Log the current parameters
    Show,
    Quit,
}

const HELP: &str = "\
  color <0-360>        set hue
  size <50-150>        set scale percent
  morph <index> <0-1>  set a morph weight
  wireframe | animate | rotate | spin
  reset | approve
  show | help | quit";

/// Parse one line. `Ok(None)` for blank lines and `help`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let slider = |id: SliderId, raw: Option<&&str>| -> Result<ConsoleCommand> {
        let raw = raw.ok_or_else(|| anyhow!("{} needs a value", word))?;
        let value: f32 = raw
            .parse()
            .with_context(|| format!("invalid value: {}", raw))?;
        Ok(ConsoleCommand::Input(WidgetEvent::Slider { id, value }))
    };
    let button = |action: ButtonAction| -> Result<Option<ConsoleCommand>> {
        Ok(Some(ConsoleCommand::Input(WidgetEvent::Button(action))))
    };

    match word.to_lowercase().as_str() {
        "color" | "hue" => slider(SliderId::Color, args.first()).map(Some),
        "size" | "scale" => slider(SliderId::Size, args.first()).map(Some),
        "morph" => {
            let raw = args.first().ok_or_else(|| anyhow!("morph needs an index"))?;
            let index: usize = raw
                .parse()
                .with_context(|| format!("invalid morph index: {}", raw))?;
            slider(SliderId::Morph(index), args.get(1)).map(Some)
        }
        "wireframe" => button(ButtonAction::ToggleWireframe),
        "animate" => button(ButtonAction::ToggleAnimation),
        "rotate" => button(ButtonAction::ToggleAutoRotate),
        "spin" => button(ButtonAction::Spin),
        "reset" => button(ButtonAction::Reset),
        "approve" => button(ButtonAction::Approve),
        "show" => Ok(Some(ConsoleCommand::Show)),
        "quit" | "exit" => Ok(Some(ConsoleCommand::Quit)),
        "help" => {
            println!("{}", HELP);
            Ok(None)
        }
        other => bail!("unknown command: {} (try 'help')", other),
    }
}

/// Start the REPL thread. It sends `Quit` on Ctrl+C, Ctrl+D or `quit`.
pub fn spawn_console(tx: mpsc::UnboundedSender<ConsoleCommand>) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            if let Err(e) = run_repl(&tx) {
                warn!("⚠️  Console stopped: {:#}", e);
                let _ = tx.send(ConsoleCommand::Quit);
            }
        })
        .context("Failed to start console thread")
}

fn run_repl(tx: &mpsc::UnboundedSender<ConsoleCommand>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "Type 'help' for commands".dimmed());

    loop {
        match rl.readline("morphdeck> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        let quit = command == ConsoleCommand::Quit;
                        if tx.send(command).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", e.to_string().yellow()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("Console interrupted");
                let _ = tx.send(ConsoleCommand::Quit);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
