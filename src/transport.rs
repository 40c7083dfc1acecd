//! Raw MIDI transport
//!
//! The [`MidiTransport`] trait is the seam between the control path and the
//! device driver: enumerate, open, poll, read, close. [`MidirTransport`] is the
//! production implementation; driver callbacks only push raw bytes into a
//! per-device channel that `poll`/`read` drain without blocking.

use std::collections::HashMap;

use crossbeam::channel::{self, Receiver};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput};
use tracing::{debug, info};

use crate::error::{ControlError, ControlResult};

/// What a device can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub input: bool,
    pub output: bool,
}

impl Capabilities {
    /// "Input", "Output", "Input/Output" or "Unknown"
    pub fn label(&self) -> &'static str {
        match (self.input, self.output) {
            (true, true) => "Input/Output",
            (true, false) => "Input",
            (false, true) => "Output",
            (false, false) => "Unknown",
        }
    }
}

/// Enumerated device, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Session-local port id
    pub id: usize,
    pub name: String,
    pub vendor: String,
    pub capabilities: Capabilities,
}

impl DeviceInfo {
    /// `[ID:n | name | vendor | type]`, used to tag monitor output
    pub fn tag(&self) -> String {
        format!(
            "[ID:{} | {} | {} | {}]",
            self.id,
            self.name,
            self.vendor,
            self.capabilities.label()
        )
    }
}

/// An opened input device
///
/// Not `Clone`: [`MidiTransport::close`] consumes the handle, so a handle can
/// only be closed once.
#[derive(Debug)]
pub struct DeviceHandle {
    info: DeviceInfo,
}

impl DeviceHandle {
    pub fn new(info: DeviceInfo) -> Self {
        Self { info }
    }

    pub fn id(&self) -> usize {
        self.info.id
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

/// Raw event as delivered by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Driver timestamp in microseconds
    pub timestamp_us: u64,
    pub bytes: Vec<u8>,
}

impl RawEvent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp_us: 0,
            bytes: bytes.into(),
        }
    }
}

/// Device driver seam
pub trait MidiTransport {
    /// List every input and output device currently visible
    fn list_devices(&mut self) -> ControlResult<Vec<DeviceInfo>>;

    /// Open a device for input
    fn open(&mut self, info: &DeviceInfo) -> ControlResult<DeviceHandle>;

    /// Non-blocking check for pending events
    fn poll(&mut self, handle: &DeviceHandle) -> bool;

    /// Drain up to `max_events` pending events
    fn read(&mut self, handle: &DeviceHandle, max_events: usize) -> Vec<RawEvent>;

    /// Close the device
    fn close(&mut self, handle: DeviceHandle);
}

struct OpenPort {
    conn: MidiInputConnection<()>,
    rx: Receiver<RawEvent>,
}

/// `midir`-backed transport
pub struct MidirTransport {
    client_name: String,
    ports: HashMap<usize, OpenPort>,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            ports: HashMap::new(),
        }
    }

    /// Name of the platform MIDI backend, reported as the device vendor
    fn backend_name() -> &'static str {
        if cfg!(target_os = "windows") {
            "WinMM"
        } else if cfg!(target_os = "macos") {
            "CoreMIDI"
        } else if cfg!(target_os = "linux") {
            "ALSA"
        } else {
            "midir"
        }
    }
}

impl MidiTransport for MidirTransport {
    fn list_devices(&mut self) -> ControlResult<Vec<DeviceInfo>> {
        let midi_in = MidiInput::new(&format!("{}-discovery", self.client_name))
            .map_err(|e| ControlError::TransportInit(e.to_string()))?;
        let midi_out = MidiOutput::new(&format!("{}-discovery", self.client_name))
            .map_err(|e| ControlError::TransportInit(e.to_string()))?;

        let output_names: Vec<String> = midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect();

        let mut devices = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                let output = output_names.contains(&name);
                devices.push(DeviceInfo {
                    id: devices.len(),
                    name,
                    vendor: Self::backend_name().to_string(),
                    capabilities: Capabilities { input: true, output },
                });
            }
        }

        for name in output_names {
            if !devices.iter().any(|d| d.name == name) {
                devices.push(DeviceInfo {
                    id: devices.len(),
                    name,
                    vendor: Self::backend_name().to_string(),
                    capabilities: Capabilities {
                        input: false,
                        output: true,
                    },
                });
            }
        }

        debug!("Discovered {} MIDI devices", devices.len());
        Ok(devices)
    }

    fn open(&mut self, info: &DeviceInfo) -> ControlResult<DeviceHandle> {
        let unavailable = |reason: String| ControlError::DeviceUnavailable {
            id: info.id,
            name: info.name.clone(),
            reason,
        };

        if !info.capabilities.input {
            return Err(unavailable("not an input device".to_string()));
        }

        let mut midi_in = MidiInput::new(&format!("{}-{}", self.client_name, info.id))
            .map_err(|e| unavailable(e.to_string()))?;
        midi_in.ignore(Ignore::None);

        // Port order can shift between enumeration and open; match by name
        let port = midi_in
            .ports()
            .into_iter()
            .find(|p| midi_in.port_name(p).map(|n| n == info.name).unwrap_or(false))
            .ok_or_else(|| unavailable("port disappeared".to_string()))?;

        let (tx, rx) = channel::unbounded();
        let conn = midi_in
            .connect(
                &port,
                &self.client_name,
                move |timestamp_us, data, _| {
                    let _ = tx.send(RawEvent {
                        timestamp_us,
                        bytes: data.to_vec(),
                    });
                },
                (),
            )
            .map_err(|e| unavailable(e.to_string()))?;

        info!("Opened MIDI input {}", info.tag());
        self.ports.insert(info.id, OpenPort { conn, rx });
        Ok(DeviceHandle::new(info.clone()))
    }

    fn poll(&mut self, handle: &DeviceHandle) -> bool {
        self.ports
            .get(&handle.id())
            .map(|p| !p.rx.is_empty())
            .unwrap_or(false)
    }

    fn read(&mut self, handle: &DeviceHandle, max_events: usize) -> Vec<RawEvent> {
        match self.ports.get(&handle.id()) {
            Some(port) => port.rx.try_iter().take(max_events).collect(),
            None => Vec::new(),
        }
    }

    fn close(&mut self, handle: DeviceHandle) {
        if let Some(port) = self.ports.remove(&handle.id()) {
            let _ = port.conn.close();
            debug!("Closed MIDI input {}", handle.info().tag());
        }
    }
}

/// Print every visible device
pub fn list_ports_formatted(transport: &mut dyn MidiTransport) -> anyhow::Result<()> {
    use colored::*;

    println!("\n{}", "=== Available MIDI Devices ===".bold().cyan());

    let devices = transport.list_devices()?;
    if devices.is_empty() {
        println!("  {}", "No MIDI devices found".dimmed());
    }

    for device in devices {
        let marker = match (device.capabilities.input, device.capabilities.output) {
            (true, _) => "[INPUT] ".green(),
            (false, true) => "[OUTPUT]".yellow(),
            (false, false) => "[?]     ".dimmed(),
        };
        println!(
            "  {} ID: {:>2}  {}  ({}, {})",
            marker,
            device.id,
            device.name.bright_white(),
            device.vendor,
            device.capabilities.label()
        );
    }

    println!();
    Ok(())
}
