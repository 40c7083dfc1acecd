//! Multi-device input polling
//!
//! Owns every opened input device. Each tick polls all of them without
//! blocking, drains one batch per device with pending data and decodes it.
//! Handles are closed exactly once: by `shutdown()` or, on any other exit
//! path (error return, panic unwind), by `Drop`.

use tracing::{debug, info, trace, warn};

use crate::midi::{format_hex, ChannelVoiceMessage};
use crate::transport::{DeviceHandle, DeviceInfo, MidiTransport, RawEvent};

/// Decoded message tagged with its source device
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub device: DeviceInfo,
    pub message: ChannelVoiceMessage,
    pub raw: RawEvent,
}

pub struct DeviceMultiplexer<T: MidiTransport> {
    transport: T,
    devices: Vec<DeviceHandle>,
    /// Maximum events drained per device per tick (at least 1)
    batch_size: usize,
}

impl<T: MidiTransport> DeviceMultiplexer<T> {
    /// Create a multiplexer with no open devices
    pub fn new(transport: T, batch_size: usize) -> Self {
        Self {
            transport,
            devices: Vec::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// Open every input device whose name contains `filter` (case-insensitive).
    ///
    /// Devices that fail to open are logged and skipped. Returns the number of
    /// devices opened. Enumeration failure leaves the active set empty.
    pub fn open_inputs(&mut self, filter: Option<&str>) -> usize {
        let devices = match self.transport.list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("⚠️  MIDI device enumeration failed: {}", e);
                return 0;
            }
        };

        let filter = filter.map(str::to_lowercase);
        let mut opened = 0;

        for info in devices {
            if !info.capabilities.input {
                debug!("Skipping {} (not an input)", info.tag());
                continue;
            }
            if let Some(pattern) = &filter {
                if !info.name.to_lowercase().contains(pattern) {
                    debug!("Skipping {} (does not match '{}')", info.tag(), pattern);
                    continue;
                }
            }

            match self.transport.open(&info) {
                Ok(handle) => {
                    info!("🎹 Listening on {}", handle.info().tag());
                    self.devices.push(handle);
                    opened += 1;
                }
                Err(e) => warn!("⚠️  {}", e),
            }
        }

        if self.devices.is_empty() {
            info!("No MIDI input devices open; continuing without MIDI");
        }
        opened
    }

    /// Poll every device once and return decoded events in arrival order
    pub fn tick(&mut self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        for handle in &self.devices {
            if !self.transport.poll(handle) {
                continue;
            }
            for raw in self.transport.read(handle, self.batch_size) {
                let message = ChannelVoiceMessage::decode(&raw.bytes);
                trace!("{} {} => {}", handle.info().tag(), format_hex(&raw.bytes), message);
                events.push(InboundEvent {
                    device: handle.info().clone(),
                    message,
                    raw,
                });
            }
        }
        events
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter().map(DeviceHandle::info)
    }

    /// Close every open device. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let handles = std::mem::take(&mut self.devices);
        if handles.is_empty() {
            return;
        }
        info!("Closing {} MIDI device(s)", handles.len());
        for handle in handles {
            self.transport.close(handle);
        }
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: MidiTransport> Drop for DeviceMultiplexer<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
