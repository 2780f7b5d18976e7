//! Simulated probe
//!
//! An in-process [`Transport`] that answers like a GroPoint profile probe.
//! Useful for exercising the protocol engine and host applications without
//! hardware on the bus.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io;

use crate::protocol::{MeasurementKind, Transport, COMMAND_TERMINATOR, FRAME_TERMINATOR};

/// Simulated probe behind a virtual bus
pub struct SimulatedProbe {
    address: char,
    identification: String,
    /// Seconds announced in the start reply
    wait_seconds: u16,
    moisture_segments: u8,
    temperature_sensors: u8,
    /// Send a service request right after the start reply
    service_request: bool,
    /// Ignore every command
    silent: bool,
    open: bool,
    rx: VecDeque<u8>,
    pending: Option<MeasurementKind>,
    last_values: Vec<f32>,
    received: Vec<String>,
    rng: StdRng,
}

impl SimulatedProbe {
    /// Probe with random sensor noise
    pub fn new(address: char) -> Self {
        Self::with_rng(address, StdRng::from_entropy())
    }

    /// Probe with reproducible sensor noise
    pub fn with_seed(address: char, seed: u64) -> Self {
        Self::with_rng(address, StdRng::seed_from_u64(seed))
    }

    fn with_rng(address: char, rng: StdRng) -> Self {
        Self {
            address,
            identification: "13GROPOINTGPLP  100SIM001".to_string(),
            wait_seconds: 1,
            moisture_segments: 6,
            temperature_sensors: 8,
            service_request: true,
            silent: false,
            open: false,
            rx: VecDeque::new(),
            pending: None,
            last_values: Vec::new(),
            received: Vec::new(),
            rng,
        }
    }

    /// Wait announced in start replies, capped at 999
    pub fn set_wait_seconds(&mut self, seconds: u16) {
        self.wait_seconds = seconds.min(999);
    }

    /// Segment and sensor counts, each capped at 9
    pub fn set_sensor_counts(&mut self, moisture_segments: u8, temperature_sensors: u8) {
        self.moisture_segments = moisture_segments.min(9);
        self.temperature_sensors = temperature_sensors.min(9);
    }

    /// Send a service request once the values are ready
    pub fn set_service_request(&mut self, enabled: bool) {
        self.service_request = enabled;
    }

    /// Ignore every command
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// Address the probe answers to
    pub fn address(&self) -> char {
        self.address
    }

    /// Whether the virtual bus is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Commands received so far, as sent on the wire
    pub fn received(&self) -> &[String] {
        &self.received
    }

    /// Values returned by the most recent data reply
    pub fn last_values(&self) -> &[f32] {
        &self.last_values
    }

    fn reply(&mut self, line: &str) {
        self.rx.extend(line.bytes());
        self.rx.extend(FRAME_TERMINATOR.iter());
    }

    fn sample(&mut self, kind: MeasurementKind) -> Vec<f32> {
        let (count, base, step) = match kind {
            MeasurementKind::Moisture => (self.moisture_segments, 22.0f32, 1.5f32),
            MeasurementKind::Temperature => (self.temperature_sensors, 18.0f32, -0.4f32),
        };

        (0..count)
            .map(|i| {
                let noise: f32 = self.rng.gen_range(-0.5..0.5);
                let value = base + step * f32::from(i) + noise;
                (value * 10.0).round() / 10.0
            })
            .collect()
    }

    fn handle(&mut self, line: &str) {
        let Some(command) = line.strip_suffix(COMMAND_TERMINATOR) else {
            tracing::debug!(line, "simulator: unterminated command ignored");
            return;
        };

        if command == "?" {
            let address = self.address.to_string();
            self.reply(&address);
            return;
        }

        let mut chars = command.chars();
        if chars.next() != Some(self.address) {
            return;
        }
        let address = self.address;

        match chars.as_str() {
            "" => self.reply(&address.to_string()),
            "I" => {
                let info = format!("{}{}", address, self.identification);
                self.reply(&info);
            }
            body @ ("M" | "M1") => {
                let kind = if body == "M" {
                    MeasurementKind::Moisture
                } else {
                    MeasurementKind::Temperature
                };
                let count = match kind {
                    MeasurementKind::Moisture => self.moisture_segments,
                    MeasurementKind::Temperature => self.temperature_sensors,
                };
                self.pending = Some(kind);
                let start = format!("{}{:03}{}", address, self.wait_seconds, count);
                self.reply(&start);
                if self.service_request {
                    self.reply(&address.to_string());
                }
            }
            "D0" => {
                let values = match self.pending {
                    Some(kind) => self.sample(kind),
                    None => Vec::new(),
                };
                let mut data = address.to_string();
                for value in &values {
                    data.push_str(&format!("{:+.1}", value));
                }
                self.last_values = values;
                self.reply(&data);
            }
            other => tracing::debug!(command = other, "simulator: unsupported command"),
        }
    }
}

impl Transport for SimulatedProbe {
    fn open(&mut self) -> io::Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        self.rx.clear();
        Ok(())
    }

    fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "bus not open"));
        }

        let line = String::from_utf8_lossy(bytes).into_owned();
        self.received.push(line.clone());
        if !self.silent {
            self.handle(&line);
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "bus not open"));
        }
        Ok(self.rx.pop_front())
    }
}
