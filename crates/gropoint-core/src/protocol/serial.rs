//! Serial port transport
//!
//! Drives the bus through a USB/RS-485 or SDI-12 adapter exposed as a
//! serial port. SDI-12 runs at 1200 baud, 7 data bits, even parity, 1 stop bit.

use serde::{Deserialize, Serialize};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{self, Read, Write};
use std::time::Duration;

use super::{ProtocolError, Transport, DEFAULT_BAUD_RATE};

/// Parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineParity {
    /// No parity bit
    None,
    /// Even parity (SDI-12)
    Even,
    /// Odd parity
    Odd,
}

impl From<LineParity> for serialport::Parity {
    fn from(parity: LineParity) -> Self {
        match parity {
            LineParity::None => serialport::Parity::None,
            LineParity::Even => serialport::Parity::Even,
            LineParity::Odd => serialport::Parity::Odd,
        }
    }
}

/// Serial port settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name (e.g. "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Line speed, 1200 for SDI-12
    pub baud_rate: u32,
    /// 7 or 8
    pub data_bits: u8,
    /// Parity bit
    pub parity: LineParity,
    /// 1 or 2
    pub stop_bits: u8,
    /// Driver-level read timeout. Reads never block on it since bytes are
    /// only read once `bytes_to_read` reports them.
    pub poll_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 7,
            parity: LineParity::Even,
            stop_bits: 1,
            poll_timeout_ms: 10,
        }
    }
}

impl SerialConfig {
    /// SDI-12 line settings on `port_name`
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    fn data_bits(&self) -> Result<serialport::DataBits, ProtocolError> {
        match self.data_bits {
            5 => Ok(serialport::DataBits::Five),
            6 => Ok(serialport::DataBits::Six),
            7 => Ok(serialport::DataBits::Seven),
            8 => Ok(serialport::DataBits::Eight),
            n => Err(ProtocolError::SerialError(format!("unsupported data bits: {}", n))),
        }
    }

    fn stop_bits(&self) -> Result<serialport::StopBits, ProtocolError> {
        match self.stop_bits {
            1 => Ok(serialport::StopBits::One),
            2 => Ok(serialport::StopBits::Two),
            n => Err(ProtocolError::SerialError(format!("unsupported stop bits: {}", n))),
        }
    }
}

/// [`Transport`] over a native serial port.
///
/// The port is opened on [`Transport::open`] and dropped on
/// [`Transport::close`], so it is only held for the duration of one exchange.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Closed transport; the port is opened by [`Transport::open`]
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    /// Line settings
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Whether the port is currently held
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, ProtocolError::NotOpen))
    }
}

fn to_io(err: ProtocolError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

impl Transport for SerialTransport {
    fn open(&mut self) -> io::Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.config.port_name, self.config.baud_rate)
            .data_bits(self.config.data_bits().map_err(to_io)?)
            .parity(self.config.parity.into())
            .stop_bits(self.config.stop_bits().map_err(to_io)?)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(self.config.poll_timeout_ms))
            .open()?;

        // Drop anything the adapter buffered while the port was closed
        port.clear(serialport::ClearBuffer::All)?;

        tracing::debug!(port = %self.config.port_name, baud = self.config.baud_rate, "serial port opened");
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.config.port_name, "serial port closed");
        }
        Ok(())
    }

    fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port()?.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port()?.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let port = self.port()?;
        if port.bytes_to_read()? == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// An available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,
    /// USB vendor/product ID, for USB adapters
    pub usb_id: Option<(u16, u16)>,
    /// Product string reported by the adapter
    pub product: Option<String>,
    /// Adapter serial number
    pub serial_number: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                usb_id: Some((usb.vid, usb.pid)),
                product: usb.product,
                serial_number: usb.serial_number,
            },
            _ => Self {
                name: info.port_name,
                usb_id: None,
                product: None,
                serial_number: None,
            },
        }
    }
}

/// USB adapters first (ttyUSB*, then ttyACM*, numerically), everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name).to_string();
    for (rank, prefix) in [(0u8, "ttyUSB"), (1, "ttyACM")] {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank, num, basename);
        }
    }
    (2, 0, basename)
}

/// List serial ports that could carry the bus, in a stable order
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports.dedup_by(|a, b| a.name == b.name);
    ports
}
