//! SDI-12 Bus Protocol
//!
//! Implements the addressed command/response exchange used by GroPoint probes.
//!
//! Commands are short ASCII strings terminated by `!`, replies are CRLF
//! terminated ASCII lines. Measurements take two steps: a start command that
//! answers with a wait window, then a data command once the window elapsed.

pub mod command_builder;
pub mod commands;
pub mod decoder;
pub mod diagnostics;
mod error;
pub mod frame;
pub mod serial;
pub mod timing;
pub mod transport;
pub mod window;

pub use command_builder::CommandBuilder;
pub use commands::{Command, MeasurementKind};
pub use decoder::decode_values;
pub use diagnostics::{DiagnosticSink, WriterSink};
pub use error::ProtocolError;
pub use frame::{FrameBuffer, FrameReader};
pub use serial::{list_ports, PortInfo, SerialConfig, SerialTransport};
pub use timing::{Clock, Sleeper, SystemClock, ThreadSleeper};
pub use transport::Transport;
pub use window::MeasurementWindow;

/// Capacity of the frame buffer, including the trailing sentinel byte
pub const FRAME_BUFFER_SIZE: usize = 64;

/// Line terminator sent by the probe after every reply
pub const FRAME_TERMINATOR: &[u8; 2] = b"\r\n";

/// Terminator appended to every outgoing command
pub const COMMAND_TERMINATOR: char = '!';

/// Returned in place of an address when discovery gets no usable reply
pub const UNKNOWN_ADDRESS: char = '?';

/// Default per-byte timeout when reading a reply, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Per-byte timeout for the identification reply
pub const INFO_TIMEOUT_MS: u64 = 1000;

/// Per-byte timeout for the temperature data reply
pub const TEMPERATURE_COLLECT_TIMEOUT_MS: u64 = 5000;

/// Settling delay after opening the bus for discovery and identification
pub const DISCOVERY_SETTLE_MS: u64 = 500;

/// Settling delay after opening the bus for a measurement
pub const MEASUREMENT_SETTLE_MS: u64 = 250;

/// Pause after every received line.
/// RS-485 adapters drop the next reply without it.
pub const POST_READ_DELAY_MS: u64 = 50;

/// SDI-12 line speed
pub const DEFAULT_BAUD_RATE: u32 = 1200;
