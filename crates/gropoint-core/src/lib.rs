//! # GroPoint Core Library
//!
//! Talks to GroPoint soil probes over an SDI-12 style serial bus.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//!
//! This library provides:
//! - Line framing with per-byte timeouts
//! - Addressed command construction
//! - Address discovery, identification and the measurement handshake
//! - Decoding of the packed numeric data replies
//! - A serial port transport and a simulated probe
//!
//! ## Example
//!
//! ```rust,ignore
//! use gropoint_core::prelude::*;
//!
//! let mut bus = SerialTransport::new(SerialConfig::new("/dev/ttyUSB0"));
//! let mut probe = Device::new(&mut bus);
//!
//! probe.discover_address()?;
//! let mut moisture = [0.0f32; 9];
//! let n = probe.read_moisture(&mut moisture)?;
//! println!("moisture: {:?}", &moisture[..n]);
//! ```

pub mod device;
pub mod protocol;
pub mod sim;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::device::{Device, DeviceConfig};
    pub use crate::protocol::{
        Clock, DiagnosticSink, MeasurementKind, ProtocolError, SerialConfig, SerialTransport,
        Sleeper, Transport, UNKNOWN_ADDRESS,
    };
    pub use crate::sim::SimulatedProbe;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
