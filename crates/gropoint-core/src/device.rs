//! Probe device
//!
//! Runs the exchanges with one addressed probe: address discovery,
//! identification, and the start/wait/collect measurement sequence.
//!
//! Every public operation is self-contained: it opens the bus, waits for the
//! line to settle, issues its commands, reads the replies and closes the bus
//! again on every return path.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::protocol::{
    decode_values, Clock, Command, CommandBuilder, DiagnosticSink, FrameBuffer, FrameReader,
    MeasurementKind, MeasurementWindow, ProtocolError, Sleeper, SystemClock, ThreadSleeper,
    Transport, DEFAULT_TIMEOUT_MS, DISCOVERY_SETTLE_MS, INFO_TIMEOUT_MS, MEASUREMENT_SETTLE_MS,
    POST_READ_DELAY_MS, TEMPERATURE_COLLECT_TIMEOUT_MS,
};

/// Probe configuration.
///
/// The defaults reproduce the timing GroPoint probes are known to work with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Bus address (0-9, A-Z, a-z)
    pub address: char,
    /// Per-byte timeout for ordinary replies
    pub read_timeout_ms: u64,
    /// Per-byte timeout for the identification reply
    pub info_timeout_ms: u64,
    /// Per-byte timeout for the temperature data reply
    pub temperature_collect_timeout_ms: u64,
    /// Settling delay before discovery and identification
    pub discovery_settle_ms: u64,
    /// Settling delay before a measurement
    pub measurement_settle_ms: u64,
    /// Pause after every received line
    pub post_read_delay_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: '0',
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            info_timeout_ms: INFO_TIMEOUT_MS,
            temperature_collect_timeout_ms: TEMPERATURE_COLLECT_TIMEOUT_MS,
            discovery_settle_ms: DISCOVERY_SETTLE_MS,
            measurement_settle_ms: MEASUREMENT_SETTLE_MS,
            post_read_delay_ms: POST_READ_DELAY_MS,
        }
    }
}

impl DeviceConfig {
    /// Default timing at `address`
    pub fn with_address(address: char) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the address is usable on the bus
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if is_valid_address(self.address) {
            Ok(())
        } else {
            Err(ProtocolError::InvalidAddress(self.address))
        }
    }

    /// Per-byte timeout of the data reply for `kind`
    pub fn collect_timeout_ms(&self, kind: MeasurementKind) -> u64 {
        match kind {
            MeasurementKind::Moisture => self.read_timeout_ms,
            MeasurementKind::Temperature => self.temperature_collect_timeout_ms,
        }
    }
}

/// Addresses are single ASCII alphanumerics
pub fn is_valid_address(address: char) -> bool {
    address.is_ascii_alphanumeric()
}

/// One probe on the bus.
///
/// `T` is the bus. Pass `&mut transport` to keep ownership elsewhere, or move
/// the transport in. A device is not reentrant: operations take `&mut self`
/// and share one frame buffer.
pub struct Device<T: Transport> {
    transport: T,
    config: DeviceConfig,
    address: char,
    frame: FrameBuffer,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    diagnostics: Option<Box<dyn DiagnosticSink>>,
}

impl<T: Transport> Device<T> {
    /// Device at the default address `0`
    pub fn new(transport: T) -> Self {
        Self::build(transport, DeviceConfig::default())
    }

    /// Device at a known address.
    ///
    /// The address is used as given, even if no probe ever confirmed it.
    /// Fails with [`ProtocolError::InvalidAddress`] unless it is a single
    /// ASCII alphanumeric.
    pub fn with_address(transport: T, address: char) -> Result<Self, ProtocolError> {
        Self::from_config(transport, DeviceConfig::with_address(address))
    }

    /// Device from a full configuration, rejecting invalid addresses
    pub fn from_config(transport: T, config: DeviceConfig) -> Result<Self, ProtocolError> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: T, config: DeviceConfig) -> Self {
        Self {
            transport,
            address: config.address,
            config,
            frame: FrameBuffer::new(),
            clock: Arc::new(SystemClock::new()),
            sleeper: Arc::new(ThreadSleeper),
            diagnostics: None,
        }
    }

    /// Replace the time source used for byte timeouts
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the delay used for settling and post-read pauses.
    /// The same sleeper may be shared between devices.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Mirror bus traffic to a diagnostic sink
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Attach or detach the diagnostic sink
    pub fn set_diagnostics(&mut self, sink: Option<Box<dyn DiagnosticSink>>) {
        self.diagnostics = sink;
    }

    /// Currently configured address
    pub fn address(&self) -> char {
        self.address
    }

    /// Change the address used for subsequent commands
    pub fn set_address(&mut self, address: char) -> Result<(), ProtocolError> {
        if !is_valid_address(address) {
            return Err(ProtocolError::InvalidAddress(address));
        }
        self.address = address;
        Ok(())
    }

    /// Configuration the device was built with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The most recently received frame
    pub fn last_frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// The underlying bus
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying bus, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the bus back
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Ask the bus for the address of the (single) probe on it.
    ///
    /// An alphanumeric reply becomes the device's address and is returned.
    /// Anything else returns `None` and leaves the address alone; callers
    /// wanting the classic sentinel can use
    /// `unwrap_or(protocol::UNKNOWN_ADDRESS)`.
    pub fn discover_address(&mut self) -> Result<Option<char>, ProtocolError> {
        let settle = self.config.discovery_settle_ms;
        let timeout = self.config.read_timeout_ms;

        self.with_bus(settle, |dev| {
            dev.send(Command::AddressQuery)?;
            dev.read_line(timeout)?;

            match dev.frame.first() {
                Some(byte) if is_valid_address(byte as char) => {
                    dev.address = byte as char;
                    tracing::debug!(address = %dev.address, "discovered probe address");
                    Ok(Some(dev.address))
                }
                other => {
                    tracing::warn!(reply = ?other.map(char::from), "no usable address reply");
                    Ok(None)
                }
            }
        })
    }

    /// Read the identification string (vendor, model, version, serial).
    ///
    /// A silent probe yields an empty string.
    pub fn query_info(&mut self) -> Result<String, ProtocolError> {
        self.read_info()?;
        Ok(self.frame.as_str_lossy().into_owned())
    }

    /// Read the identification string into a fixed buffer.
    ///
    /// Copies at most `buffer.len() - 1` bytes followed by a zero byte and
    /// returns the number of bytes copied. Buffers of length 0 or 1 receive
    /// nothing, but the exchange still takes place.
    pub fn query_info_into(&mut self, buffer: &mut [u8]) -> Result<usize, ProtocolError> {
        self.read_info()?;

        if buffer.len() <= 1 {
            return Ok(0);
        }

        let info = self.frame.as_bytes();
        let n = info.len().min(buffer.len() - 1);
        buffer[..n].copy_from_slice(&info[..n]);
        buffer[n] = 0;
        Ok(n)
    }

    fn read_info(&mut self) -> Result<(), ProtocolError> {
        let settle = self.config.discovery_settle_ms;
        let timeout = self.config.info_timeout_ms;

        self.with_bus(settle, |dev| {
            dev.send(Command::Identify)?;
            dev.read_line(timeout)?;
            Ok(())
        })
    }

    /// Soil moisture, one value per segment. See [`Device::measure`].
    pub fn read_moisture(&mut self, values: &mut [f32]) -> Result<usize, ProtocolError> {
        self.measure(MeasurementKind::Moisture, values)
    }

    /// Soil temperature, one value per sensor. See [`Device::measure`].
    pub fn read_temperature(&mut self, values: &mut [f32]) -> Result<usize, ProtocolError> {
        self.measure(MeasurementKind::Temperature, values)
    }

    /// Run a full measurement and decode the values into `values`.
    ///
    /// Sends the start command, waits out the window the probe announces
    /// (returning early on a service request), then fetches the data. At most
    /// `min(values.len(), announced count)` slots are written, in order; the
    /// number written is returned. Slots beyond it are not touched.
    ///
    /// Fails with [`ProtocolError::InvalidArguments`] on an empty `values`
    /// (before any bus traffic), [`ProtocolError::AddressMismatch`] when the
    /// start reply comes from another address, [`ProtocolError::MalformedWindow`]
    /// when the wait/count fields are not digits, and
    /// [`ProtocolError::EmptyResponse`] when the data reply never arrives.
    pub fn measure(
        &mut self,
        kind: MeasurementKind,
        values: &mut [f32],
    ) -> Result<usize, ProtocolError> {
        if values.is_empty() {
            return Err(ProtocolError::InvalidArguments);
        }

        let settle = self.config.measurement_settle_ms;
        self.with_bus(settle, |dev| dev.run_measurement(kind, values))
    }

    fn run_measurement(
        &mut self,
        kind: MeasurementKind,
        values: &mut [f32],
    ) -> Result<usize, ProtocolError> {
        let read_timeout = self.config.read_timeout_ms;

        // Start: a<ttt><n>
        self.send(kind.start_command())?;
        self.read_line(read_timeout)?;

        let expected = self.address;
        match self.frame.first() {
            Some(byte) if byte as char == expected => {}
            other => {
                let actual = other.map(char::from);
                tracing::warn!(%kind, %expected, ?actual, "start reply from wrong address");
                return Err(ProtocolError::AddressMismatch { expected, actual });
            }
        }

        let window = MeasurementWindow::parse(self.frame.as_bytes())?;
        tracing::debug!(
            %kind,
            wait_seconds = window.wait_seconds,
            value_count = window.value_count,
            "measurement started"
        );

        // Wait: the probe may announce readiness early with a service request
        self.read_line(window.wait_timeout_ms())?;
        if !self.frame.is_empty() {
            tracing::debug!(%kind, reply = %self.frame.as_str_lossy(), "service request");
        }

        // Collect: a<values>
        self.send(kind.collect_command())?;
        self.read_line(self.config.collect_timeout_ms(kind))?;

        if self.frame.is_empty() {
            tracing::warn!(%kind, "no data reply");
            return Err(ProtocolError::EmptyResponse);
        }

        let written = decode_values(self.frame.body(), values, usize::from(window.value_count));
        tracing::debug!(%kind, written, values = ?&values[..written], "measurement decoded");

        Ok(written)
    }

    /// Open the bus, settle, run `exchange`, then close the bus whatever the
    /// outcome. An error from `exchange` takes precedence over one from close.
    fn with_bus<R>(
        &mut self,
        settle_ms: u64,
        exchange: impl FnOnce(&mut Self) -> Result<R, ProtocolError>,
    ) -> Result<R, ProtocolError> {
        if let Err(e) = self.transport.open() {
            let _ = self.transport.close();
            return Err(e.into());
        }

        tracing::debug!(settle_ms, "bus opened, settling");
        self.sleeper.sleep(settle_ms);

        let result = exchange(self);
        let closed = self.transport.close();

        match (result, closed) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    fn send(&mut self, command: Command) -> Result<(), ProtocolError> {
        CommandBuilder::new(self.address).send(
            &mut self.transport,
            command,
            self.diagnostics.as_deref_mut(),
        )?;
        Ok(())
    }

    fn read_line(&mut self, timeout_ms: u64) -> Result<usize, ProtocolError> {
        let len = FrameReader::new(
            &mut self.transport,
            &*self.clock,
            &*self.sleeper,
            self.config.post_read_delay_ms,
        )
        .read_line(&mut self.frame, timeout_ms)?;

        if let Some(sink) = self.diagnostics.as_deref_mut() {
            sink.write_line(&self.frame.as_str_lossy());
        }

        Ok(len)
    }
}
