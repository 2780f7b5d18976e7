//! Measurement window
//!
//! Reply to a start-measurement command: `atttn`
//!  - `a`   responding address
//!  - `ttt` seconds until the values are ready (000-999)
//!  - `n`   number of values that will be returned (0-9)

use super::ProtocolError;

/// Parsed `atttn` start reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementWindow {
    /// Responding address
    pub address: char,
    /// Seconds until the values are ready
    pub wait_seconds: u16,
    /// Number of values the probe will return
    pub value_count: u8,
}

impl MeasurementWindow {
    /// Length of an `atttn` reply
    pub const LEN: usize = 5;

    /// Parse the fixed-offset fields of a start reply.
    ///
    /// Every position must hold a digit; anything else is rejected instead of
    /// being turned into a bogus wait time. Bytes past the fifth are ignored.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::MalformedWindow(String::from_utf8_lossy(frame).into_owned());

        if frame.len() < Self::LEN {
            return Err(malformed());
        }

        let digits = &frame[1..Self::LEN];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }

        let wait_seconds = digits[..3]
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        let value_count = digits[3] - b'0';

        Ok(Self {
            address: frame[0] as char,
            wait_seconds,
            value_count,
        })
    }

    /// Timeout for the service-request read that covers the wait
    pub fn wait_timeout_ms(&self) -> u64 {
        u64::from(self.wait_seconds) * 1000
    }
}
