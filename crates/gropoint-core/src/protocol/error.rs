//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to a probe
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Measurement destination has no room
    #[error("Invalid arguments: destination buffer is empty")]
    InvalidArguments,

    /// Start reply came from another address, or not at all
    #[error("Address mismatch: expected '{expected}', got {actual:?}")]
    AddressMismatch {
        /// Address the command was sent to
        expected: char,
        /// Leading byte of the reply, if any
        actual: Option<char>,
    },

    /// Data reply never arrived
    #[error("Empty response from probe")]
    EmptyResponse,

    /// Start reply whose wait or count fields are not digits
    #[error("Malformed measurement window: {0:?}")]
    MalformedWindow(String),

    /// Address outside 0-9, A-Z, a-z
    #[error("Invalid address '{0}': must be 0-9, A-Z or a-z")]
    InvalidAddress(char),

    /// Transport used before it was opened
    #[error("Bus is not open")]
    NotOpen,

    /// Serial driver failure
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Transport I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Integer code used by firmware-style callers.
    ///
    /// Invalid arguments and address mismatches share `-1`, an empty data
    /// reply is `-2`, an unreadable wait window is `-3` and anything coming
    /// from the transport itself is `-4`.
    pub fn code(&self) -> i32 {
        match self {
            ProtocolError::InvalidArguments
            | ProtocolError::AddressMismatch { .. }
            | ProtocolError::InvalidAddress(_) => -1,
            ProtocolError::EmptyResponse => -2,
            ProtocolError::MalformedWindow(_) => -3,
            ProtocolError::NotOpen
            | ProtocolError::SerialError(_)
            | ProtocolError::IoError(_) => -4,
        }
    }
}
