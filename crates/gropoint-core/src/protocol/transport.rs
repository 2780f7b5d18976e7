//! Bus transport
//!
//! The seam between the protocol engine and whatever carries the bytes.

use std::io;

/// The physical bus a probe hangs off.
///
/// Implementations own the wire: they open and release it, push command
/// bytes out and hand back received bytes one at a time without blocking.
/// Break signalling and bit timing are the implementation's business.
pub trait Transport {
    /// Acquire the bus (open the port, enable the transceiver, ...)
    fn open(&mut self) -> io::Result<()>;

    /// Release the bus
    fn close(&mut self) -> io::Result<()>;

    /// Transmit a complete command line
    fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Block until everything passed to `send_raw` has left the controller
    fn flush(&mut self) -> io::Result<()>;

    /// Take one received byte, or `None` if nothing is waiting right now
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send_raw(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send_raw(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}
