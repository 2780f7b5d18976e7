//! Frame reading
//!
//! Assembles one CRLF terminated reply line from single bytes pulled off the
//! transport, each byte bounded by its own timeout.

use std::borrow::Cow;
use std::io;

use super::{Clock, Sleeper, Transport, FRAME_BUFFER_SIZE, FRAME_TERMINATOR};

/// Fixed-capacity holder for the most recently received line.
///
/// At most `FRAME_BUFFER_SIZE - 1` payload bytes are kept; the byte after the
/// payload is always a zero sentinel.
#[derive(Clone)]
pub struct FrameBuffer {
    data: [u8; FRAME_BUFFER_SIZE],
    len: usize,
}

impl FrameBuffer {
    /// Empty frame
    pub fn new() -> Self {
        Self {
            data: [0; FRAME_BUFFER_SIZE],
            len: 0,
        }
    }

    /// Most payload bytes a frame can hold
    pub const fn capacity() -> usize {
        FRAME_BUFFER_SIZE - 1
    }

    /// Drop the payload, leaving only the sentinel
    pub fn clear(&mut self) {
        self.len = 0;
        self.data[0] = 0;
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the last read produced no payload
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload without terminator or sentinel
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Payload including the trailing zero sentinel
    pub fn as_bytes_with_sentinel(&self) -> &[u8] {
        &self.data[..=self.len]
    }

    /// Payload as text, with invalid UTF-8 replaced
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Leading byte of the frame: the responding address on addressed replies
    pub fn first(&self) -> Option<u8> {
        self.as_bytes().first().copied()
    }

    /// Everything after the leading address byte
    pub fn body(&self) -> &[u8] {
        self.as_bytes().get(1..).unwrap_or(&[])
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FrameBuffer")
            .field(&self.as_str_lossy())
            .finish()
    }
}

/// Reads bytes and lines off a transport with busy-polled timeouts
pub struct FrameReader<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    clock: &'a dyn Clock,
    sleeper: &'a dyn Sleeper,
    post_read_delay_ms: u64,
}

impl<'a, T: Transport + ?Sized> FrameReader<'a, T> {
    /// Reader that pauses `post_read_delay_ms` after every line
    pub fn new(
        transport: &'a mut T,
        clock: &'a dyn Clock,
        sleeper: &'a dyn Sleeper,
        post_read_delay_ms: u64,
    ) -> Self {
        Self {
            transport,
            clock,
            sleeper,
            post_read_delay_ms,
        }
    }

    /// Wait up to `timeout_ms` for a single byte.
    ///
    /// Returns `Ok(None)` once at least `timeout_ms` elapsed without data.
    pub fn read_byte(&mut self, timeout_ms: u64) -> io::Result<Option<u8>> {
        let start = self.clock.now_millis();

        loop {
            if let Some(byte) = self.transport.read_byte()? {
                return Ok(Some(byte));
            }
            if self.clock.now_millis().saturating_sub(start) >= timeout_ms {
                return Ok(None);
            }
            std::hint::spin_loop();
        }
    }

    /// Fill `buffer` until `terminator`, a full buffer, or a byte timeout.
    ///
    /// The terminator is consumed but not stored. Zero bytes are dropped:
    /// some probes emit stray NULs between characters.
    pub fn read_bytes_until(
        &mut self,
        terminator: u8,
        buffer: &mut [u8],
        timeout_ms: u64,
    ) -> io::Result<usize> {
        let mut index = 0;

        while index < buffer.len() {
            match self.read_byte(timeout_ms)? {
                None => break,
                Some(byte) if byte == terminator => break,
                Some(0) => continue,
                Some(byte) => {
                    buffer[index] = byte;
                    index += 1;
                }
            }
        }

        Ok(index)
    }

    /// Read one reply line into `frame` and return its payload length.
    ///
    /// A silent bus yields an empty frame, not an error. A transport error
    /// leaves `frame` empty.
    pub fn read_line(&mut self, frame: &mut FrameBuffer, timeout_ms: u64) -> io::Result<usize> {
        let capacity = FrameBuffer::capacity();
        let read =
            self.read_bytes_until(FRAME_TERMINATOR[1], &mut frame.data[..capacity], timeout_ms);
        let mut len = match read {
            Ok(len) => len,
            Err(e) => {
                frame.clear();
                return Err(e);
            }
        };

        if len > 0 && frame.data[len - 1] == FRAME_TERMINATOR[0] {
            len -= 1;
        }

        frame.data[len] = 0;
        frame.len = len;

        tracing::debug!(len, frame = %frame.as_str_lossy(), "read_line");

        self.sleeper.sleep(self.post_read_delay_ms);
        Ok(len)
    }
}
