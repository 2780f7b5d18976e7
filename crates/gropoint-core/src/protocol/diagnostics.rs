//! Diagnostic output
//!
//! An optional sink that receives a verbatim copy of the bus traffic, the way
//! a debug serial console would. It is independent of `tracing`.

use std::io::Write;

/// Receives outgoing commands and received frames as text
pub trait DiagnosticSink: Send {
    /// Emit `text` as is
    fn write(&mut self, text: &str);

    /// Emit `text` followed by CRLF
    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\r\n");
    }
}

/// Adapts any [`Write`] (stderr, a file, a second UART) into a sink.
/// Write errors are dropped: diagnostics must never disturb the bus.
pub struct WriterSink<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap `inner`
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn write(&mut self, text: &str) {
        let _ = self.inner.write_all(text.as_bytes());
    }

    fn write_line(&mut self, text: &str) {
        let _ = self.inner.write_all(text.as_bytes());
        let _ = self.inner.write_all(b"\r\n");
        let _ = self.inner.flush();
    }
}
