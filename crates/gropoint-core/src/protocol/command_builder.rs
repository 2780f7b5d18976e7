//! Command Builder
//!
//! Turns a command into its wire form and pushes it onto the bus.
//!
//! Wire form: `<address><body>!`. The address query `?!` is the single
//! exception and goes out without an address prefix.

use std::io;

use super::{Command, DiagnosticSink, Transport, COMMAND_TERMINATOR};

/// Builds and dispatches commands for one probe address
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder {
    address: char,
}

impl CommandBuilder {
    /// Builder for the probe at `address`
    pub fn new(address: char) -> Self {
        Self { address }
    }

    /// Address used as the command prefix
    pub fn address(&self) -> char {
        self.address
    }

    /// Wire form of a known command
    pub fn build(&self, command: Command) -> String {
        self.frame(command.is_addressed(), &command.body())
    }

    /// Wire form of an arbitrary command body, e.g. an extended `XR0`.
    ///
    /// Bodies starting with `?` are broadcast and get no address prefix.
    pub fn build_body(&self, body: &str) -> String {
        self.frame(!body.starts_with('?'), body)
    }

    fn frame(&self, addressed: bool, body: &str) -> String {
        let mut line = String::with_capacity(body.len() + 2);
        if addressed {
            line.push(self.address);
        }
        line.push_str(body);
        line.push(COMMAND_TERMINATOR);
        line
    }

    /// Transmit `command` and flush so the reply can be read straight away.
    ///
    /// Returns the line that went out.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        command: Command,
        diagnostics: Option<&mut (dyn DiagnosticSink + 'static)>,
    ) -> io::Result<String> {
        let line = self.build(command);

        tracing::debug!(command = %line, "send_command");
        if let Some(sink) = diagnostics {
            sink.write_line(&line);
        }

        transport.send_raw(line.as_bytes())?;
        transport.flush()?;

        Ok(line)
    }
}
