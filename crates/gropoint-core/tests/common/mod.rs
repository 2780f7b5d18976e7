#![allow(dead_code)]

use gropoint_core::protocol::{Clock, DiagnosticSink, Sleeper, Transport};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Virtual time. Every read advances one millisecond so busy loops finish.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
    sleeps: Mutex<Vec<u64>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn elapsed(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    pub fn sleeps(&self) -> Vec<u64> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.fetch_add(1, Ordering::SeqCst)
    }
}

impl Sleeper for ManualClock {
    fn sleep(&self, millis: u64) {
        self.sleeps.lock().unwrap().push(millis);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

/// What the bus answers to one command
pub enum Reply {
    Line(&'static str),
    Raw(&'static [u8]),
    Silent,
}

/// Scripted bus: each sent command pops the next reply into the receive queue
#[derive(Default)]
pub struct MockBus {
    replies: VecDeque<Reply>,
    rx: VecDeque<u8>,
    pub sent: Vec<String>,
    pub open: bool,
    pub opens: usize,
    pub closes: usize,
    pub flushes: usize,
    pub fail_reads: bool,
    pub fail_open: bool,
}

impl MockBus {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: replies.into(),
            ..Self::default()
        }
    }

    /// Every open was matched by a close and the bus ended up released
    pub fn released(&self) -> bool {
        !self.open && self.opens == self.closes
    }
}

impl Transport for MockBus {
    fn open(&mut self) -> io::Result<()> {
        if self.fail_open {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such port"));
        }
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.open {
            self.closes += 1;
        }
        self.open = false;
        self.rx.clear();
        Ok(())
    }

    fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "bus not open"));
        }
        self.sent.push(String::from_utf8_lossy(bytes).into_owned());
        match self.replies.pop_front() {
            Some(Reply::Line(line)) => {
                self.rx.extend(line.bytes());
                self.rx.extend(b"\r\n".iter());
            }
            Some(Reply::Raw(bytes)) => self.rx.extend(bytes.iter()),
            Some(Reply::Silent) | None => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "bus not open"));
        }
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "adapter unplugged"));
        }
        Ok(self.rx.pop_front())
    }
}

/// Sink that keeps every line it receives
#[derive(Clone, Default)]
pub struct SharedLines(pub Arc<Mutex<Vec<String>>>);

impl SharedLines {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl DiagnosticSink for SharedLines {
    fn write(&mut self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }

    fn write_line(&mut self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
