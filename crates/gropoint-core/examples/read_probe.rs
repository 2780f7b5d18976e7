//! GroPoint Probe Reader
//!
//! Discovers the probe on a serial port (or the built-in simulator), prints its
//! identification and one moisture and temperature reading.
//!
//! Usage:
//!   cargo run --example read_probe -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: /dev/ttyUSB0)
//!   --baud RATE       Baud rate (default: 1200)
//!   --address ADDR    Skip discovery and use this address
//!   --sim             Talk to the simulated probe instead of a port
//!   --trace           Mirror bus traffic to stderr
//!
//! Set RUST_LOG=gropoint_core=debug for protocol logging.

use anyhow::{bail, Context, Result};
use gropoint_core::prelude::*;
use gropoint_core::protocol::WriterSink;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = SerialConfig::new("/dev/ttyUSB0");
    let mut address: Option<char> = None;
    let mut simulate = false;
    let mut trace = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                config.port_name = args.get(i).context("--port needs a value")?.clone();
            }
            "--baud" | "-b" => {
                i += 1;
                config.baud_rate = args
                    .get(i)
                    .context("--baud needs a value")?
                    .parse()
                    .context("invalid baud rate")?;
            }
            "--address" | "-a" => {
                i += 1;
                let value = args.get(i).context("--address needs a value")?;
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => address = Some(c),
                    _ => bail!("address must be a single character, got {:?}", value),
                }
            }
            "--sim" => simulate = true,
            "--trace" => trace = true,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            arg if !arg.starts_with('-') => config.port_name = arg.to_string(),
            other => eprintln!("Unknown option: {}", other),
        }
        i += 1;
    }

    let transport: Box<dyn Transport> = if simulate {
        println!("Using simulated probe");
        Box::new(SimulatedProbe::new('0'))
    } else {
        println!("Using {} at {} baud", config.port_name, config.baud_rate);
        Box::new(SerialTransport::new(config))
    };

    let mut device = Device::new(transport);
    if trace {
        device.set_diagnostics(Some(Box::new(WriterSink::new(std::io::stderr()))));
    }

    match address {
        Some(addr) => device.set_address(addr)?,
        None => match device.discover_address()? {
            Some(found) => println!("Found probe at address '{}'", found),
            None => bail!("no probe answered the address query"),
        },
    }

    let info = device.query_info()?;
    println!("Identification: {}", if info.is_empty() { "<none>" } else { info.as_str() });

    for kind in [MeasurementKind::Moisture, MeasurementKind::Temperature] {
        let mut values = [0.0f32; 9];
        match device.measure(kind, &mut values) {
            Ok(n) => println!("{:<12} {:?}", kind.to_string(), &values[..n]),
            Err(e) => println!("{:<12} failed ({}): {}", kind.to_string(), e.code(), e),
        }
    }

    Ok(())
}

fn print_help() {
    println!("read_probe - read a GroPoint probe over SDI-12");
    println!();
    println!("USAGE: read_probe [OPTIONS] [PORT]");
    println!();
    println!("  --port PORT       Serial port (default: /dev/ttyUSB0)");
    println!("  --baud RATE       Baud rate (default: 1200)");
    println!("  --address ADDR    Skip discovery and use this address");
    println!("  --sim             Talk to the simulated probe");
    println!("  --trace           Mirror bus traffic to stderr");
    println!();
    println!("Available ports:");
    for port in gropoint_core::protocol::list_ports() {
        println!("  {} {}", port.name, port.product.as_deref().unwrap_or(""));
    }
}
