mod common;

use common::ManualClock;
use gropoint_core::prelude::*;
use pretty_assertions::assert_eq;

fn probe_device(probe: SimulatedProbe) -> Device<SimulatedProbe> {
    common::init_tracing();
    let clock = ManualClock::new();
    Device::new(probe)
        .with_clock(clock.clone())
        .with_sleeper(clock)
}

#[test]
fn test_full_session_against_simulator() {
    let mut dev = probe_device(SimulatedProbe::with_seed('c', 42));

    assert_eq!(dev.discover_address().unwrap(), Some('c'));
    assert_eq!(dev.query_info().unwrap(), "c13GROPOINTGPLP  100SIM001");

    let mut moisture = [0.0f32; 9];
    let n = dev.read_moisture(&mut moisture).unwrap();
    assert_eq!(n, 6);
    assert_eq!(&moisture[..n], dev.transport().last_values());

    let mut temperature = [0.0f32; 9];
    let n = dev.read_temperature(&mut temperature).unwrap();
    assert_eq!(n, 8);
    assert_eq!(&temperature[..n], dev.transport().last_values());

    assert_eq!(
        dev.transport().received(),
        &["?!", "cI!", "cM!", "cD0!", "cM1!", "cD0!"]
    );
    assert!(!dev.transport().is_open());
}

#[test]
fn test_simulator_without_service_request_waits_window() {
    let mut probe = SimulatedProbe::with_seed('0', 3);
    probe.set_wait_seconds(3);
    probe.set_service_request(false);
    probe.set_sensor_counts(2, 2);

    common::init_tracing();
    let clock = ManualClock::new();
    let mut dev = Device::new(probe)
        .with_clock(clock.clone())
        .with_sleeper(clock.clone());

    let mut values = [0.0f32; 2];
    assert_eq!(dev.read_moisture(&mut values).unwrap(), 2);
    assert!(clock.elapsed() >= 3000);
}

#[test]
fn test_silent_simulator() {
    let mut probe = SimulatedProbe::with_seed('0', 3);
    probe.set_silent(true);
    let mut dev = probe_device(probe);

    assert_eq!(dev.discover_address().unwrap(), None);
    assert_eq!(dev.query_info().unwrap(), "");

    let mut values = [0.0f32; 4];
    let err = dev.read_moisture(&mut values).unwrap_err();
    assert_eq!(err.code(), -1);
    assert!(!dev.transport().is_open());
}

#[test]
fn test_wrong_configured_address() {
    let clock = ManualClock::new();
    let mut dev = Device::with_address(SimulatedProbe::with_seed('5', 1), '6')
        .unwrap()
        .with_clock(clock.clone())
        .with_sleeper(clock);

    let mut values = [0.0f32; 4];
    let err = dev.read_moisture(&mut values).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::AddressMismatch {
            expected: '6',
            actual: None
        }
    ));

    // Discovery corrects it
    assert_eq!(dev.discover_address().unwrap(), Some('5'));
    assert_eq!(dev.read_moisture(&mut values).unwrap(), 4);
}

#[test]
fn test_device_from_json_config() {
    let config = DeviceConfig::from_json(r#"{ "address": "d", "read_timeout_ms": 500 }"#).unwrap();
    let clock = ManualClock::new();
    let mut dev = Device::from_config(SimulatedProbe::with_seed('d', 9), config)
        .unwrap()
        .with_clock(clock.clone())
        .with_sleeper(clock);

    assert_eq!(dev.address(), 'd');
    assert_eq!(dev.config().read_timeout_ms, 500);

    let mut values = [0.0f32; 1];
    assert_eq!(dev.read_temperature(&mut values).unwrap(), 1);
}

#[test]
fn test_device_from_invalid_config() {
    let config = DeviceConfig::with_address('!');
    assert!(Device::from_config(SimulatedProbe::new('0'), config).is_err());
}
