use std::time::Duration;

use libuhf::prelude::*;
use serial_test::serial;

use super::common::connect_from_env;

#[test]
#[serial]
#[ignore]
fn connect_reports_version() -> anyhow::Result<()> {
    let Some(reader) = connect_from_env()? else {
        return Ok(());
    };
    let version = reader.version().cloned();
    println!("model {} firmware {:?}", reader.model().name(), version.map(|v| v.firmware_string()));
    assert!(reader.version().is_some());
    reader.disconnect()?;
    Ok(())
}

#[test]
#[serial]
#[ignore]
fn one_second_read() -> anyhow::Result<()> {
    let Some(mut reader) = connect_from_env()? else {
        return Ok(());
    };
    let tags = reader.read(Duration::from_secs(1))?;
    for t in &tags {
        println!("{} ant={} rssi={} count={}", t.epc_hex(), t.antenna, t.rssi, t.read_count);
    }
    reader.disconnect()?;
    Ok(())
}

#[test]
#[serial]
#[ignore]
fn stream_for_a_moment() -> anyhow::Result<()> {
    let Some(mut reader) = connect_from_env()? else {
        return Ok(());
    };
    let events = reader.start_reading()?;
    std::thread::sleep(Duration::from_millis(500));
    reader.stop_reading()?;
    let seen = events.try_iter().filter(|e| matches!(e, ReadEvent::Tag(_))).count();
    println!("{} tag events", seen);
    reader.disconnect()?;
    Ok(())
}
