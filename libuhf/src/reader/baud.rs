// libuhf-rs/libuhf/src/reader/baud.rs
//! Finding the rate a module is listening at.

use log::{debug, info};

use crate::constants::BAUD_CANDIDATES;
use crate::protocol::{Command, Response};
use crate::reader::dispatch::Dispatcher;
use crate::types::VersionInfo;
use crate::{Error, ErrorKind, Result};

/// Device-side budget of one version probe.
pub const PROBE_TIMEOUT_MS: u64 = 100;

/// Attempts at the remembered rate before sweeping; a sleeping module may
/// swallow the first frame.
const REMEMBERED_ATTEMPTS: usize = 2;

/// Order in which rates are probed: the remembered one (twice) and then
/// every other candidate.
pub fn probe_order(remembered: u32) -> Vec<u32> {
    let mut order = vec![remembered; REMEMBERED_ATTEMPTS];
    order.extend(BAUD_CANDIDATES.iter().copied().filter(|&b| b != remembered));
    order
}

fn probe(dispatcher: &Dispatcher, baud: u32) -> Result<VersionInfo> {
    {
        let mut link = dispatcher.link().lock();
        link.transport_mut().set_baud_rate(baud)?;
        link.transport_mut().flush_input()?;
    }
    let cmd = Command::Version;
    match dispatcher.execute_with_timeout(&cmd, PROBE_TIMEOUT_MS)? {
        Response::Version(v) => Ok(v),
        other => Err(Error::Parse(format!("unexpected version reply {:?}", other))),
    }
}

/// Probe with version queries until one rate answers. Returns the rate
/// and the version it answered with; the transport is left at that rate.
///
/// Only communication failures move the sweep on; any other error means
/// the module answered and is returned as is.
pub fn negotiate(dispatcher: &Dispatcher, remembered: u32) -> Result<(u32, VersionInfo)> {
    for baud in probe_order(remembered) {
        match probe(dispatcher, baud) {
            Ok(version) => {
                info!("module answered at {} baud", baud);
                return Ok((baud, version));
            }
            Err(e) if e.kind() == ErrorKind::Communication => {
                debug!("no answer at {} baud: {}", baud, e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(Error::BaudNegotiationFailed)
}
