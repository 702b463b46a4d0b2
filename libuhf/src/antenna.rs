// libuhf-rs/libuhf/src/antenna.rs
//! Logical antenna numbering and its mapping onto physical tx/rx ports.
//!
//! An [`AntennaMap`] is an immutable value. Replacing the map builds a new
//! value and swaps it in, so a reader never observes a half-updated map.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Error, Result};

/// One logical antenna and the physical ports it transmits/receives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AntennaPort {
    pub logical: u32,
    pub tx: u8,
    pub rx: u8,
}

impl AntennaPort {
    pub const fn new(logical: u32, tx: u8, rx: u8) -> Self {
        Self { logical, tx, rx }
    }

    pub const fn monostatic(port: u8) -> Self {
        Self::new(port as u32, port, port)
    }

    /// Wire byte: tx in the high nibble, rx in the low nibble. Ports above
    /// 15 wrap, which is a limitation of the wire format.
    pub const fn wire_byte(&self) -> u8 {
        ((self.tx & 0x0F) << 4) | (self.rx & 0x0F)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntennaMap {
    forward: BTreeMap<u32, (u8, u8)>,
    reverse: HashMap<u8, u32>,
}

impl AntennaMap {
    /// Build a map, checking every port against `physical_ports`.
    ///
    /// Fails on an unknown port, a repeated logical id or two entries that
    /// share a wire byte (ports above 15 included, after wrapping); nothing
    /// is built in that case.
    pub fn new(ports: &[AntennaPort], physical_ports: &[u8]) -> Result<Self> {
        let mut forward = BTreeMap::new();
        let mut reverse = HashMap::new();
        for p in ports {
            for port in [p.tx, p.rx] {
                if !physical_ports.contains(&port) {
                    return Err(Error::InvalidArgument(format!(
                        "antenna {}: port {} is not one of {:?}",
                        p.logical, port, physical_ports
                    )));
                }
            }
            if forward.insert(p.logical, (p.tx, p.rx)).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "logical antenna {} listed twice",
                    p.logical
                )));
            }
            if let Some(other) = reverse.insert(p.wire_byte(), p.logical) {
                return Err(Error::InvalidArgument(format!(
                    "antennas {} and {} share wire pairing {:#04x}",
                    other,
                    p.logical,
                    p.wire_byte()
                )));
            }
        }
        Ok(Self { forward, reverse })
    }

    /// One logical antenna per physical port, numbered like the port.
    pub fn monostatic(physical_ports: &[u8]) -> Self {
        let ports: Vec<AntennaPort> = physical_ports
            .iter()
            .map(|&p| AntennaPort::monostatic(p))
            .collect();
        let mut forward = BTreeMap::new();
        let mut reverse = HashMap::new();
        for p in &ports {
            forward.insert(p.logical, (p.tx, p.rx));
            reverse.insert(p.wire_byte(), p.logical);
        }
        Self { forward, reverse }
    }

    pub fn tx_rx(&self, logical: u32) -> Option<(u8, u8)> {
        self.forward.get(&logical).copied()
    }

    /// Wire byte for a logical antenna, for search commands.
    pub fn wire_byte(&self, logical: u32) -> Result<u8> {
        let (tx, rx) = self.tx_rx(logical).ok_or_else(|| {
            Error::InvalidArgument(format!("logical antenna {} is not mapped", logical))
        })?;
        Ok(AntennaPort::new(logical, tx, rx).wire_byte())
    }

    /// Translate a wire antenna byte from a tag record into a logical id.
    pub fn translate_wire(&self, byte: u8) -> Result<u32> {
        self.reverse
            .get(&byte)
            .copied()
            .ok_or(Error::UnknownAntenna {
                tx: byte >> 4,
                rx: byte & 0x0F,
            })
    }

    pub fn ports(&self) -> Vec<AntennaPort> {
        self.forward
            .iter()
            .map(|(&logical, &(tx, rx))| AntennaPort { logical, tx, rx })
            .collect()
    }

    pub fn logical_ids(&self) -> Vec<u32> {
        self.forward.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// The reader's current map, shared between the dispatcher and the read
/// engines. Readers get a snapshot; writers swap a whole new map.
#[derive(Debug, Clone)]
pub struct SharedAntennaMap {
    current: Arc<RwLock<Arc<AntennaMap>>>,
    physical_ports: Arc<RwLock<Vec<u8>>>,
}

impl SharedAntennaMap {
    pub fn new(map: AntennaMap, physical_ports: Vec<u8>) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(map))),
            physical_ports: Arc::new(RwLock::new(physical_ports)),
        }
    }

    pub fn load(&self) -> Arc<AntennaMap> {
        Arc::clone(&*self.current.read())
    }

    pub fn physical_ports(&self) -> Vec<u8> {
        self.physical_ports.read().clone()
    }

    /// Validate `ports` against the known physical ports and swap the map
    /// in. On error the previous map stays in place.
    pub fn set_map(&self, ports: &[AntennaPort]) -> Result<()> {
        let physical = self.physical_ports();
        let next = AntennaMap::new(ports, &physical)?;
        *self.current.write() = Arc::new(next);
        Ok(())
    }

    /// Install a new physical layout and its default map (after connect).
    pub fn reset(&self, map: AntennaMap, physical_ports: Vec<u8>) {
        *self.physical_ports.write() = physical_ports;
        *self.current.write() = Arc::new(map);
    }
}

impl Default for SharedAntennaMap {
    fn default() -> Self {
        Self::new(AntennaMap::default(), Vec::new())
    }
}
