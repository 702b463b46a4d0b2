// libuhf-rs/libuhf/src/protocol/filter.rs

use crate::types::{Epc, MemoryBank};
use crate::{Error, Result};

const FILTER_NONE: u8 = 0x00;
const FILTER_EPC: u8 = 0x01;
const FILTER_GEN2_SELECT: u8 = 0x02;
const SELECT_INVERT: u8 = 0x08;

/// Singulation filter applied to a search or a standalone tag operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagFilter {
    /// Match the full EPC.
    Epc(Epc),
    /// Gen2 Select on a memory bank region.
    Gen2Select {
        invert: bool,
        bank: MemoryBank,
        bit_pointer: u32,
        bit_length: u16,
        mask: Vec<u8>,
    },
}

impl TagFilter {
    pub fn validate(&self) -> Result<()> {
        match self {
            TagFilter::Epc(epc) => {
                if epc.len() * 8 > u16::MAX as usize {
                    return Err(Error::InvalidArgument("EPC filter too long".into()));
                }
                Ok(())
            }
            TagFilter::Gen2Select {
                bit_length, mask, ..
            } => {
                let needed = (*bit_length as usize).div_ceil(8);
                if mask.len() < needed {
                    return Err(Error::InvalidArgument(format!(
                        "select mask has {} bytes, {} bits need {}",
                        mask.len(),
                        bit_length,
                        needed
                    )));
                }
                Ok(())
            }
        }
    }

    /// Filter block: `[type]` followed by the type-specific fields.
    pub fn encode_block(filter: Option<&TagFilter>) -> Result<Vec<u8>> {
        let Some(filter) = filter else {
            return Ok(vec![FILTER_NONE]);
        };
        filter.validate()?;
        let mut out = Vec::new();
        match filter {
            TagFilter::Epc(epc) => {
                out.push(FILTER_EPC);
                out.extend_from_slice(&((epc.len() * 8) as u16).to_be_bytes());
                out.extend_from_slice(epc.as_bytes());
            }
            TagFilter::Gen2Select {
                invert,
                bank,
                bit_pointer,
                bit_length,
                mask,
            } => {
                out.push(FILTER_GEN2_SELECT);
                let mut opts = bank.code();
                if *invert {
                    opts |= SELECT_INVERT;
                }
                out.push(opts);
                out.extend_from_slice(&bit_pointer.to_be_bytes());
                out.extend_from_slice(&bit_length.to_be_bytes());
                let used = (*bit_length as usize).div_ceil(8);
                out.extend_from_slice(&mask[..used]);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filter() {
        assert_eq!(TagFilter::encode_block(None).unwrap(), vec![0x00]);
    }

    #[test]
    fn epc_filter() {
        let f = TagFilter::Epc(Epc::from_bytes(&[0xAB, 0xCD]));
        assert_eq!(
            TagFilter::encode_block(Some(&f)).unwrap(),
            vec![0x01, 0x00, 0x10, 0xAB, 0xCD]
        );
    }

    #[test]
    fn select_filter_trims_mask() {
        let f = TagFilter::Gen2Select {
            invert: true,
            bank: MemoryBank::Tid,
            bit_pointer: 0x20,
            bit_length: 12,
            mask: vec![0xE2, 0x80, 0xFF],
        };
        assert_eq!(
            TagFilter::encode_block(Some(&f)).unwrap(),
            vec![0x02, 0x0A, 0, 0, 0, 0x20, 0x00, 0x0C, 0xE2, 0x80]
        );
    }

    #[test]
    fn select_mask_too_short() {
        let f = TagFilter::Gen2Select {
            invert: false,
            bank: MemoryBank::User,
            bit_pointer: 0,
            bit_length: 17,
            mask: vec![0, 0],
        };
        assert!(matches!(
            TagFilter::encode_block(Some(&f)),
            Err(Error::InvalidArgument(_))
        ));
    }
}
