// libuhf-rs/libuhf/src/protocol/tagop.rs
//! Tag operations, either run standalone or embedded in a search.
//!
//! Each variant knows its opcode, how to build its body and how to read its
//! result; vendor chip operations plug in through [`CustomTagOp`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::constants::opcode;
use crate::types::{Epc, MemoryBank};
use crate::{Error, Result};

/// Largest word count a single read-data operation may request.
pub const MAX_READ_WORDS: u8 = 123;

/// Payload builder/parser for a vendor-specific tag operation.
pub trait CustomTagOp: Send + Sync + Debug {
    fn opcode(&self) -> u8;

    /// Operation body, placed after the access password and filter.
    fn build_payload(&self) -> Result<Vec<u8>>;

    fn parse_result(&self, data: &[u8]) -> Result<TagOpResult> {
        Ok(TagOpResult::from_data(data))
    }
}

/// Outcome of a tag operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagOpResult {
    Done,
    Data(Vec<u8>),
}

impl TagOpResult {
    fn from_data(data: &[u8]) -> Self {
        if data.is_empty() {
            TagOpResult::Done
        } else {
            TagOpResult::Data(data.to_vec())
        }
    }
}

#[derive(Debug, Clone)]
pub enum TagOp {
    ReadData {
        bank: MemoryBank,
        word_address: u32,
        word_count: u8,
    },
    WriteData {
        bank: MemoryBank,
        word_address: u32,
        data: Vec<u8>,
    },
    WriteTag {
        epc: Epc,
    },
    Lock {
        mask: u16,
        action: u16,
    },
    Kill {
        password: u32,
    },
    BlockWrite {
        bank: MemoryBank,
        word_address: u32,
        data: Vec<u8>,
    },
    Custom(Arc<dyn CustomTagOp>),
}

fn check_words(data: &[u8]) -> Result<()> {
    if data.is_empty() || data.len() % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "write data must be a non-empty whole number of words, got {} bytes",
            data.len()
        )));
    }
    Ok(())
}

impl TagOp {
    pub fn opcode(&self) -> u8 {
        match self {
            TagOp::ReadData { .. } => opcode::READ_TAG_DATA,
            TagOp::WriteData { .. } => opcode::WRITE_TAG_DATA,
            TagOp::WriteTag { .. } => opcode::WRITE_TAG_ID,
            TagOp::Lock { .. } => opcode::LOCK_TAG,
            TagOp::Kill { .. } => opcode::KILL_TAG,
            TagOp::BlockWrite { .. } => opcode::BLOCK_WRITE,
            TagOp::Custom(op) => op.opcode(),
        }
    }

    /// Operation-specific body.
    pub fn body(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            TagOp::ReadData {
                bank,
                word_address,
                word_count,
            } => {
                if *word_count == 0 || *word_count > MAX_READ_WORDS {
                    return Err(Error::InvalidArgument(format!(
                        "word count must be 1..={}, got {}",
                        MAX_READ_WORDS, word_count
                    )));
                }
                out.push(bank.code());
                out.extend_from_slice(&word_address.to_be_bytes());
                out.push(*word_count);
            }
            TagOp::WriteData {
                bank,
                word_address,
                data,
            } => {
                check_words(data)?;
                out.push(bank.code());
                out.extend_from_slice(&word_address.to_be_bytes());
                out.extend_from_slice(data);
            }
            TagOp::WriteTag { epc } => {
                check_words(epc.as_bytes())?;
                out.extend_from_slice(epc.as_bytes());
            }
            TagOp::Lock { mask, action } => {
                out.extend_from_slice(&mask.to_be_bytes());
                out.extend_from_slice(&action.to_be_bytes());
            }
            TagOp::Kill { password } => {
                out.extend_from_slice(&password.to_be_bytes());
            }
            TagOp::BlockWrite {
                bank,
                word_address,
                data,
            } => {
                check_words(data)?;
                out.push(bank.code());
                out.extend_from_slice(&word_address.to_be_bytes());
                out.push((data.len() / 2) as u8);
                out.extend_from_slice(data);
            }
            TagOp::Custom(op) => out = op.build_payload()?,
        }
        Ok(out)
    }

    /// Standalone arguments: `[timeout u16][password u32][filter][body]`.
    pub fn encode_standalone(
        &self,
        timeout_ms: u16,
        password: u32,
        filter_block: &[u8],
    ) -> Result<Vec<u8>> {
        let body = self.body()?;
        let mut out = Vec::with_capacity(6 + filter_block.len() + body.len());
        out.extend_from_slice(&timeout_ms.to_be_bytes());
        out.extend_from_slice(&password.to_be_bytes());
        out.extend_from_slice(filter_block);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Embedded form inside a search: `[len][opcode][password u32][body]`,
    /// where `len` counts the password and body bytes.
    pub fn encode_embedded(&self, password: u32) -> Result<Vec<u8>> {
        let body = self.body()?;
        let len = 4 + body.len();
        if len > u8::MAX as usize {
            return Err(Error::InvalidLength {
                expected: u8::MAX as usize,
                actual: len,
            });
        }
        let mut out = Vec::with_capacity(2 + len);
        out.push(len as u8);
        out.push(self.opcode());
        out.extend_from_slice(&password.to_be_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn parse_result(&self, data: &[u8]) -> Result<TagOpResult> {
        match self {
            TagOp::ReadData { word_count, .. } => {
                let expected = *word_count as usize * 2;
                if data.len() != expected {
                    return Err(Error::InvalidLength {
                        expected,
                        actual: data.len(),
                    });
                }
                Ok(TagOpResult::Data(data.to_vec()))
            }
            TagOp::Custom(op) => op.parse_result(data),
            _ => Ok(TagOpResult::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Blink;

    impl CustomTagOp for Blink {
        fn opcode(&self) -> u8 {
            0x2D
        }
        fn build_payload(&self) -> Result<Vec<u8>> {
            Ok(vec![0x04, 0x01])
        }
    }

    #[test]
    fn read_data_body() {
        let op = TagOp::ReadData {
            bank: MemoryBank::Tid,
            word_address: 2,
            word_count: 4,
        };
        assert_eq!(op.opcode(), 0x28);
        assert_eq!(op.body().unwrap(), vec![0x02, 0, 0, 0, 2, 4]);
        assert_eq!(
            op.parse_result(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
            TagOpResult::Data(vec![1, 2, 3, 4, 5, 6, 7, 8])
        );
        assert!(op.parse_result(&[1, 2]).is_err());
    }

    #[test]
    fn word_count_validated_locally() {
        let op = TagOp::ReadData {
            bank: MemoryBank::User,
            word_address: 0,
            word_count: 0,
        };
        assert!(matches!(op.body(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn odd_write_rejected() {
        let op = TagOp::WriteData {
            bank: MemoryBank::User,
            word_address: 0,
            data: vec![1, 2, 3],
        };
        assert!(op.body().is_err());
    }

    #[test]
    fn standalone_layout() {
        let op = TagOp::Kill {
            password: 0xDEADBEEF,
        };
        let args = op.encode_standalone(500, 0x11223344, &[0x00]).unwrap();
        assert_eq!(
            args,
            vec![0x01, 0xF4, 0x11, 0x22, 0x33, 0x44, 0x00, 0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn embedded_layout() {
        let op = TagOp::Lock {
            mask: 0x0003,
            action: 0x0002,
        };
        let e = op.encode_embedded(0).unwrap();
        assert_eq!(e, vec![8, 0x25, 0, 0, 0, 0, 0x00, 0x03, 0x00, 0x02]);
    }

    #[test]
    fn custom_op_dispatches_through_trait() {
        let op = TagOp::Custom(Arc::new(Blink));
        assert_eq!(op.opcode(), 0x2D);
        assert_eq!(op.body().unwrap(), vec![0x04, 0x01]);
        assert_eq!(op.parse_result(&[]).unwrap(), TagOpResult::Done);
    }
}
