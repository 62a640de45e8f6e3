//! Module image encoding, parsing, and validation.

use crate::ops::Op;
use thiserror::Error;

/// BBX magic number: "BBXM"
pub const MODULE_MAGIC: u32 = 0x4D584242;

/// Current BBX format version
pub const MODULE_VERSION: u32 = 1;

/// Size of the fixed header in bytes
const HEADER_LEN: usize = 20;

/// Size of one encoded instruction in bytes
const OP_LEN: usize = 5;

/// Errors that can occur while compiling raw module bytes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    /// Image shorter than the fixed header
    #[error("module image too short: {0} bytes")]
    ImageTooShort(usize),

    /// Magic number mismatch
    #[error("unrecognized module magic: {0:#010x}")]
    BadMagic(u32),

    /// Version not supported by this runtime
    #[error("unsupported module version: {0}")]
    UnsupportedVersion(u32),

    /// Code section shorter than the declared instruction count
    #[error("code section truncated: declared {declared} instructions, {available} bytes follow the header")]
    TruncatedCode { declared: u32, available: usize },

    /// Bytes left over after the declared instruction count
    #[error("{0} trailing bytes after code section")]
    TrailingBytes(usize),

    /// Opcode byte not part of the instruction set
    #[error("unknown opcode {opcode:#04x} at instruction {at}")]
    UnknownOpcode { opcode: u8, at: u32 },

    /// Operand does not fit the instruction's operand range
    #[error("operand out of range at instruction {at}")]
    OperandOutOfRange { at: u32 },

    /// Branch target past the end of the code section
    #[error("branch target {target} out of range at instruction {at} (module has {len} instructions)")]
    BranchOutOfRange { at: u32, target: u32, len: u32 },

    /// Entry point past the end of the code section
    #[error("entry point {entry} out of range (module has {len} instructions)")]
    EntryOutOfRange { entry: u32, len: u32 },

    /// Tape hint of zero cells
    #[error("module declares a zero-length tape")]
    ZeroTapeHint,
}

/// A validated bytecode module, ready for instantiation
///
/// `parse` is the loader's compile step: a `ModuleImage` that exists has a
/// known version, in-range branch targets, and well-formed operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImage {
    /// Index of the first instruction to execute
    pub entry: u32,
    /// Initial tape length in cells
    pub tape_hint: u32,
    /// Decoded instruction sequence
    pub ops: Vec<Op>,
}

impl ModuleImage {
    /// Creates a module starting at instruction 0
    pub fn new(ops: Vec<Op>, tape_hint: u32) -> Self {
        Self {
            entry: 0,
            tape_hint,
            ops,
        }
    }

    /// Serializes the module into its binary image
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ops.len() * OP_LEN);

        buf.extend_from_slice(&MODULE_MAGIC.to_le_bytes());
        buf.extend_from_slice(&MODULE_VERSION.to_le_bytes());
        buf.extend_from_slice(&self.entry.to_le_bytes());
        buf.extend_from_slice(&self.tape_hint.to_le_bytes());
        buf.extend_from_slice(&(self.ops.len() as u32).to_le_bytes());

        for op in &self.ops {
            buf.push(op.opcode());
            buf.extend_from_slice(&op.operand().to_le_bytes());
        }

        buf
    }

    /// Parses and validates a binary module image
    ///
    /// This is the only way to obtain a `ModuleImage` from untrusted bytes;
    /// every failure is a typed error, never a silently-broken module.
    pub fn parse(data: &[u8]) -> Result<Self, ModuleError> {
        if data.len() < HEADER_LEN {
            return Err(ModuleError::ImageTooShort(data.len()));
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        let magic = read_u32(0);
        if magic != MODULE_MAGIC {
            return Err(ModuleError::BadMagic(magic));
        }

        let version = read_u32(4);
        if version != MODULE_VERSION {
            return Err(ModuleError::UnsupportedVersion(version));
        }

        let entry = read_u32(8);
        let tape_hint = read_u32(12);
        let count = read_u32(16);

        let code = &data[HEADER_LEN..];
        let expected = count as usize * OP_LEN;
        if code.len() < expected {
            return Err(ModuleError::TruncatedCode {
                declared: count,
                available: code.len(),
            });
        }
        if code.len() > expected {
            return Err(ModuleError::TrailingBytes(code.len() - expected));
        }

        let mut ops = Vec::with_capacity(count as usize);
        for at in 0..count {
            let base = at as usize * OP_LEN;
            let opcode = code[base];
            let operand = u32::from_le_bytes([
                code[base + 1],
                code[base + 2],
                code[base + 3],
                code[base + 4],
            ]);

            let op = match opcode {
                0x01 => {
                    if operand > u32::from(u8::MAX) {
                        return Err(ModuleError::OperandOutOfRange { at });
                    }
                    Op::Add(operand as u8)
                }
                0x02 => Op::MovePtr(operand as i32),
                0x03 => {
                    if operand > u32::from(u8::MAX) {
                        return Err(ModuleError::OperandOutOfRange { at });
                    }
                    Op::Set(operand as u8)
                }
                0x04 => Op::Read,
                0x05 => Op::Write,
                0x06 => Op::JumpIfZero(operand),
                0x07 => Op::Jump(operand),
                opcode => return Err(ModuleError::UnknownOpcode { opcode, at }),
            };
            ops.push(op);
        }

        let module = Self {
            entry,
            tape_hint,
            ops,
        };
        module.validate()?;
        Ok(module)
    }

    /// Validates structural invariants of a module
    ///
    /// `parse` calls this; builders that assemble a module in memory can
    /// call it before handing the image to an execution context.
    pub fn validate(&self) -> Result<(), ModuleError> {
        let len = self.ops.len() as u32;

        if self.tape_hint == 0 {
            return Err(ModuleError::ZeroTapeHint);
        }

        // entry == len is an empty run, which is legal
        if self.entry > len {
            return Err(ModuleError::EntryOutOfRange {
                entry: self.entry,
                len,
            });
        }

        for (at, op) in self.ops.iter().enumerate() {
            if let Op::JumpIfZero(target) | Op::Jump(target) = op {
                // target == len halts, so only strictly-past is invalid
                if *target > len {
                    return Err(ModuleError::BranchOutOfRange {
                        at: at as u32,
                        target: *target,
                        len,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ops() -> Vec<Op> {
        vec![
            Op::Read,
            Op::JumpIfZero(5),
            Op::Add(1),
            Op::Write,
            Op::Jump(0),
            Op::Set(0),
        ]
    }

    #[test]
    fn test_parse_valid_module() {
        let image = ModuleImage::new(sample_ops(), 30_000);
        let parsed = ModuleImage::parse(&image.to_bytes()).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_parse_bad_magic() {
        let mut data = ModuleImage::new(sample_ops(), 1).to_bytes();
        data[0..4].copy_from_slice(&0x12345678u32.to_le_bytes());

        let result = ModuleImage::parse(&data);
        assert!(matches!(result, Err(ModuleError::BadMagic(0x12345678))));
    }

    #[test]
    fn test_parse_unsupported_version() {
        let mut data = ModuleImage::new(sample_ops(), 1).to_bytes();
        data[4..8].copy_from_slice(&99u32.to_le_bytes());

        let result = ModuleImage::parse(&data);
        assert!(matches!(result, Err(ModuleError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_parse_image_too_short() {
        let result = ModuleImage::parse(&[0u8; 10]);
        assert!(matches!(result, Err(ModuleError::ImageTooShort(10))));
    }

    #[test]
    fn test_parse_truncated_code() {
        let mut data = ModuleImage::new(sample_ops(), 1).to_bytes();
        data.truncate(data.len() - 3);

        let result = ModuleImage::parse(&data);
        assert!(matches!(result, Err(ModuleError::TruncatedCode { .. })));
    }

    #[test]
    fn test_parse_trailing_bytes() {
        let mut data = ModuleImage::new(sample_ops(), 1).to_bytes();
        data.extend_from_slice(&[0, 0]);

        let result = ModuleImage::parse(&data);
        assert!(matches!(result, Err(ModuleError::TrailingBytes(2))));
    }

    #[test]
    fn test_parse_unknown_opcode() {
        let mut data = ModuleImage::new(vec![Op::Read], 1).to_bytes();
        data[HEADER_LEN] = 0x7F;

        let result = ModuleImage::parse(&data);
        assert!(matches!(
            result,
            Err(ModuleError::UnknownOpcode { opcode: 0x7F, at: 0 })
        ));
    }

    #[test]
    fn test_parse_operand_out_of_range() {
        let mut data = ModuleImage::new(vec![Op::Add(0)], 1).to_bytes();
        data[HEADER_LEN + 1..HEADER_LEN + 5].copy_from_slice(&300u32.to_le_bytes());

        let result = ModuleImage::parse(&data);
        assert!(matches!(
            result,
            Err(ModuleError::OperandOutOfRange { at: 0 })
        ));
    }

    #[test]
    fn test_validate_branch_out_of_range() {
        let module = ModuleImage::new(vec![Op::Jump(2)], 1);
        let result = module.validate();
        assert!(matches!(
            result,
            Err(ModuleError::BranchOutOfRange {
                at: 0,
                target: 2,
                len: 1
            })
        ));
    }

    #[test]
    fn test_validate_branch_to_end_is_legal() {
        let module = ModuleImage::new(vec![Op::Jump(1)], 1);
        assert_eq!(module.validate(), Ok(()));
    }

    #[test]
    fn test_validate_entry_out_of_range() {
        let mut module = ModuleImage::new(vec![Op::Read], 1);
        module.entry = 2;
        let result = module.validate();
        assert!(matches!(
            result,
            Err(ModuleError::EntryOutOfRange { entry: 2, len: 1 })
        ));
    }

    #[test]
    fn test_validate_zero_tape_hint() {
        let module = ModuleImage::new(vec![Op::Read], 0);
        assert!(matches!(module.validate(), Err(ModuleError::ZeroTapeHint)));
    }

    #[test]
    fn test_empty_module_is_valid() {
        let image = ModuleImage::new(Vec::new(), 1);
        let parsed = ModuleImage::parse(&image.to_bytes()).unwrap();
        assert!(parsed.ops.is_empty());
    }
}
