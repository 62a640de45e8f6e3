//! Module instantiation and the synchronous execution loop.

use crate::host::{HostTable, TransferCell};
use bytecode::{ModuleImage, Op};
use thiserror::Error;

/// Faults a module can raise during execution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrapError {
    /// The data pointer was moved below the start of the tape
    #[error("data pointer moved below the tape (to {0})")]
    PointerUnderflow(i64),
}

/// Growable tape of byte cells
#[derive(Debug)]
struct Tape(Vec<u8>);

impl Tape {
    fn with_len(len: usize) -> Self {
        Self(vec![0; len])
    }

    #[inline]
    fn extend(&mut self, index: usize) {
        if self.0.len() <= index {
            let extend_len = self.0.len() * 2 + index + 1;
            log::trace!("tape extend {} -> {}", self.0.len(), extend_len);
            self.0.resize(extend_len, 0);
        }
    }

    #[inline]
    fn get(&mut self, index: usize) -> u8 {
        *self.get_mut(index)
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> &mut u8 {
        self.extend(index);
        &mut self.0[index]
    }
}

/// A module instantiated against a host-call table, ready to run
///
/// All mutable execution state (tape, data pointer, program counter, and
/// the transfer cell) lives here, so dropping the instance leaves nothing
/// behind for the next run to observe.
pub struct Instance<'m, H: HostTable> {
    ops: &'m [Op],
    host: H,
    cell: TransferCell,
    tape: Tape,
    pointer: usize,
    pc: usize,
}

impl<'m, H: HostTable> Instance<'m, H> {
    /// Instantiates a validated module
    pub fn new(module: &'m ModuleImage, host: H) -> Self {
        Self {
            ops: &module.ops,
            host,
            cell: TransferCell::new(),
            tape: Tape::with_len(module.tape_hint as usize),
            pointer: 0,
            pc: module.entry as usize,
        }
    }

    /// Runs the entry point synchronously to completion
    ///
    /// Returns when the program counter falls off the end of the code, or
    /// with a trap. A module that never terminates keeps this call live
    /// until the whole context is killed from outside.
    pub fn run(&mut self) -> Result<(), TrapError> {
        while let Some(op) = self.ops.get(self.pc) {
            match *op {
                Op::Add(value) => {
                    let cell = self.tape.get_mut(self.pointer);
                    *cell = cell.wrapping_add(value);
                    self.pc += 1;
                }
                Op::MovePtr(distance) => {
                    let target = self.pointer as i64 + i64::from(distance);
                    if target < 0 {
                        return Err(TrapError::PointerUnderflow(target));
                    }
                    self.pointer = target as usize;
                    self.pc += 1;
                }
                Op::Set(value) => {
                    *self.tape.get_mut(self.pointer) = value;
                    self.pc += 1;
                }
                Op::Read => {
                    self.host.read_byte(&mut self.cell);
                    *self.tape.get_mut(self.pointer) = self.cell.load();
                    self.pc += 1;
                }
                Op::Write => {
                    self.cell.store(self.tape.get(self.pointer));
                    self.host.write_byte(&self.cell);
                    self.pc += 1;
                }
                Op::JumpIfZero(target) => {
                    if self.tape.get(self.pointer) == 0 {
                        self.pc = target as usize;
                    } else {
                        self.pc += 1;
                    }
                }
                Op::Jump(target) => {
                    self.pc = target as usize;
                }
            }
        }
        Ok(())
    }

    /// Consumes the instance, returning the host side
    pub fn into_host(self) -> H {
        self.host
    }
}
