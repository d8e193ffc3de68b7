//! Stop and configuration error types.

use std::error::Error;
use std::fmt;

/// Reasons the execution loop unwinds to its caller.
///
/// These are simulator-level stops, distinct from the architectural traps
/// (overflow, page fail, UUO) which the emulated program can recover from
/// and which never surface as Rust errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// HALT instruction executed in executive mode.
    Halt,
    /// A front-end breakpoint was delivered through the event queue.
    Breakpoint,
    /// A single-step budget expired.
    Step,
    /// An indirect chain exceeded the configured depth guard.
    IndirectLimit,
    /// An XCT chain exceeded the configured depth guard.
    XctLimit,
    /// An instruction that cannot run in an interrupt cycle was vectored.
    InterruptInstruction,
    /// A device handler reported a hard error.
    IoError,
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Halt => write!(f, "HALT instruction"),
            Stop::Breakpoint => write!(f, "breakpoint"),
            Stop::Step => write!(f, "step expired"),
            Stop::IndirectLimit => write!(f, "indirection nested too deep"),
            Stop::XctLimit => write!(f, "XCT nested too deep"),
            Stop::InterruptInstruction => {
                write!(f, "illegal instruction in interrupt cycle")
            }
            Stop::IoError => write!(f, "I/O device error"),
        }
    }
}

impl Error for Stop {}

/// Synchronous rejection of an invalid configuration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Memory size outside the variant's supported range.
    MemorySize { units: u32, max_units: u32 },
    /// History length outside 64..=65536.
    HistorySize { len: usize },
    /// Device number already has a handler bound.
    DeviceInUse { dev: u32 },
    /// Device number is reserved for an internal device.
    DeviceReserved { dev: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MemorySize { units, max_units } => write!(
                f,
                "memory size {units} * 16K out of range (1..={max_units})"
            ),
            ConfigError::HistorySize { len } => {
                write!(f, "history length {len} out of range (64..=65536)")
            }
            ConfigError::DeviceInUse { dev } => {
                write!(f, "device number {dev:03o} already bound")
            }
            ConfigError::DeviceReserved { dev } => {
                write!(f, "device number {dev:03o} is reserved")
            }
        }
    }
}

impl Error for ConfigError {}

/// A memory access that did not deliver data: page failure, protection
/// violation, or non-existent memory. The detail lives in the machine
/// flags / fault data; the instruction falls through to its epilogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemFault;

/// Examine/deposit addressed memory that is not present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonExistentMemory(pub u32);

impl fmt::Display for NonExistentMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "non-existent memory at {:06o}", self.0)
    }
}

impl Error for NonExistentMemory {}
